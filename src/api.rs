//! User-visible views onto a match: completed, in progress, and the executor
//! handle passed to callbacks.

use std::fmt;
use std::hash::Hash;

use crate::state::{Marker, ThreadState};

/// A successful match: the input sequence tied to the winning thread's state.
pub struct Match<'t, V, K = (), R = ()> {
    input: &'t [V],
    state: ThreadState<K, R>,
}

impl<'t, V, K, R> Match<'t, V, K, R> {
    pub(crate) fn new(input: &'t [V], state: ThreadState<K, R>) -> Self {
        Self { input, state }
    }

    /// \return the input subsequence captured under `key`, or `None` if that
    /// capture never matched. The `None` key addresses the whole-match
    /// capture, when the pattern declares one.
    pub fn group(&self, key: Option<&K>) -> Option<&'t [V]>
    where
        K: Clone + Eq + Hash,
    {
        let start = self.state.start(key)?;
        let end = self.state.end(key)?;
        Some(&self.input[start..end])
    }

    /// \return the result stored by callbacks on the winning thread.
    pub fn result(&self) -> Option<&R> {
        self.state.result()
    }

    /// Consumes the match, returning the stored result.
    pub fn into_result(self) -> Option<R> {
        self.state.into_result()
    }
}

impl<V, K: fmt::Debug, R: fmt::Debug> fmt::Debug for Match<'_, V, K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match").field("state", &self.state).finish()
    }
}

/// The in-progress match a callback observes: the captures recorded so far on
/// its thread, the current marker, and a writable result slot.
pub struct PartialMatch<'s, 't, V, K = (), R = ()> {
    input: &'t [V],
    state: &'s mut ThreadState<K, R>,
}

impl<'s, 't, V, K, R> PartialMatch<'s, 't, V, K, R> {
    pub(crate) fn new(input: &'t [V], state: &'s mut ThreadState<K, R>) -> Self {
        Self { input, state }
    }

    /// \return the input subsequence captured so far under `key`.
    pub fn group(&self, key: Option<&K>) -> Option<&'t [V]>
    where
        K: Clone + Eq + Hash,
    {
        let start = self.state.start(key)?;
        let end = self.state.end(key)?;
        Some(&self.input[start..end])
    }

    /// \return the result currently stored on this thread.
    pub fn result(&self) -> Option<&R> {
        self.state.result()
    }

    /// Stores `result` on this thread. Later callbacks on the same thread,
    /// and the final [`Match`] if this thread wins, observe it.
    pub fn set_result(&mut self, result: R) {
        self.state.set_result(result);
    }

    /// \return the marker of the innermost marked region enclosing the
    /// callback, or `None` outside any marked region.
    pub fn current_marker(&self) -> Option<Marker> {
        self.state.current_marker()
    }
}

/// The executor handle passed to callbacks: the full input and the position
/// the match has reached.
pub struct Context<'t, V> {
    values: &'t [V],
    index: usize,
}

impl<'t, V> Context<'t, V> {
    pub(crate) fn new(values: &'t [V], index: usize) -> Self {
        Self { values, index }
    }

    /// \return the full input sequence being matched.
    pub fn values(&self) -> &'t [V] {
        self.values
    }

    /// \return the input index the match has consumed up to.
    pub fn index(&self) -> usize {
        self.index
    }
}
