//! Per-thread matching state: capture maps, marker stack, result slot.

use std::hash::Hash;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// A unique identity token scoped to a single executor run.
///
/// A fresh marker is minted every time the executor enters a marked region,
/// so two markers compare equal only if they originate from the same entry
/// into the same region on the same logical thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Marker(pub(crate) u64);

/// The mutable state carried by a logical thread: where captures started and
/// ended, which marked regions are open, and the user result slot.
///
/// Threads share a `ThreadState` through an `Rc`; the executor clones it on
/// the first write while shared, so the strong count is exactly the number
/// of live threads referencing it.
#[derive(Debug, Clone)]
pub(crate) struct ThreadState<K, R> {
    starts: FxHashMap<Option<K>, usize>,
    ends: FxHashMap<Option<K>, usize>,
    markers: SmallVec<[Marker; 4]>,
    result: Option<R>,
}

impl<K: Eq + Hash, R> ThreadState<K, R> {
    pub(crate) fn new() -> Self {
        Self {
            starts: FxHashMap::default(),
            ends: FxHashMap::default(),
            markers: SmallVec::new(),
            result: None,
        }
    }

    pub(crate) fn set_start(&mut self, key: Option<K>, index: usize) {
        self.starts.insert(key, index);
    }

    pub(crate) fn set_end(&mut self, key: Option<K>, index: usize) {
        self.ends.insert(key, index);
    }

    pub(crate) fn start(&self, key: Option<&K>) -> Option<usize>
    where
        K: Clone,
    {
        self.starts.get(&key.cloned()).copied()
    }

    pub(crate) fn end(&self, key: Option<&K>) -> Option<usize>
    where
        K: Clone,
    {
        self.ends.get(&key.cloned()).copied()
    }
}

impl<K, R> ThreadState<K, R> {
    pub(crate) fn push_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    pub(crate) fn pop_marker(&mut self) {
        let popped = self.markers.pop();
        debug_assert!(popped.is_some(), "Marker stack should not underflow");
    }

    /// \return the marker of the innermost open marked region, if any.
    pub(crate) fn current_marker(&self) -> Option<Marker> {
        self.markers.last().copied()
    }

    pub(crate) fn result(&self) -> Option<&R> {
        self.result.as_ref()
    }

    pub(crate) fn set_result(&mut self, result: R) {
        self.result = Some(result);
    }

    pub(crate) fn into_result(self) -> Option<R> {
        self.result
    }
}
