//! The virtual-machine executor.
//!
//! An implementation of Rob Pike's VM-based matching approach, as described
//! by Russ Cox in "Regular Expression Matching: the Virtual Machine Approach"
//! (<https://swtch.com/~rsc/regexp/regexp2.html>): every live alternative is a
//! logical thread, and all threads advance over the input together, one value
//! per step. Threads waiting on the same instruction within a step are merged,
//! keeping the higher-priority one, which bounds the live set by the program
//! size and makes matching polynomial regardless of pattern ambiguity.

use std::hash::Hash;
use std::mem;
use std::rc::Rc;

use log::trace;

use crate::api::{Context, Match, PartialMatch};
use crate::insn::{Insn, InsnPtr, Position, Program};
use crate::state::{Marker, ThreadState};

/// A logical thread: an instruction pointer plus a shared state.
struct Thread<K, R> {
    pc: InsnPtr,
    state: Rc<ThreadState<K, R>>,
}

impl<K, R> Thread<K, R> {
    fn new(pc: InsnPtr, state: Rc<ThreadState<K, R>>) -> Self {
        Self { pc, state }
    }
}

/// The per-step duplicate-suppression set, dense over instruction identities.
struct SeenSet {
    bits: Vec<bool>,
}

impl SeenSet {
    fn new(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    fn clear(&mut self) {
        self.bits.fill(false);
    }

    /// \return whether the instruction was newly inserted.
    fn insert(&mut self, ptr: InsnPtr) -> bool {
        !mem::replace(&mut self.bits[ptr.index()], true)
    }
}

struct Vm<'p, 't, V, K, R> {
    program: &'p Program<V, K, R>,
    values: &'t [V],
    seen: SeenSet,
    next_marker: u64,
}

impl<V, K, R> Program<V, K, R>
where
    V: PartialEq,
    K: Clone + Eq + Hash,
    R: Clone,
{
    /// Matches this program against the beginning of `values`.
    ///
    /// Matching is anchored at index 0 and need not consume the whole input:
    /// the returned match is the longest accepted prefix, with ties between
    /// alternatives broken by priority (alternation order and greediness).
    /// \return the match, or `None` if no prefix is accepted.
    pub fn matches<'t>(&self, values: &'t [V]) -> Option<Match<'t, V, K, R>> {
        let vm = Vm {
            program: self,
            values,
            seen: SeenSet::new(self.len()),
            next_marker: 0,
        };
        vm.run().map(|state| Match::new(values, state))
    }
}

impl<V, K, R> Vm<'_, '_, V, K, R>
where
    V: PartialEq,
    K: Clone + Eq + Hash,
    R: Clone,
{
    fn run(mut self) -> Option<ThreadState<K, R>> {
        trace!(
            "running {} instructions over {} values",
            self.program.len(),
            self.values.len()
        );

        let program = self.program;
        let values = self.values;
        let mut current: Vec<Thread<K, R>> = Vec::new();
        let mut pending: Vec<Thread<K, R>> = Vec::new();
        let mut matched: Option<Rc<ThreadState<K, R>>> = None;

        self.add_thread(
            Thread::new(program.start, Rc::new(ThreadState::new())),
            0,
            &mut current,
        );

        let mut index = 0;
        while !current.is_empty() {
            let value = values.get(index);
            self.seen.clear();

            for thread in current.drain(..) {
                let Thread { pc, state } = thread;
                match &program[pc] {
                    Insn::Value {
                        value: literal,
                        next,
                    } => {
                        if value == Some(literal) {
                            self.add_thread(Thread::new(*next, state), index + 1, &mut pending);
                        }
                    }
                    Insn::ValueSet { values: set, next } => {
                        if value.is_some_and(|value| set.contains(value)) {
                            self.add_thread(Thread::new(*next, state), index + 1, &mut pending);
                        }
                    }
                    Insn::MatchAny { next } => {
                        if value.is_some() {
                            self.add_thread(Thread::new(*next, state), index + 1, &mut pending);
                        }
                    }
                    Insn::Test { predicate, next } => {
                        if value.is_some_and(|value| (**predicate)(value)) {
                            self.add_thread(Thread::new(*next, state), index + 1, &mut pending);
                        }
                    }
                    Insn::Accept => {
                        // The highest-priority accept this step; any earlier,
                        // shorter accept is superseded, and every remaining
                        // thread is a lower-priority alternative. Breaking
                        // drops them all.
                        matched = Some(state);
                        break;
                    }
                    Insn::Split { .. }
                    | Insn::Save { .. }
                    | Insn::Mark { .. }
                    | Insn::Call { .. } => {
                        unreachable!("Non-consuming instruction in the thread list")
                    }
                }
            }

            mem::swap(&mut current, &mut pending);
            if value.is_none() {
                break;
            }
            index += 1;
        }

        trace!("match: {}", matched.is_some());
        matched.map(Rc::unwrap_or_clone)
    }

    /// Schedules a thread onto `dst`, expanding every instruction reachable
    /// without consuming input so that `dst` only ever holds threads waiting
    /// on a consuming instruction (or on accept).
    ///
    /// The first thread to reach an instruction in a step wins; later
    /// arrivals are duplicates of lower priority and are dropped, releasing
    /// their share of the state.
    fn add_thread(&mut self, thread: Thread<K, R>, index: usize, dst: &mut Vec<Thread<K, R>>) {
        let Thread { pc, mut state } = thread;
        if !self.seen.insert(pc) {
            return;
        }
        let program = self.program;
        match &program[pc] {
            Insn::Split { next, alt } => {
                // Both branches share the state until one of them writes.
                // The preferred branch is expanded first so it wins any
                // downstream merge.
                let shared = Rc::clone(&state);
                self.add_thread(Thread::new(*next, state), index, dst);
                self.add_thread(Thread::new(*alt, shared), index, dst);
            }
            Insn::Save {
                key,
                position,
                next,
            } => {
                let writable = Rc::make_mut(&mut state);
                match position {
                    Position::Start => writable.set_start(key.clone(), index),
                    Position::End => writable.set_end(key.clone(), index),
                }
                self.add_thread(Thread::new(*next, state), index, dst);
            }
            Insn::Mark { position, next } => {
                match position {
                    Position::Start => {
                        let marker = self.fresh_marker();
                        Rc::make_mut(&mut state).push_marker(marker);
                    }
                    Position::End => Rc::make_mut(&mut state).pop_marker(),
                }
                self.add_thread(Thread::new(*next, state), index, dst);
            }
            Insn::Call { callback, next } => {
                let context = Context::new(self.values, index);
                let writable = Rc::make_mut(&mut state);
                (**callback)(&context, &mut PartialMatch::new(self.values, writable));
                self.add_thread(Thread::new(*next, state), index, dst);
            }
            Insn::Value { .. }
            | Insn::ValueSet { .. }
            | Insn::MatchAny { .. }
            | Insn::Test { .. }
            | Insn::Accept => dst.push(Thread::new(pc, state)),
        }
    }

    fn fresh_marker(&mut self) -> Marker {
        let marker = Marker(self.next_marker);
        self.next_marker += 1;
        marker
    }
}
