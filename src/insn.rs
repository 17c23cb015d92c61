//! Instructions for a compiled pattern, and the program that owns them.

use std::collections::VecDeque;
use std::fmt;
use std::fmt::Write as _;
use std::ops::Index;

use crate::pattern::{Callback, Predicate};

/// The identity of an instruction within its program.
///
/// Instructions are stored in an arena owned by the [`Program`]; links between
/// them are arena indices, so the same instruction may be the successor of many
/// predecessors and loops are representable. The executor keys its per-step
/// duplicate suppression on this identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct InsnPtr(pub(crate) u32);

impl InsnPtr {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which side of a region an instruction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    Start,
    End,
}

/// The list of instructions.
pub(crate) enum Insn<V, K, R> {
    /// Match a single value equal to the given one.
    Value { value: V, next: InsnPtr },

    /// Match a single value contained in the given set.
    ValueSet { values: Vec<V>, next: InsnPtr },

    /// Match any single value.
    MatchAny { next: InsnPtr },

    /// Match a single value satisfying the predicate.
    Test { predicate: Predicate<V>, next: InsnPtr },

    /// Fork into two successors. `next` has priority over `alt`.
    Split { next: InsnPtr, alt: InsnPtr },

    /// Record the current input index as the start or end of a capture.
    Save {
        key: Option<K>,
        position: Position,
        next: InsnPtr,
    },

    /// Open (push a fresh marker) or close (pop) a marked region.
    Mark { position: Position, next: InsnPtr },

    /// Invoke a user callback, then continue.
    Call {
        callback: Callback<V, K, R>,
        next: InsnPtr,
    },

    /// The match was successful.
    Accept,
}

impl<V, K, R> Insn<V, K, R> {
    fn name(&self) -> &'static str {
        match self {
            Insn::Value { .. } => "Value",
            Insn::ValueSet { .. } => "ValueSet",
            Insn::MatchAny { .. } => "MatchAny",
            Insn::Test { .. } => "Test",
            Insn::Split { .. } => "Split",
            Insn::Save { .. } => "Save",
            Insn::Mark { .. } => "Mark",
            Insn::Call { .. } => "Call",
            Insn::Accept => "Accept",
        }
    }

    fn argument(&self) -> String
    where
        V: fmt::Debug,
        K: fmt::Debug,
    {
        match self {
            Insn::Value { value, .. } => format!("{value:?}"),
            Insn::ValueSet { values, .. } => format!("{values:?}"),
            Insn::Save { key, position, .. } => format!("{position:?}: {key:?}"),
            Insn::Mark { position, .. } => format!("{position:?}"),
            _ => String::new(),
        }
    }

    /// \return the unconditional successor, if the instruction has one.
    fn next(&self) -> Option<InsnPtr> {
        match self {
            Insn::Value { next, .. }
            | Insn::ValueSet { next, .. }
            | Insn::MatchAny { next }
            | Insn::Test { next, .. }
            | Insn::Split { next, .. }
            | Insn::Save { next, .. }
            | Insn::Mark { next, .. }
            | Insn::Call { next, .. } => Some(*next),
            Insn::Accept => None,
        }
    }

    /// \return the lower-priority successor of a split.
    fn alt(&self) -> Option<InsnPtr> {
        match self {
            Insn::Split { alt, .. } => Some(*alt),
            _ => None,
        }
    }
}

impl<V: fmt::Debug, K: fmt::Debug, R> fmt::Debug for Insn<V, K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.argument())
    }
}

/// A compiled pattern: an arena of linked instructions plus the entry point.
///
/// Programs are produced by [`Pattern::compile`](crate::Pattern::compile) and
/// may be reused for any number of matches.
pub struct Program<V, K = (), R = ()> {
    pub(crate) insns: Vec<Insn<V, K, R>>,
    pub(crate) start: InsnPtr,
}

impl<V, K, R> Program<V, K, R> {
    pub(crate) fn len(&self) -> usize {
        self.insns.len()
    }

    /// Renders the instruction graph as a Graphviz `digraph`.
    ///
    /// Nodes are numbered in breadth-first order from the entry; the entry and
    /// the accepting instruction are drawn with a heavier border. Purely a
    /// debugging aid.
    pub fn to_dot(&self) -> String
    where
        V: fmt::Debug,
        K: fmt::Debug,
    {
        let mut ids: Vec<Option<usize>> = vec![None; self.insns.len()];
        let mut queue = VecDeque::new();
        let mut next_id = 1;

        ids[self.start.index()] = Some(next_id);
        next_id += 1;
        queue.push_back(self.start);

        let mut out = String::new();
        out.push_str("digraph code {\n");
        out.push_str("rankdir = LR\n");
        out.push_str("node [shape=box]\n");

        while let Some(ptr) = queue.pop_front() {
            let id = ids[ptr.index()].expect("Queued instruction should be numbered");
            let insn = &self[ptr];
            let emphasis = if ptr == self.start || matches!(insn, Insn::Accept) {
                ", penwidth=2"
            } else {
                ""
            };
            let _ = writeln!(
                out,
                "i{} [label=\"{} {}\"{}]",
                id,
                insn.name(),
                insn.argument(),
                emphasis
            );

            for succ in insn.next().into_iter().chain(insn.alt()) {
                let succ_id = match ids[succ.index()] {
                    Some(existing) => existing,
                    None => {
                        let assigned = next_id;
                        next_id += 1;
                        ids[succ.index()] = Some(assigned);
                        queue.push_back(succ);
                        assigned
                    }
                };
                let _ = writeln!(out, "i{id} -> i{succ_id}");
            }
        }

        out.push_str("}\n");
        out
    }
}

impl<V, K, R> Index<InsnPtr> for Program<V, K, R> {
    type Output = Insn<V, K, R>;

    fn index(&self, ptr: InsnPtr) -> &Self::Output {
        &self.insns[ptr.index()]
    }
}

impl<V: fmt::Debug, K: fmt::Debug, R> fmt::Debug for Program<V, K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("start", &self.start)
            .field("insns", &self.insns)
            .finish()
    }
}
