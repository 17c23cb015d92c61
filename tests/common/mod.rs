use std::fmt::Debug;
use std::hash::Hash;

use seqrex::{Match, Pattern, Program};

/// Compiles a pattern once and runs assertions against the compiled program.
pub struct PatternAsserter<V, K = (), R = ()> {
    program: Program<V, K, R>,
}

impl<V, K, R> PatternAsserter<V, K, R>
where
    V: PartialEq + Clone + Debug,
    K: Clone + Eq + Hash,
    R: Clone,
{
    pub fn new(pattern: &Pattern<V, K, R>) -> Self {
        Self {
            program: pattern.compile(),
        }
    }

    pub fn assert_matches(&self, values: &[V]) -> &Self {
        assert!(
            self.program.matches(values).is_some(),
            "matching {values:?} should succeed"
        );
        self
    }

    pub fn assert_rejects(&self, values: &[V]) -> &Self {
        assert!(
            self.program.matches(values).is_none(),
            "matching {values:?} should fail"
        );
        self
    }

    pub fn find<'t>(&self, values: &'t [V]) -> Option<Match<'t, V, K, R>> {
        self.program.matches(values)
    }
}
