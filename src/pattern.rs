//! The pattern algebra: declarative combinators describing a match intent.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;
use std::rc::Rc;

use crate::api::{Context, PartialMatch};
use crate::compile::Compiler;
use crate::insn::Program;

/// A predicate over a single input value.
pub type Predicate<V> = Rc<dyn Fn(&V) -> bool>;

/// A callback invoked while matching, with a view of the executor and of the
/// in-progress match.
///
/// Callbacks must not retain anything from either argument beyond the call;
/// the state they observe may be cloned or discarded as matching continues.
pub type Callback<V, K, R> = Rc<dyn Fn(&Context<'_, V>, &mut PartialMatch<'_, '_, V, K, R>)>;

/// How many occurrences a repeating pattern should prefer to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Greediness {
    /// Match as many occurrences as possible (longest match).
    #[default]
    Greedy,
    /// Match as few occurrences as possible (shortest match).
    Lazy,
}

/// When a [`Pattern::call_at`] callback runs relative to its pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Moment {
    /// Before the pattern is matched.
    Before,
    /// After the pattern has matched.
    #[default]
    After,
}

/// The limit applied to both bounds of [`Pattern::repeat_with`].
pub const REPEAT_LIMIT: usize = 100;

/// A pattern over sequences of `V` values, capturing under `Option<K>` keys
/// and carrying an `R` result.
///
/// Patterns are built with the constructors and combinator methods below and
/// lowered with [`compile`](Pattern::compile). The `None` capture key
/// conventionally addresses the whole match.
///
/// Equality and hashing are structural over the tree; predicate and callback
/// payloads compare by identity. This is what lets
/// [`alternation`](Pattern::alternation) drop duplicate branches, and it makes
/// patterns usable as cache keys.
pub enum Pattern<V, K = (), R = ()> {
    /// Matches one value satisfying the predicate.
    Test(Predicate<V>),
    /// Matches one value equal to the given one.
    Literal(V),
    /// Matches any one value.
    Any,
    /// Matches one value from the set, in first-seen order without duplicates.
    OneOf(Vec<V>),
    /// Matches the patterns one after another.
    Concatenation(Vec<Pattern<V, K, R>>),
    /// Matches the first alternative that matches, in order.
    Alternation(Vec<Pattern<V, K, R>>),
    /// Records the input range matched by the inner pattern under `key`.
    Captured {
        key: Option<K>,
        pattern: Box<Pattern<V, K, R>>,
    },
    /// Scopes a fresh marker around the inner pattern.
    Marked(Box<Pattern<V, K, R>>),
    /// Invokes a callback before or after the inner pattern.
    Call {
        callback: Callback<V, K, R>,
        pattern: Box<Pattern<V, K, R>>,
        moment: Moment,
    },
    /// Matches the inner pattern zero or one times.
    ZeroOrOne {
        pattern: Box<Pattern<V, K, R>>,
        greediness: Greediness,
    },
    /// Matches the inner pattern any number of times, including none.
    ZeroOrMore {
        pattern: Box<Pattern<V, K, R>>,
        greediness: Greediness,
    },
    /// Matches the inner pattern one or more times.
    OneOrMore {
        pattern: Box<Pattern<V, K, R>>,
        greediness: Greediness,
    },
    /// Matches the inner pattern between `min` and `max` times; `None` means
    /// unbounded. Both bounds are limited to [`REPEAT_LIMIT`] at compile time,
    /// and `min` is further limited to `max`.
    Repetition {
        pattern: Box<Pattern<V, K, R>>,
        min: usize,
        max: Option<usize>,
        greediness: Greediness,
    },
}

impl<V, K, R> Pattern<V, K, R> {
    /// A pattern matching one value satisfying `predicate`.
    pub fn test(predicate: impl Fn(&V) -> bool + 'static) -> Self {
        Pattern::Test(Rc::new(predicate))
    }

    /// A pattern matching one value equal to `value`.
    pub fn literal(value: V) -> Self {
        Pattern::Literal(value)
    }

    /// A pattern matching any one value.
    pub fn any() -> Self {
        Pattern::Any
    }

    /// A pattern matching one value from `values`.
    ///
    /// Duplicates are dropped, keeping the first occurrence; a single distinct
    /// value degenerates to [`literal`](Pattern::literal).
    pub fn one_of(values: impl IntoIterator<Item = V>) -> Self
    where
        V: PartialEq,
    {
        let mut unique = Vec::new();
        for value in values {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        if unique.len() == 1 {
            return Pattern::Literal(unique.remove(0));
        }
        Pattern::OneOf(unique)
    }

    /// A pattern matching `patterns` one after another.
    ///
    /// Nested concatenations are flattened so the sequence is canonical.
    pub fn concatenation(patterns: Vec<Self>) -> Self {
        let mut flat = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            pattern.flatten_concatenation_into(&mut flat);
        }
        if flat.len() == 1 {
            return flat.remove(0);
        }
        Pattern::Concatenation(flat)
    }

    /// A pattern matching the first of `patterns` that matches.
    ///
    /// Nested alternations are flattened and duplicate branches removed,
    /// keeping the first occurrence; earlier branches take priority.
    pub fn alternation(patterns: Vec<Self>) -> Self
    where
        V: PartialEq,
        K: PartialEq,
    {
        let mut flat = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            pattern.flatten_alternation_into(&mut flat);
        }
        let mut unique: Vec<Self> = Vec::with_capacity(flat.len());
        for pattern in flat {
            if !unique.contains(&pattern) {
                unique.push(pattern);
            }
        }
        if unique.len() == 1 {
            return unique.remove(0);
        }
        Pattern::Alternation(unique)
    }

    /// This pattern followed by `other`.
    pub fn then(self, other: Self) -> Self {
        let mut patterns = Vec::new();
        self.flatten_concatenation_into(&mut patterns);
        other.flatten_concatenation_into(&mut patterns);
        Pattern::Concatenation(patterns)
    }

    /// This pattern, or `other` if it does not match.
    pub fn or(self, other: Self) -> Self
    where
        V: PartialEq,
        K: PartialEq,
    {
        Pattern::alternation(vec![self, other])
    }

    /// Captures the range matched by this pattern under `key`.
    ///
    /// The `None` key conventionally captures the whole match.
    pub fn capture(self, key: Option<K>) -> Self {
        Pattern::Captured {
            key,
            pattern: Box::new(self),
        }
    }

    /// Scopes a fresh marker around this pattern. Nested marked regions
    /// shadow the outer marker until they end.
    pub fn marked(self) -> Self {
        Pattern::Marked(Box::new(self))
    }

    /// Invokes `callback` after this pattern has matched.
    pub fn call<F>(self, callback: F) -> Self
    where
        F: Fn(&Context<'_, V>, &mut PartialMatch<'_, '_, V, K, R>) + 'static,
    {
        self.call_at(callback, Moment::default())
    }

    /// Invokes `callback` before or after this pattern, per `moment`.
    pub fn call_at<F>(self, callback: F, moment: Moment) -> Self
    where
        F: Fn(&Context<'_, V>, &mut PartialMatch<'_, '_, V, K, R>) + 'static,
    {
        Pattern::Call {
            callback: Rc::new(callback),
            pattern: Box::new(self),
            moment,
        }
    }

    /// Matches this pattern zero or one times, greedily.
    pub fn zero_or_one(self) -> Self {
        self.zero_or_one_with(Greediness::default())
    }

    /// Matches this pattern zero or one times with the given greediness.
    pub fn zero_or_one_with(self, greediness: Greediness) -> Self {
        Pattern::ZeroOrOne {
            pattern: Box::new(self),
            greediness,
        }
    }

    /// Matches this pattern any number of times, greedily.
    pub fn zero_or_more(self) -> Self {
        self.zero_or_more_with(Greediness::default())
    }

    /// Matches this pattern any number of times with the given greediness.
    pub fn zero_or_more_with(self, greediness: Greediness) -> Self {
        Pattern::ZeroOrMore {
            pattern: Box::new(self),
            greediness,
        }
    }

    /// Matches this pattern one or more times, greedily.
    pub fn one_or_more(self) -> Self {
        self.one_or_more_with(Greediness::default())
    }

    /// Matches this pattern one or more times with the given greediness.
    pub fn one_or_more_with(self, greediness: Greediness) -> Self {
        Pattern::OneOrMore {
            pattern: Box::new(self),
            greediness,
        }
    }

    /// Matches this pattern exactly `n` times.
    pub fn repeat(self, n: usize) -> Self {
        self.repeat_with(n, Some(n), Greediness::default())
    }

    /// Matches this pattern between `min` and `max` times, greedily.
    pub fn repeat_between(self, min: usize, max: usize) -> Self {
        self.repeat_with(min, Some(max), Greediness::default())
    }

    /// Matches this pattern between `min` and `max` times; `None` means
    /// unbounded. Bounds beyond [`REPEAT_LIMIT`] are clamped, and `min` is
    /// clamped to `max`.
    pub fn repeat_with(self, min: usize, max: Option<usize>, greediness: Greediness) -> Self {
        Pattern::Repetition {
            pattern: Box::new(self),
            min,
            max,
            greediness,
        }
    }

    /// Compiles this pattern into an executable [`Program`].
    pub fn compile(&self) -> Program<V, K, R>
    where
        V: Clone,
        K: Clone,
    {
        Compiler::compile(self)
    }

    fn flatten_concatenation_into(self, dst: &mut Vec<Self>) {
        match self {
            Pattern::Concatenation(patterns) => {
                for pattern in patterns {
                    pattern.flatten_concatenation_into(dst);
                }
            }
            other => dst.push(other),
        }
    }

    fn flatten_alternation_into(self, dst: &mut Vec<Self>) {
        match self {
            Pattern::Alternation(patterns) => {
                for pattern in patterns {
                    pattern.flatten_alternation_into(dst);
                }
            }
            other => dst.push(other),
        }
    }
}

/// \return a thin pointer identifying the closure behind an `Rc`.
fn identity<T: ?Sized>(rc: &Rc<T>) -> *const () {
    Rc::as_ptr(rc) as *const ()
}

impl<V: PartialEq, K: PartialEq, R> PartialEq for Pattern<V, K, R> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Pattern::Test(a), Pattern::Test(b)) => identity(a) == identity(b),
            (Pattern::Literal(a), Pattern::Literal(b)) => a == b,
            (Pattern::Any, Pattern::Any) => true,
            (Pattern::OneOf(a), Pattern::OneOf(b)) => a == b,
            (Pattern::Concatenation(a), Pattern::Concatenation(b)) => a == b,
            (Pattern::Alternation(a), Pattern::Alternation(b)) => a == b,
            (
                Pattern::Captured { key: a, pattern: p },
                Pattern::Captured { key: b, pattern: q },
            ) => a == b && p == q,
            (Pattern::Marked(a), Pattern::Marked(b)) => a == b,
            (
                Pattern::Call {
                    callback: a,
                    pattern: p,
                    moment: m,
                },
                Pattern::Call {
                    callback: b,
                    pattern: q,
                    moment: n,
                },
            ) => identity(a) == identity(b) && m == n && p == q,
            (
                Pattern::ZeroOrOne {
                    pattern: p,
                    greediness: g,
                },
                Pattern::ZeroOrOne {
                    pattern: q,
                    greediness: h,
                },
            ) => g == h && p == q,
            (
                Pattern::ZeroOrMore {
                    pattern: p,
                    greediness: g,
                },
                Pattern::ZeroOrMore {
                    pattern: q,
                    greediness: h,
                },
            ) => g == h && p == q,
            (
                Pattern::OneOrMore {
                    pattern: p,
                    greediness: g,
                },
                Pattern::OneOrMore {
                    pattern: q,
                    greediness: h,
                },
            ) => g == h && p == q,
            (
                Pattern::Repetition {
                    pattern: p,
                    min: a,
                    max: b,
                    greediness: g,
                },
                Pattern::Repetition {
                    pattern: q,
                    min: c,
                    max: d,
                    greediness: h,
                },
            ) => a == c && b == d && g == h && p == q,
            _ => false,
        }
    }
}

impl<V: Eq, K: Eq, R> Eq for Pattern<V, K, R> {}

impl<V: Hash, K: Hash, R> Hash for Pattern<V, K, R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            Pattern::Test(predicate) => (identity(predicate) as usize).hash(state),
            Pattern::Literal(value) => value.hash(state),
            Pattern::Any => {}
            Pattern::OneOf(values) => values.hash(state),
            Pattern::Concatenation(patterns) | Pattern::Alternation(patterns) => {
                patterns.hash(state)
            }
            Pattern::Captured { key, pattern } => {
                key.hash(state);
                pattern.hash(state);
            }
            Pattern::Marked(pattern) => pattern.hash(state),
            Pattern::Call {
                callback,
                pattern,
                moment,
            } => {
                (identity(callback) as usize).hash(state);
                moment.hash(state);
                pattern.hash(state);
            }
            Pattern::ZeroOrOne {
                pattern,
                greediness,
            }
            | Pattern::ZeroOrMore {
                pattern,
                greediness,
            }
            | Pattern::OneOrMore {
                pattern,
                greediness,
            } => {
                greediness.hash(state);
                pattern.hash(state);
            }
            Pattern::Repetition {
                pattern,
                min,
                max,
                greediness,
            } => {
                min.hash(state);
                max.hash(state);
                greediness.hash(state);
                pattern.hash(state);
            }
        }
    }
}

impl<V: Clone, K: Clone, R> Clone for Pattern<V, K, R> {
    fn clone(&self) -> Self {
        match self {
            Pattern::Test(predicate) => Pattern::Test(Rc::clone(predicate)),
            Pattern::Literal(value) => Pattern::Literal(value.clone()),
            Pattern::Any => Pattern::Any,
            Pattern::OneOf(values) => Pattern::OneOf(values.clone()),
            Pattern::Concatenation(patterns) => Pattern::Concatenation(patterns.clone()),
            Pattern::Alternation(patterns) => Pattern::Alternation(patterns.clone()),
            Pattern::Captured { key, pattern } => Pattern::Captured {
                key: key.clone(),
                pattern: pattern.clone(),
            },
            Pattern::Marked(pattern) => Pattern::Marked(pattern.clone()),
            Pattern::Call {
                callback,
                pattern,
                moment,
            } => Pattern::Call {
                callback: Rc::clone(callback),
                pattern: pattern.clone(),
                moment: *moment,
            },
            Pattern::ZeroOrOne {
                pattern,
                greediness,
            } => Pattern::ZeroOrOne {
                pattern: pattern.clone(),
                greediness: *greediness,
            },
            Pattern::ZeroOrMore {
                pattern,
                greediness,
            } => Pattern::ZeroOrMore {
                pattern: pattern.clone(),
                greediness: *greediness,
            },
            Pattern::OneOrMore {
                pattern,
                greediness,
            } => Pattern::OneOrMore {
                pattern: pattern.clone(),
                greediness: *greediness,
            },
            Pattern::Repetition {
                pattern,
                min,
                max,
                greediness,
            } => Pattern::Repetition {
                pattern: pattern.clone(),
                min: *min,
                max: *max,
                greediness: *greediness,
            },
        }
    }
}

impl<V: fmt::Debug, K: fmt::Debug, R> fmt::Debug for Pattern<V, K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Test(_) => f.write_str("Test(..)"),
            Pattern::Literal(value) => write!(f, "Literal({value:?})"),
            Pattern::Any => f.write_str("Any"),
            Pattern::OneOf(values) => write!(f, "OneOf({values:?})"),
            Pattern::Concatenation(patterns) => write_tree(f, "Concatenation", patterns),
            Pattern::Alternation(patterns) => write_tree(f, "Alternation", patterns),
            Pattern::Captured { key, pattern } => write!(f, "Captured({key:?}, {pattern:?})"),
            Pattern::Marked(pattern) => write!(f, "Marked({pattern:?})"),
            Pattern::Call {
                pattern, moment, ..
            } => write!(f, "Call({pattern:?}, {moment:?})"),
            Pattern::ZeroOrOne {
                pattern,
                greediness,
            } => write!(f, "ZeroOrOne({pattern:?}, {greediness:?})"),
            Pattern::ZeroOrMore {
                pattern,
                greediness,
            } => write!(f, "ZeroOrMore({pattern:?}, {greediness:?})"),
            Pattern::OneOrMore {
                pattern,
                greediness,
            } => write!(f, "OneOrMore({pattern:?}, {greediness:?})"),
            Pattern::Repetition {
                pattern,
                min,
                max,
                greediness,
            } => write!(f, "Repetition({pattern:?}, {min}, {max:?}, {greediness:?})"),
        }
    }
}

fn write_tree<V: fmt::Debug, K: fmt::Debug, R>(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    patterns: &[Pattern<V, K, R>],
) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, pattern) in patterns.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{pattern:?}")?;
    }
    f.write_str(")")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(c: char) -> Pattern<char> {
        Pattern::literal(c)
    }

    #[test]
    fn concatenation_flattens() {
        let nested = lit('a').then(lit('b')).then(lit('c').then(lit('d')));
        let flat = Pattern::concatenation(vec![lit('a'), lit('b'), lit('c'), lit('d')]);
        assert_eq!(nested, flat);
    }

    #[test]
    fn alternation_flattens_and_deduplicates() {
        let nested = lit('a').or(lit('b')).or(lit('a')).or(lit('c'));
        let flat = Pattern::Alternation(vec![lit('a'), lit('b'), lit('c')]);
        assert_eq!(nested, flat);
    }

    #[test]
    fn singleton_combinations_collapse() {
        assert_eq!(Pattern::concatenation(vec![lit('a')]), lit('a'));
        assert_eq!(Pattern::alternation(vec![lit('a'), lit('a')]), lit('a'));
    }

    #[test]
    fn one_of_deduplicates_and_degenerates() {
        assert_eq!(Pattern::<char>::one_of(['a', 'a']), lit('a'));
        assert_eq!(
            Pattern::<char>::one_of(['b', 'c', 'b']),
            Pattern::OneOf(vec!['b', 'c'])
        );
    }

    #[test]
    fn predicates_compare_by_identity() {
        let even = Pattern::<i32>::test(|v| v % 2 == 0);
        assert_eq!(even, even.clone());
        assert_ne!(even, Pattern::<i32>::test(|v| v % 2 == 0));
    }

    #[test]
    fn repetition_payload_participates_in_equality() {
        let a = lit('a').repeat_between(1, 3);
        assert_eq!(a, lit('a').repeat_between(1, 3));
        assert_ne!(a, lit('a').repeat_between(1, 4));
        assert_ne!(a, lit('a').repeat_with(1, Some(3), Greediness::Lazy));
    }

    #[test]
    fn debug_rendering_is_structural() {
        let pattern = lit('a').then(Pattern::any()).capture(None);
        assert_eq!(
            format!("{pattern:?}"),
            "Captured(None, Concatenation(Literal('a'), Any))"
        );
    }
}
