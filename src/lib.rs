/*!

# seqrex - regular expressions over sequences of arbitrary values

This crate provides a regular expression engine whose "characters" are values
of any type. Patterns are built with a combinator algebra rather than parsed
from a textual syntax, compiled into a small instruction graph, and executed
by a Pike-style virtual machine which advances every live alternative in lock
step over the input. That gives polynomial worst-case matching time, with no
pathological backtracking blowups.

# Example: matching a sequence

```rust
use seqrex::Pattern;

let pattern: Pattern<char> = Pattern::literal('a')
    .then(Pattern::literal('b').zero_or_more())
    .then(Pattern::literal('c'));
let program = pattern.compile();
assert!(program.matches(&['a', 'b', 'b', 'c']).is_some());
assert!(program.matches(&['a', 'c']).is_some());
assert!(program.matches(&['a', 'x']).is_none());
```

Matching is anchored: the program must match from the first value, and the
returned match covers the longest accepted prefix of the input.

# Example: capture groups

A capture records the range of input a subpattern matched, under a key of any
hashable type. The `None` key conventionally captures the whole match.

```rust
use seqrex::{Greediness, Pattern};

let pattern: Pattern<char, &str> = Pattern::literal('<')
    .then(Pattern::any().zero_or_more_with(Greediness::Lazy).capture(Some("tag")))
    .then(Pattern::literal('>'));
let program = pattern.compile();

let input = ['<', 'a', 'b', '>', 'x'];
let found = program.matches(&input).expect("should match");
assert_eq!(found.group(Some(&"tag")), Some(&input[1..3]));
```

# Example: callbacks and results

Patterns can invoke callbacks as matching passes through them. A callback
observes the partial match on its logical thread and may store a result,
which surfaces on the final [`Match`] if that thread wins.

```rust
use seqrex::Pattern;

let pattern: Pattern<char, (), u32> = Pattern::literal('a')
    .one_or_more()
    .capture(None)
    .call(|_, m| {
        let len = m.group(None).map_or(0, |g| g.len() as u32);
        m.set_result(len);
    });
let program = pattern.compile();
assert_eq!(program.matches(&['a', 'a', 'a']).and_then(|m| m.into_result()), Some(3));
```

# Matching values other than characters

Nothing in the engine is specific to characters; predicates make patterns
over arbitrary domains:

```rust
use seqrex::Pattern;

#[derive(PartialEq, Clone, Debug)]
enum Token { Word(&'static str), Number(i64) }

let pattern: Pattern<Token> = Pattern::test(|t| matches!(t, Token::Word(_)))
    .then(Pattern::test(|t| matches!(t, Token::Number(_))).one_or_more());
let program = pattern.compile();
assert!(program
    .matches(&[Token::Word("sum"), Token::Number(1), Token::Number(2)])
    .is_some());
```

# Architecture

seqrex has a pattern algebra, a compiler which lowers patterns into an
instruction arena in continuation-passing style, and a single VM backend.
The VM simulates one logical thread per live alternative; threads share
their capture state through reference-counted copy-on-write, and threads
reaching the same instruction within a step are merged in priority order.
[`Program::to_dot`] renders the compiled instruction graph for debugging.

Backreferences and lookaround are not supported; they are fundamentally at
odds with the lock-step execution model.

*/

#![warn(clippy::all)]

pub use crate::api::{Context, Match, PartialMatch};
pub use crate::insn::Program;
pub use crate::pattern::{Callback, Greediness, Moment, Pattern, Predicate, REPEAT_LIMIT};
pub use crate::state::Marker;

mod api;
mod compile;
mod insn;
mod pattern;
mod state;
mod vm;
