//! Pattern compiler: lowers the pattern algebra into a [`Program`].
//!
//! Compilation is continuation-passing: emitting a pattern takes the
//! instruction to continue at and returns the entry of the emitted subgraph.
//! Repetition allocates its split first and patches the links once the body
//! exists, which is what ties the loop back-edges.

use std::rc::Rc;

use log::debug;

use crate::insn::{Insn, InsnPtr, Position, Program};
use crate::pattern::{Greediness, Moment, Pattern, REPEAT_LIMIT};

pub(crate) struct Compiler<V, K, R> {
    insns: Vec<Insn<V, K, R>>,
}

impl<V: Clone, K: Clone, R> Compiler<V, K, R> {
    pub(crate) fn compile(pattern: &Pattern<V, K, R>) -> Program<V, K, R> {
        let mut compiler = Compiler {
            insns: vec![Insn::Accept],
        };
        let accept = InsnPtr(0);
        let start = compiler.emit(pattern, accept);
        debug!("compiled pattern into {} instructions", compiler.insns.len());
        Program {
            insns: compiler.insns,
            start,
        }
    }

    fn push(&mut self, insn: Insn<V, K, R>) -> InsnPtr {
        let ptr = InsnPtr(self.insns.len() as u32);
        self.insns.push(insn);
        ptr
    }

    /// Emits instructions for `pattern`, with every path through the emitted
    /// subgraph continuing at `next`.
    /// \return the entry instruction of the subgraph.
    fn emit(&mut self, pattern: &Pattern<V, K, R>, next: InsnPtr) -> InsnPtr {
        match pattern {
            Pattern::Test(predicate) => self.push(Insn::Test {
                predicate: Rc::clone(predicate),
                next,
            }),
            Pattern::Literal(value) => self.push(Insn::Value {
                value: value.clone(),
                next,
            }),
            Pattern::Any => self.push(Insn::MatchAny { next }),
            Pattern::OneOf(values) => self.push(Insn::ValueSet {
                values: values.clone(),
                next,
            }),
            Pattern::Concatenation(patterns) => {
                // Right to left, so each pattern continues at its successor.
                let mut next = next;
                for pattern in patterns.iter().rev() {
                    next = self.emit(pattern, next);
                }
                next
            }
            Pattern::Alternation(patterns) => {
                // A right-associated split chain; the first alternative ends
                // up with the highest priority.
                let mut entry = next;
                for (i, pattern) in patterns.iter().enumerate().rev() {
                    let code = self.emit(pattern, next);
                    entry = if i + 1 == patterns.len() {
                        code
                    } else {
                        self.push(Insn::Split {
                            next: code,
                            alt: entry,
                        })
                    };
                }
                entry
            }
            Pattern::Captured { key, pattern } => {
                let end = self.push(Insn::Save {
                    key: key.clone(),
                    position: Position::End,
                    next,
                });
                let code = self.emit(pattern, end);
                self.push(Insn::Save {
                    key: key.clone(),
                    position: Position::Start,
                    next: code,
                })
            }
            Pattern::Marked(pattern) => {
                let end = self.push(Insn::Mark {
                    position: Position::End,
                    next,
                });
                let code = self.emit(pattern, end);
                self.push(Insn::Mark {
                    position: Position::Start,
                    next: code,
                })
            }
            Pattern::Call {
                callback,
                pattern,
                moment,
            } => match moment {
                Moment::Before => {
                    let code = self.emit(pattern, next);
                    self.push(Insn::Call {
                        callback: Rc::clone(callback),
                        next: code,
                    })
                }
                Moment::After => {
                    let call = self.push(Insn::Call {
                        callback: Rc::clone(callback),
                        next,
                    });
                    self.emit(pattern, call)
                }
            },
            Pattern::ZeroOrOne {
                pattern,
                greediness,
            } => {
                let code = self.emit(pattern, next);
                self.emit_option(code, next, *greediness)
            }
            Pattern::ZeroOrMore {
                pattern,
                greediness,
            } => self.emit_star(pattern, *greediness, next).0,
            Pattern::OneOrMore {
                pattern,
                greediness,
            } => self.emit_star(pattern, *greediness, next).1,
            Pattern::Repetition {
                pattern,
                min,
                max,
                greediness,
            } => {
                let max = max.map(|max| max.min(REPEAT_LIMIT));
                let mut min = (*min).min(REPEAT_LIMIT);
                if let Some(max) = max {
                    min = min.min(max);
                }

                let mut next = next;
                match max {
                    // The optional tail, built right to left so the required
                    // copies can precede it.
                    Some(max) => {
                        for _ in min..max {
                            let code = self.emit(pattern, next);
                            next = self.emit_option(code, next, *greediness);
                        }
                    }
                    None => {
                        next = self.emit_star(pattern, *greediness, next).0;
                    }
                }
                for _ in 0..min {
                    next = self.emit(pattern, next);
                }
                next
            }
        }
    }

    /// Emits the split making an already-emitted subgraph optional.
    fn emit_option(&mut self, code: InsnPtr, next: InsnPtr, greediness: Greediness) -> InsnPtr {
        match greediness {
            Greediness::Greedy => self.push(Insn::Split { next: code, alt: next }),
            Greediness::Lazy => self.push(Insn::Split { next, alt: code }),
        }
    }

    /// Emits a repetition loop for `pattern`.
    /// \return the loop split and the body entry: entering at the split
    /// matches zero or more occurrences, entering at the body one or more.
    fn emit_star(
        &mut self,
        pattern: &Pattern<V, K, R>,
        greediness: Greediness,
        next: InsnPtr,
    ) -> (InsnPtr, InsnPtr) {
        // Allocate the split first so the body can loop back to it.
        let split = self.push(Insn::Split { next, alt: next });
        let code = self.emit(pattern, split);
        match &mut self.insns[split.index()] {
            Insn::Split { next: n, alt: a } => match greediness {
                Greediness::Greedy => {
                    *n = code;
                    *a = next;
                }
                Greediness::Lazy => {
                    *n = next;
                    *a = code;
                }
            },
            _ => panic!("Should be a Split instruction"),
        }
        (split, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size_of(pattern: &Pattern<char>) -> usize {
        pattern.compile().insns.len()
    }

    #[test]
    fn empty_repetition_compiles_to_nothing() {
        // Just the accept instruction.
        assert_eq!(size_of(&Pattern::literal('a').repeat(0)), 1);
        assert_eq!(
            size_of(&Pattern::literal('a').repeat_with(0, Some(0), Greediness::Lazy)),
            1
        );
    }

    #[test]
    fn bounded_repetition_expands_into_copies() {
        // Accept + 2 required values + 3 optional values with their splits.
        assert_eq!(size_of(&Pattern::literal('a').repeat_between(2, 5)), 9);
    }

    #[test]
    fn unbounded_repetition_shares_one_loop() {
        // Accept + 2 required values + split + loop body.
        assert_eq!(
            size_of(&Pattern::literal('a').repeat_with(2, None, Greediness::Greedy)),
            5
        );
    }

    #[test]
    fn bounds_are_clamped() {
        // max beyond the limit: 100 optional copies, each a value + split.
        let wide = Pattern::literal('a').repeat_with(0, Some(2000), Greediness::Greedy);
        assert_eq!(size_of(&wide), 1 + 200);

        // min beyond the limit with unbounded max: 100 required copies + loop.
        let tall = Pattern::literal('a').repeat_with(1000, None, Greediness::Greedy);
        assert_eq!(size_of(&tall), 1 + 100 + 2);

        // min above max behaves as min == max.
        let inverted = Pattern::literal('a').repeat_with(5, Some(2), Greediness::Greedy);
        let exact = Pattern::literal('a').repeat(2);
        assert_eq!(size_of(&inverted), size_of(&exact));
    }

    #[test]
    fn alternation_chain_is_right_associated() {
        let pattern: Pattern<char> = Pattern::alternation(vec![
            Pattern::literal('a'),
            Pattern::literal('b'),
            Pattern::literal('c'),
        ]);
        let program = pattern.compile();
        // Entry is the outer split; its low-priority side is the inner split.
        let entry = &program[program.start];
        match entry {
            Insn::Split { next, alt } => {
                assert!(matches!(program[*next], Insn::Value { value: 'a', .. }));
                assert!(matches!(program[*alt], Insn::Split { .. }));
            }
            _ => panic!("Entry should be a Split instruction"),
        }
    }
}
