//! Finite state machine driving enemy AI.
//!
//! Each state owns an ordered list of (condition, target) transitions.
//! `next` takes the first transition whose condition holds; if none does,
//! the machine stays where it is.

use std::collections::HashMap;
use std::hash::Hash;

type Condition<C> = fn(&C) -> bool;

pub struct StateMachine<S, C> {
    initial: S,
    current: S,
    previous: Option<S>,
    transitions: HashMap<S, Vec<(Condition<C>, S)>>,
}

impl<S: Copy + Eq + Hash, C> StateMachine<S, C> {
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            current: initial,
            previous: None,
            transitions: HashMap::new(),
        }
    }

    /// Add a transition. Transitions from the same state are tried in the
    /// order they were added.
    pub fn transition(mut self, from: S, to: S, condition: Condition<C>) -> Self {
        self.transitions.entry(from).or_default().push((condition, to));
        self
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn previous(&self) -> Option<S> {
        self.previous
    }

    pub fn is(&self, state: S) -> bool {
        self.current == state
    }

    /// Evaluate the current state's transitions and return the resulting state.
    pub fn next(&mut self, ctx: &C) -> S {
        let target = self
            .transitions
            .get(&self.current)
            .and_then(|list| list.iter().find(|(condition, _)| condition(ctx)))
            .map(|&(_, to)| to);
        if let Some(to) = target {
            self.previous = Some(self.current);
            self.current = to;
        }
        self.current
    }

    /// Force a state without checking conditions.
    pub fn set(&mut self, state: S) {
        self.previous = Some(self.current);
        self.current = state;
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum S {
        A,
        B,
        C,
        D,
    }

    struct Ctx {
        a_goes_to_c: bool,
    }

    fn always(_: &Ctx) -> bool {
        true
    }

    fn never(_: &Ctx) -> bool {
        false
    }

    fn a_to_c(ctx: &Ctx) -> bool {
        ctx.a_goes_to_c
    }

    #[test]
    fn test_simple_loop() {
        let mut sm = StateMachine::new(S::A)
            .transition(S::A, S::B, always)
            .transition(S::B, S::C, always)
            .transition(S::C, S::A, always);
        let ctx = Ctx { a_goes_to_c: false };
        assert_eq!(sm.current(), S::A);
        assert_eq!(sm.next(&ctx), S::B);
        assert_eq!(sm.next(&ctx), S::C);
        assert_eq!(sm.next(&ctx), S::A);
        assert_eq!(sm.previous(), Some(S::C));
    }

    #[test]
    fn test_first_matching_transition_wins() {
        let mut sm = StateMachine::new(S::A)
            .transition(S::A, S::C, a_to_c)
            .transition(S::A, S::B, always)
            .transition(S::B, S::C, always)
            .transition(S::C, S::D, always)
            .transition(S::D, S::A, always);

        let mut ctx = Ctx { a_goes_to_c: false };
        assert_eq!(sm.next(&ctx), S::B);
        sm.next(&ctx);
        sm.next(&ctx);
        assert_eq!(sm.next(&ctx), S::A);

        ctx.a_goes_to_c = true;
        assert_eq!(sm.next(&ctx), S::C);
    }

    #[test]
    fn test_stays_when_no_condition_holds() {
        let mut sm = StateMachine::new(S::A).transition(S::A, S::B, never);
        let ctx = Ctx { a_goes_to_c: false };
        assert_eq!(sm.next(&ctx), S::A);
        assert_eq!(sm.previous(), None);

        sm.set(S::D);
        assert!(sm.is(S::D));
        sm.reset();
        assert_eq!(sm.current(), S::A);
    }
}
