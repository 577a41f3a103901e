//! The finite-state-automaton engine every decoding layer is built on.
//!
//! A [`State`] consumes one input character and returns an [`Outcome`]. The
//! outcome says whether decoding continues with a new state, whether the
//! character was left for somebody else ([`Outcome::Unhandled`]), whether the
//! automaton reached a [`Terminal`], or whether it wants to unwind several
//! chained compositions at once ([`Outcome::Jump`]).
//!
//! The input is `Option<char>`: `None` is the explicit end-of-input character
//! the driver synthesizes so that states can resolve trailing ambiguity.
//!
//! States never share data with each other directly. Whatever they accumulate
//! lives in a context `C` owned by the driver and lent to each step, so a
//! composition of states is a plain tree of boxes with no reference cycles.
//!
//! ## Combinators
//!
//! - [`looping`]: a state that receives itself back on every step
//! - [`statement`]: a stateless step function
//! - [`Step`]: run one automaton, then hand the first unaccepted character to the next
//! - [`Parallel`]: race several automatons over the same characters
//! - [`FirstOf`]: offer a character to candidates in order
//! - [`Outcome::Jump`]: leave a labelled [`Step`] chain from arbitrarily deep inside it

use crate::Error;
use std::fmt;

/// One node of an automaton.
///
/// `next` consumes the state: a state that wants to keep going returns itself
/// (or a successor) inside [`Outcome::Next`].
pub trait State<C> {
    fn next(self: Box<Self>, cx: &mut C, input: Option<char>) -> Outcome<C>;

    /// Short human-readable name, used in trace logs.
    fn name(&self) -> &'static str {
        short_name(std::any::type_name::<Self>())
    }
}

pub type Boxed<C> = Box<dyn State<C>>;

fn short_name(path: &'static str) -> &'static str {
    let base = path.split('<').next().unwrap_or(path);
    base.rsplit("::").next().unwrap_or(base)
}

/// Identifies a [`Step`] chain that an [`Outcome::Jump`] unwinds to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Label(pub &'static str);

/// The result of feeding one character to a [`State`].
pub enum Outcome<C> {
    /// The character was accepted; continue with this state.
    Next(Boxed<C>),
    /// The character was not accepted here. Callers decide whether that is an
    /// error or a fallthrough to a sibling state.
    Unhandled,
    /// The automaton stopped.
    Done(Terminal),
    /// The character was accepted; abandon every composition up to the
    /// [`Step`] carrying this label and continue with the target there.
    Jump(Label, Boxed<C>),
}

impl<C> Outcome<C> {
    pub fn next<S>(state: S) -> Self
    where
        S: State<C> + 'static,
    {
        Outcome::Next(Box::new(state))
    }

    pub fn finished() -> Self {
        Outcome::Done(Terminal::Finished)
    }

    pub fn fail(err: Error) -> Self {
        Outcome::Done(Terminal::Failed(err))
    }

    #[must_use]
    pub fn is_unhandled(&self) -> bool {
        matches!(self, Outcome::Unhandled)
    }
}

impl<C> fmt::Debug for Outcome<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Next(state) => write!(f, "Next({})", state.name()),
            Outcome::Unhandled => f.write_str("Unhandled"),
            Outcome::Done(terminal) => write!(f, "Done({:?})", terminal),
            Outcome::Jump(label, state) => write!(f, "Jump({}, {})", label.0, state.name()),
        }
    }
}

/// Turns a successor into a jump to `label`, passing terminals through.
pub fn leave<C>(label: Label, outcome: Outcome<C>) -> Outcome<C> {
    match outcome {
        Outcome::Next(state) => Outcome::Jump(label, state),
        other => other,
    }
}

/// A stopped automaton. Feeding it more input returns the same terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminal {
    Finished,
    Failed(Error),
}

impl<C> State<C> for Terminal {
    fn next(self: Box<Self>, _cx: &mut C, _input: Option<char>) -> Outcome<C> {
        Outcome::Done(*self)
    }

    fn name(&self) -> &'static str {
        match self {
            Terminal::Finished => "finished",
            Terminal::Failed(_) => "failed",
        }
    }
}

/// Accepts nothing. Useful as the tail of a sub-automaton that has consumed
/// its last character: the next character falls through to whatever follows.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pass;

impl<C> State<C> for Pass {
    fn next(self: Box<Self>, _cx: &mut C, _input: Option<char>) -> Outcome<C> {
        Outcome::Unhandled
    }
}

pub fn pass<C>() -> Boxed<C> {
    Box::new(Pass)
}

pub type LoopFn<C, T> = fn(Box<Looping<C, T>>, &mut C, Option<char>) -> Outcome<C>;

/// A state that is handed back to its own step function, so it can loop by
/// returning itself without referring to itself.
pub struct Looping<C, T> {
    name: &'static str,
    pub data: T,
    f: LoopFn<C, T>,
}

pub fn looping<C, T>(name: &'static str, data: T, f: LoopFn<C, T>) -> Looping<C, T> {
    Looping { name, data, f }
}

impl<C, T> Looping<C, T>
where
    C: 'static,
    T: 'static,
{
    /// Keeps looping with the same state.
    pub fn again(self: Box<Self>) -> Outcome<C> {
        Outcome::Next(self)
    }
}

impl<C, T> State<C> for Looping<C, T>
where
    C: 'static,
    T: 'static,
{
    fn next(self: Box<Self>, cx: &mut C, input: Option<char>) -> Outcome<C> {
        let f = self.f;
        f(self, cx, input)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// A stateless step function.
pub struct Statement<C> {
    name: &'static str,
    f: fn(&mut C, Option<char>) -> Outcome<C>,
}

pub fn statement<C>(name: &'static str, f: fn(&mut C, Option<char>) -> Outcome<C>) -> Statement<C> {
    Statement { name, f }
}

impl<C> State<C> for Statement<C> {
    fn next(self: Box<Self>, cx: &mut C, input: Option<char>) -> Outcome<C> {
        (self.f)(cx, input)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Sequential composition.
///
/// Characters go to `first` for as long as it keeps accepting them. The first
/// character `first` leaves unhandled is dispatched to `second`, which then
/// replaces the whole composition. Terminals from `first` propagate at once.
/// A jump carrying this step's label lands here and continues with its target.
pub struct Step<C> {
    label: Option<Label>,
    first: Boxed<C>,
    second: Boxed<C>,
}

impl<C: 'static> Step<C> {
    pub fn new(first: Boxed<C>, second: Boxed<C>) -> Self {
        Step {
            label: None,
            first,
            second,
        }
    }

    pub fn labeled(label: Label, first: Boxed<C>, second: Boxed<C>) -> Self {
        Step {
            label: Some(label),
            first,
            second,
        }
    }

    pub fn boxed(self) -> Boxed<C> {
        Box::new(self)
    }
}

impl<C: 'static> State<C> for Step<C> {
    fn next(mut self: Box<Self>, cx: &mut C, input: Option<char>) -> Outcome<C> {
        let first = std::mem::replace(&mut self.first, Box::new(Pass));
        match first.next(cx, input) {
            Outcome::Next(first) => {
                self.first = first;
                Outcome::Next(self)
            }
            Outcome::Unhandled => self.second.next(cx, input),
            Outcome::Done(terminal) => Outcome::Done(terminal),
            Outcome::Jump(label, target) if Some(label) == self.label => Outcome::Next(target),
            jump @ Outcome::Jump(..) => jump,
        }
    }

    fn name(&self) -> &'static str {
        self.label.map_or("step", |label| label.0)
    }
}

/// Drives every live state with the same character.
///
/// The first terminal (or jump) ends the whole group. States that leave the
/// character unhandled drop out; the group is unhandled once none are left.
pub struct Parallel<C> {
    states: Vec<Boxed<C>>,
}

impl<C: 'static> Parallel<C> {
    pub fn new(states: Vec<Boxed<C>>) -> Self {
        Parallel { states }
    }
}

impl<C: 'static> State<C> for Parallel<C> {
    fn next(mut self: Box<Self>, cx: &mut C, input: Option<char>) -> Outcome<C> {
        let states = std::mem::take(&mut self.states);
        let mut live = Vec::with_capacity(states.len());
        for state in states {
            match state.next(cx, input) {
                Outcome::Next(state) => live.push(state),
                Outcome::Unhandled => {}
                other => return other,
            }
        }
        match live.len() {
            0 => Outcome::Unhandled,
            1 => Outcome::Next(live.remove(0)),
            _ => {
                self.states = live;
                Outcome::Next(self)
            }
        }
    }

    fn name(&self) -> &'static str {
        "parallel"
    }
}

/// Alternation: the first candidate that does not leave the character
/// unhandled wins. Candidates must not touch the context before deciding.
pub struct FirstOf<C> {
    states: Vec<Boxed<C>>,
}

impl<C: 'static> FirstOf<C> {
    pub fn new(states: Vec<Boxed<C>>) -> Self {
        FirstOf { states }
    }
}

impl<C: 'static> State<C> for FirstOf<C> {
    fn next(self: Box<Self>, cx: &mut C, input: Option<char>) -> Outcome<C> {
        for state in self.states {
            match state.next(cx, input) {
                Outcome::Unhandled => continue,
                other => return other,
            }
        }
        Outcome::Unhandled
    }

    fn name(&self) -> &'static str {
        "first-of"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feeds `input` and then the end-of-input character, stopping at the
    /// first outcome that is not a plain continuation.
    fn run(start: Boxed<String>, cx: &mut String, input: &str) -> Outcome<String> {
        let mut state = start;
        for ch in input.chars().map(Some).chain(std::iter::once(None)) {
            match state.next(cx, ch) {
                Outcome::Next(next) => state = next,
                other => return other,
            }
        }
        Outcome::Next(state)
    }

    fn digits(this: Box<Looping<String, ()>>, cx: &mut String, input: Option<char>) -> Outcome<String> {
        match input {
            Some(c) if c.is_ascii_digit() => {
                cx.push(c);
                this.again()
            }
            _ => Outcome::Unhandled,
        }
    }

    fn letters(this: Box<Looping<String, ()>>, cx: &mut String, input: Option<char>) -> Outcome<String> {
        match input {
            Some(c) if c.is_ascii_alphabetic() => {
                cx.push(c.to_ascii_uppercase());
                this.again()
            }
            _ => Outcome::Unhandled,
        }
    }

    fn finish_at_end(_cx: &mut String, input: Option<char>) -> Outcome<String> {
        match input {
            None => Outcome::finished(),
            ch => Outcome::fail(Error::invalid(ch, "end of input")),
        }
    }

    #[test]
    fn test_step_redispatches_unhandled_character() {
        let chain = Step::new(
            Box::new(looping("digits", (), digits)),
            Step::new(
                Box::new(looping("letters", (), letters)),
                Box::new(statement("end", finish_at_end)),
            )
            .boxed(),
        );
        let mut out = String::new();
        let outcome = run(chain.boxed(), &mut out, "12ab");
        assert!(matches!(outcome, Outcome::Done(Terminal::Finished)));
        assert_eq!(out, "12AB");
    }

    #[test]
    fn test_terminal_propagates_through_step() {
        let chain = Step::new(
            Box::new(looping("digits", (), digits)),
            Box::new(statement("end", finish_at_end)),
        );
        let mut out = String::new();
        let outcome = run(chain.boxed(), &mut out, "12-");
        assert!(matches!(outcome, Outcome::Done(Terminal::Failed(_))));
        assert_eq!(out, "12");
    }

    #[test]
    fn test_terminal_is_idempotent() {
        let terminal: Boxed<String> = Box::new(Terminal::Finished);
        let mut out = String::new();
        let outcome = terminal.next(&mut out, Some('x'));
        let Outcome::Done(terminal) = outcome else {
            panic!("expected a terminal");
        };
        let again = Box::new(terminal).next(&mut out, None);
        assert!(matches!(again, Outcome::Done(Terminal::Finished)));
    }

    #[test]
    fn test_parallel_drops_unhandled_and_keeps_the_rest() {
        let group = Parallel::new(vec![
            Box::new(looping("digits", (), digits)),
            Box::new(looping("letters", (), letters)),
        ]);
        let mut out = String::new();
        let outcome = Box::new(group).next(&mut out, Some('a'));
        assert!(matches!(outcome, Outcome::Next(_)));
        assert_eq!(out, "A");

        let Outcome::Next(state) = outcome else {
            unreachable!()
        };
        assert!(state.next(&mut out, Some('1')).is_unhandled());
    }

    #[test]
    fn test_parallel_first_terminal_wins() {
        let group = Parallel::new(vec![
            Box::new(statement("end", finish_at_end)),
            Box::new(looping("digits", (), digits)),
        ]);
        let mut out = String::new();
        let outcome = Box::new(group).next(&mut out, Some('7'));
        assert!(matches!(outcome, Outcome::Done(Terminal::Failed(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn test_first_of_takes_first_accepting_candidate() {
        let alternatives = FirstOf::new(vec![
            Box::new(looping("digits", (), digits)),
            Box::new(looping("letters", (), letters)),
        ]);
        let mut out = String::new();
        assert!(matches!(
            Box::new(alternatives).next(&mut out, Some('q')),
            Outcome::Next(_)
        ));
        assert_eq!(out, "Q");

        let none = FirstOf::<String>::new(vec![Box::new(Pass)]);
        assert!(Box::new(none).next(&mut out, Some('q')).is_unhandled());
    }

    const OUTER: Label = Label("outer");

    fn bail_on_bang(this: Box<Looping<String, ()>>, cx: &mut String, input: Option<char>) -> Outcome<String> {
        match input {
            Some('!') => Outcome::Jump(OUTER, Box::new(looping("letters", (), letters))),
            Some(c) => {
                cx.push(c);
                this.again()
            }
            None => Outcome::Unhandled,
        }
    }

    #[test]
    fn test_jump_unwinds_to_labelled_step() {
        let inner = Step::new(
            Box::new(looping("bail", (), bail_on_bang)),
            Box::new(statement("inner-end", finish_at_end)),
        );
        let outer = Step::labeled(
            OUTER,
            Step::new(inner.boxed(), Box::new(statement("never", finish_at_end))).boxed(),
            Box::new(statement("end", finish_at_end)),
        );
        let mut out = String::new();
        let outcome = run(outer.boxed(), &mut out, "12!ab");
        assert!(matches!(outcome, Outcome::Unhandled));
        assert_eq!(out, "12AB");
    }

    #[test]
    fn test_unlabelled_jump_escapes() {
        let chain = Step::new(
            Box::new(looping("bail", (), bail_on_bang)),
            Box::new(statement("end", finish_at_end)),
        );
        let mut out = String::new();
        let outcome = Box::new(chain).next(&mut out, Some('!'));
        assert!(matches!(outcome, Outcome::Jump(OUTER, _)));
    }

    #[test]
    fn test_names() {
        let chain: Boxed<String> = Step::labeled(OUTER, pass(), pass()).boxed();
        assert_eq!(chain.name(), "outer");
        let pass: Boxed<String> = pass();
        assert_eq!(pass.name(), "Pass");
    }
}
