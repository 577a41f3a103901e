//! Number literals.
//!
//! The automaton appends digits to a [`NumberAcc`] and moves its [`Mode`]
//! forward as the literal takes shape. Any branch that breaks off half way (a
//! `.` with no digit after it, `0x` with no hex digit, an exponent marker with
//! no digits) leaves the accumulator in [`Mode::Pending`], and resolving a
//! pending accumulator is an error.
//!
//! ```text
//! [+-] ( 0 ( [xX] hex+ | digit* ) | [1-9] digit* ) ( . digit+ )? ( [eE] [+-]? digit+ )?
//! ```

use crate::error::{Error, Literal, Result};
use crate::state::{looping, pass, Boxed, Looping, Outcome, State, Step};
use crate::value::Number;
use num_bigint::BigInt;

/// How much of a numeral has been recognised.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Nothing complete yet, or a branch was left unfinished.
    #[default]
    Pending,
    Integer,
    Hex,
    Float,
}

/// Scratch space for the number automaton.
///
/// The sign is tracked apart from the numeral text because the integer
/// conversions do not accept one.
#[derive(Clone, Debug, Default)]
pub struct NumberAcc {
    mode: Mode,
    negative: bool,
    digits: String,
}

impl NumberAcc {
    pub fn reset(&mut self) {
        self.mode = Mode::Pending;
        self.negative = false;
        self.digits.clear();
    }

    /// Marks the numeral as negative; used when the sign was read elsewhere.
    pub fn negate(&mut self) {
        self.negative = true;
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The literal as written, minus any `+`.
    #[must_use]
    pub fn literal(&self) -> String {
        let sign = if self.negative { "-" } else { "" };
        match self.mode {
            Mode::Hex => format!("{}0x{}", sign, self.digits),
            _ => format!("{}{}", sign, self.digits),
        }
    }

    /// Converts the accumulated numeral into a [`Number`].
    pub fn resolve(&self) -> Result<Number> {
        match self.mode {
            Mode::Pending => Err(Error::malformed(
                Literal::Number,
                format!("`{}` is incomplete", self.literal()),
            )),
            Mode::Hex if self.negative => Err(Error::malformed(
                Literal::Number,
                format!("hex numeral `{}` cannot be negative", self.literal()),
            )),
            Mode::Hex => match u64::from_str_radix(&self.digits, 16) {
                Ok(value) => Ok(Number::Unsigned(value)),
                Err(_) => self.big(16),
            },
            Mode::Integer => match self.digits.parse::<u64>() {
                Ok(value) if self.negative => Ok(negative(value)),
                Ok(value) => Ok(Number::from(value)),
                Err(_) => self.big(10),
            },
            Mode::Float => {
                let value: f64 = self.digits.parse().map_err(|_| {
                    Error::malformed(Literal::Number, format!("`{}` is not a float", self.literal()))
                })?;
                if !value.is_finite() {
                    return Err(Error::malformed(
                        Literal::Number,
                        format!("`{}` is out of range", self.literal()),
                    ));
                }
                Ok(Number::Float(if self.negative { -value } else { value }))
            }
        }
    }

    fn big(&self, radix: u32) -> Result<Number> {
        let magnitude = BigInt::parse_bytes(self.digits.as_bytes(), radix).ok_or_else(|| {
            Error::malformed(Literal::Number, format!("`{}` is not a numeral", self.literal()))
        })?;
        Ok(Number::Big(if self.negative { -magnitude } else { magnitude }))
    }

    fn push(&mut self, ch: char, mode: Mode) {
        self.digits.push(ch);
        self.mode = mode;
    }
}

fn negative(magnitude: u64) -> Number {
    match i64::try_from(magnitude) {
        Ok(value) => Number::Integer(-value),
        Err(_) if magnitude == i64::MIN.unsigned_abs() => Number::Integer(i64::MIN),
        Err(_) => Number::Big(-BigInt::from(magnitude)),
    }
}

/// Access to the number accumulator inside a larger context.
pub trait NumberScratch {
    fn number(&mut self) -> &mut NumberAcc;
}

impl NumberScratch for NumberAcc {
    fn number(&mut self) -> &mut NumberAcc {
        self
    }
}

/// A full numeral, sign included.
pub fn signed<C: NumberScratch + 'static>() -> Boxed<C> {
    Step::new(Box::new(Sign), magnitude()).boxed()
}

/// A numeral whose sign, if any, has already been consumed.
pub fn magnitude<C: NumberScratch + 'static>() -> Boxed<C> {
    Step::new(
        Box::new(Lead),
        Step::new(Box::new(Fraction), Box::new(Exponent)).boxed(),
    )
    .boxed()
}

/// A standalone literal: the numeral followed by one terminating character,
/// at which point the accumulator must resolve.
pub fn literal<C: NumberScratch + 'static>() -> Boxed<C> {
    Step::new(signed(), Box::new(Resolve)).boxed()
}

struct Sign;

impl<C: NumberScratch + 'static> State<C> for Sign {
    fn next(self: Box<Self>, cx: &mut C, input: Option<char>) -> Outcome<C> {
        match input {
            Some('+') => Outcome::Next(pass()),
            Some('-') => {
                cx.number().negate();
                Outcome::Next(pass())
            }
            _ => Outcome::Unhandled,
        }
    }
}

struct Lead;

impl<C: NumberScratch + 'static> State<C> for Lead {
    fn next(self: Box<Self>, cx: &mut C, input: Option<char>) -> Outcome<C> {
        match input {
            Some('0') => {
                cx.number().push('0', Mode::Integer);
                Outcome::next(AfterZero)
            }
            Some(c @ '1'..='9') => {
                cx.number().push(c, Mode::Integer);
                Outcome::next(looping("digits", (), digits::<C>))
            }
            _ => Outcome::Unhandled,
        }
    }
}

/// Either the hex prefix or more decimal digits.
struct AfterZero;

impl<C: NumberScratch + 'static> State<C> for AfterZero {
    fn next(self: Box<Self>, cx: &mut C, input: Option<char>) -> Outcome<C> {
        match input {
            Some('x' | 'X') => {
                let acc = cx.number();
                acc.digits.clear();
                acc.mode = Mode::Pending;
                Outcome::next(looping("hex-digits", (), hex_digits::<C>))
            }
            Some(c) if c.is_ascii_digit() => {
                cx.number().push(c, Mode::Integer);
                Outcome::next(looping("digits", (), digits::<C>))
            }
            _ => Outcome::Unhandled,
        }
    }
}

fn digits<C: NumberScratch + 'static>(
    this: Box<Looping<C, ()>>,
    cx: &mut C,
    input: Option<char>,
) -> Outcome<C> {
    match input {
        Some(c) if c.is_ascii_digit() => {
            cx.number().digits.push(c);
            this.again()
        }
        _ => Outcome::Unhandled,
    }
}

fn hex_digits<C: NumberScratch + 'static>(
    this: Box<Looping<C, ()>>,
    cx: &mut C,
    input: Option<char>,
) -> Outcome<C> {
    match input {
        Some(c) if c.is_ascii_hexdigit() => {
            cx.number().push(c, Mode::Hex);
            this.again()
        }
        _ => Outcome::Unhandled,
    }
}

struct Fraction;

impl<C: NumberScratch + 'static> State<C> for Fraction {
    fn next(self: Box<Self>, cx: &mut C, input: Option<char>) -> Outcome<C> {
        let acc = cx.number();
        match input {
            Some('.') if acc.mode == Mode::Integer => {
                acc.push('.', Mode::Pending);
                Outcome::next(looping("fraction-digits", (), float_digits::<C>))
            }
            _ => Outcome::Unhandled,
        }
    }
}

struct Exponent;

impl<C: NumberScratch + 'static> State<C> for Exponent {
    fn next(self: Box<Self>, cx: &mut C, input: Option<char>) -> Outcome<C> {
        let acc = cx.number();
        match input {
            Some(c @ ('e' | 'E')) if matches!(acc.mode, Mode::Integer | Mode::Float) => {
                acc.push(c, Mode::Pending);
                Outcome::Next(
                    Step::new(
                        Box::new(ExponentSign),
                        Box::new(looping("exponent-digits", (), float_digits::<C>)),
                    )
                    .boxed(),
                )
            }
            _ => Outcome::Unhandled,
        }
    }
}

struct ExponentSign;

impl<C: NumberScratch + 'static> State<C> for ExponentSign {
    fn next(self: Box<Self>, cx: &mut C, input: Option<char>) -> Outcome<C> {
        match input {
            Some(c @ ('+' | '-')) => {
                cx.number().digits.push(c);
                Outcome::Next(pass())
            }
            _ => Outcome::Unhandled,
        }
    }
}

fn float_digits<C: NumberScratch + 'static>(
    this: Box<Looping<C, ()>>,
    cx: &mut C,
    input: Option<char>,
) -> Outcome<C> {
    match input {
        Some(c) if c.is_ascii_digit() => {
            cx.number().push(c, Mode::Float);
            this.again()
        }
        _ => Outcome::Unhandled,
    }
}

struct Resolve;

impl<C: NumberScratch + 'static> State<C> for Resolve {
    fn next(self: Box<Self>, cx: &mut C, _input: Option<char>) -> Outcome<C> {
        match cx.number().resolve() {
            Ok(_) => Outcome::finished(),
            Err(err) => Outcome::fail(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Parser;
    use crate::error::ErrorKind;

    fn decode(input: &str) -> Result<Number> {
        let mut parser = Parser::new(input, NumberAcc::default());
        parser.parse_eof(literal())?;
        parser.context().resolve()
    }

    fn is_malformed(result: Result<Number>) -> bool {
        matches!(
            result.as_ref().map_err(Error::kind),
            Err(ErrorKind::Malformed {
                literal: Literal::Number,
                ..
            })
        )
    }

    #[test]
    fn test_integers() {
        assert_eq!(decode("42").unwrap(), Number::Integer(42));
        assert_eq!(decode("-42").unwrap(), Number::Integer(-42));
        assert_eq!(decode("+7").unwrap(), Number::Integer(7));
        assert_eq!(decode("007").unwrap(), Number::Integer(7));
        assert_eq!(decode("0").unwrap(), Number::Integer(0));
    }

    #[test]
    fn test_integer_range_edges() {
        assert_eq!(decode("-9223372036854775808").unwrap(), Number::Integer(i64::MIN));
        assert_eq!(
            decode("18446744073709551615").unwrap(),
            Number::Unsigned(u64::MAX)
        );
        let big = decode("123456789012345678901234567890").unwrap();
        assert_eq!(big.to_string(), "123456789012345678901234567890");
        let negative_big = decode("-18446744073709551616").unwrap();
        assert!(matches!(negative_big, Number::Big(_)));
        assert_eq!(negative_big.to_string(), "-18446744073709551616");
    }

    #[test]
    fn test_hex() {
        assert_eq!(decode("0x1F").unwrap(), Number::Unsigned(31));
        assert_eq!(decode("0Xff").unwrap(), Number::Unsigned(255));
        assert!(matches!(decode("0x1ffffffffffffffff").unwrap(), Number::Big(_)));
        assert!(is_malformed(decode("-0x10")));
        assert!(is_malformed(decode("0x")));
    }

    #[test]
    fn test_floats() {
        assert_eq!(decode("1.5").unwrap(), Number::Float(1.5));
        assert_eq!(decode("-0.25").unwrap(), Number::Float(-0.25));
        assert_eq!(decode("1e3").unwrap(), Number::Float(1000.0));
        assert_eq!(decode("2.5E-2").unwrap(), Number::Float(0.025));
        assert_eq!(decode("6.02e+23").unwrap(), Number::Float(6.02e23));
    }

    #[test]
    fn test_unfinished_branches_are_pending() {
        assert!(is_malformed(decode("0.")));
        assert!(is_malformed(decode("1e")));
        assert!(is_malformed(decode("1e+")));
        assert!(is_malformed(decode("-")));
        assert!(is_malformed(decode("1.e5")));
    }

    #[test]
    fn test_clean_terminator_resolves() {
        assert_eq!(decode("0.0,").unwrap(), Number::Float(0.0));
        assert_eq!(decode("12]").unwrap(), Number::Integer(12));
    }

    #[test]
    fn test_second_exponent_is_left_for_the_caller() {
        let mut parser = Parser::new("1e5e5", NumberAcc::default());
        parser.parse_eof(literal()).unwrap();
        assert_eq!(parser.offset(), 4);
        assert_eq!(parser.context().resolve().unwrap(), Number::Float(1e5));
    }

    #[test]
    fn test_infinite_float_is_rejected() {
        assert!(is_malformed(decode("1e400")));
    }
}
