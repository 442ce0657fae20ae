//! A small backtracking parser-combinator library over lines.
//!
//! Grammar rules are plain functions `fn(&mut Cursor) -> ParseResult<T>`;
//! every such function is a [`Parser`] and can be composed with the
//! combinators here. Every parser in this module leaves the cursor untouched
//! when it fails, so alternatives can always retry from the same position.
//!
//! Blank lines are insignificant: they are skipped before every attempt.

use std::marker::PhantomData;

use nonempty::NonEmpty;

use super::{
    error::{Invalid, ParseError},
    line::{Cursor, Line},
};

/// The result of running a parser.
pub type ParseResult<T> = Result<T, ParseError>;

/// Something that can parse a `T` from the lines under a cursor.
pub trait Parser<T> {
    /// Runs the parser, advancing `input` past whatever it consumed.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the input does not match. The cursor is
    /// left where it was.
    fn parse(&self, input: &mut Cursor<'_>) -> ParseResult<T>;

    /// Runs `self` then `next`, yielding both results.
    fn then<U, P>(self, next: P) -> Then<Self, P>
    where
        Self: Sized,
        P: Parser<U>,
    {
        Then { first: self, second: next }
    }

    /// Runs `self` then `next`, keeping only the result of `self`.
    fn then_ignore<U, P>(self, next: P) -> ThenIgnore<Self, P, U>
    where
        Self: Sized,
        P: Parser<U>,
    {
        ThenIgnore {
            first: self,
            second: next,
            _ignored: PhantomData,
        }
    }

    /// Runs `self` then `next`, keeping only the result of `next`.
    fn ignore_then<U, P>(self, next: P) -> IgnoreThen<Self, P, T>
    where
        Self: Sized,
        P: Parser<U>,
    {
        IgnoreThen {
            first: self,
            second: next,
            _ignored: PhantomData,
        }
    }

    /// Tries `self`, and if it fails tries `other` from the same position.
    ///
    /// When both fail, the error that occurred deeper in the input wins.
    fn or<P>(self, other: P) -> Or<Self, P>
    where
        Self: Sized,
        P: Parser<T>,
    {
        Or { left: self, right: other }
    }

    /// Transforms a successful result.
    fn map<U, F>(self, f: F) -> Map<Self, F, T>
    where
        Self: Sized,
        F: Fn(T) -> U,
    {
        Map {
            parser: self,
            f,
            _input: PhantomData,
        }
    }

    /// Transforms a successful result with a validation step that may fail.
    ///
    /// A failure becomes a validation [`ParseError`] reported at the line the
    /// construct started on, unless the [`Invalid`] names its own line.
    fn try_map<U, F>(self, f: F) -> TryMap<Self, F, T>
    where
        Self: Sized,
        F: Fn(T) -> Result<U, Invalid>,
    {
        TryMap {
            parser: self,
            f,
            _input: PhantomData,
        }
    }
}

impl<T, F> Parser<T> for F
where
    F: Fn(&mut Cursor<'_>) -> ParseResult<T>,
{
    fn parse(&self, input: &mut Cursor<'_>) -> ParseResult<T> {
        self(input)
    }
}

/// Parses the next non-blank line with `f`, consuming it on success.
pub const fn line<T, F>(f: F) -> Atomic<F>
where
    F: Fn(&Line) -> Result<T, String>,
{
    Atomic { f, consume: true }
}

/// Checks the next non-blank line with `f` without consuming it.
pub const fn peek_line<T, F>(f: F) -> Atomic<F>
where
    F: Fn(&Line) -> Result<T, String>,
{
    Atomic { f, consume: false }
}

/// Succeeds only when nothing but blank lines remain.
#[must_use]
pub const fn end() -> End {
    End
}

/// Succeeds, consuming nothing, exactly when `parser` fails.
pub const fn not<T, P>(parser: P) -> Not<P, T>
where
    P: Parser<T>,
{
    Not {
        parser,
        _output: PhantomData,
    }
}

/// Runs `parser`, yielding `None` instead of failing.
pub const fn optional<T, P>(parser: P) -> Optional<P>
where
    P: Parser<T>,
{
    Optional { parser }
}

/// Collects elements until `until` succeeds at the current position.
///
/// `until` is only used as lookahead and never consumes input. If it fails
/// and the element parser fails too, the element's error is returned.
pub const fn zero_or_more<T, U, P, Q>(element: P, until: Q) -> ZeroOrMore<P, Q, U>
where
    P: Parser<T>,
    Q: Parser<U>,
{
    ZeroOrMore {
        element,
        until,
        _until: PhantomData,
    }
}

/// Like [`zero_or_more`], but fails unless at least one element is found.
///
/// `name` describes the element in the resulting error message.
pub const fn one_or_more<T, U, P, Q>(
    name: &'static str,
    element: P,
    until: Q,
) -> OneOrMore<P, Q, U>
where
    P: Parser<T>,
    Q: Parser<U>,
{
    OneOrMore {
        name,
        inner: zero_or_more(element, until),
    }
}

/// See [`line`] and [`peek_line`].
#[derive(Debug, Clone, Copy)]
pub struct Atomic<F> {
    f: F,
    consume: bool,
}

impl<T, F> Parser<T> for Atomic<F>
where
    F: Fn(&Line) -> Result<T, String>,
{
    fn parse(&self, input: &mut Cursor<'_>) -> ParseResult<T> {
        let start = input.skip_blank();
        let Some(line) = start.peek() else {
            return Err(ParseError::syntax(
                start.line_number(),
                "unexpected end of input",
            ));
        };
        let value = (self.f)(line).map_err(|message| ParseError::syntax(line.number, message))?;
        *input = if self.consume { start.advance() } else { start };
        Ok(value)
    }
}

/// See [`Parser::then`].
#[derive(Debug, Clone, Copy)]
pub struct Then<A, B> {
    first: A,
    second: B,
}

impl<T, U, A, B> Parser<(T, U)> for Then<A, B>
where
    A: Parser<T>,
    B: Parser<U>,
{
    fn parse(&self, input: &mut Cursor<'_>) -> ParseResult<(T, U)> {
        let mut cursor = input.skip_blank();
        let first = self.first.parse(&mut cursor)?;
        let second = self.second.parse(&mut cursor)?;
        *input = cursor;
        Ok((first, second))
    }
}

/// See [`Parser::then_ignore`].
#[derive(Debug, Clone, Copy)]
pub struct ThenIgnore<A, B, U> {
    first: A,
    second: B,
    _ignored: PhantomData<fn() -> U>,
}

impl<T, U, A, B> Parser<T> for ThenIgnore<A, B, U>
where
    A: Parser<T>,
    B: Parser<U>,
{
    fn parse(&self, input: &mut Cursor<'_>) -> ParseResult<T> {
        let mut cursor = input.skip_blank();
        let first = self.first.parse(&mut cursor)?;
        self.second.parse(&mut cursor)?;
        *input = cursor;
        Ok(first)
    }
}

/// See [`Parser::ignore_then`].
#[derive(Debug, Clone, Copy)]
pub struct IgnoreThen<A, B, T> {
    first: A,
    second: B,
    _ignored: PhantomData<fn() -> T>,
}

impl<T, U, A, B> Parser<U> for IgnoreThen<A, B, T>
where
    A: Parser<T>,
    B: Parser<U>,
{
    fn parse(&self, input: &mut Cursor<'_>) -> ParseResult<U> {
        let mut cursor = input.skip_blank();
        self.first.parse(&mut cursor)?;
        let second = self.second.parse(&mut cursor)?;
        *input = cursor;
        Ok(second)
    }
}

/// See [`Parser::or`].
#[derive(Debug, Clone, Copy)]
pub struct Or<A, B> {
    left: A,
    right: B,
}

impl<T, A, B> Parser<T> for Or<A, B>
where
    A: Parser<T>,
    B: Parser<T>,
{
    fn parse(&self, input: &mut Cursor<'_>) -> ParseResult<T> {
        let start = input.skip_blank();

        let mut cursor = start;
        let left_error = match self.left.parse(&mut cursor) {
            Ok(value) => {
                *input = cursor;
                return Ok(value);
            }
            Err(error) => error,
        };

        let mut cursor = start;
        match self.right.parse(&mut cursor) {
            Ok(value) => {
                *input = cursor;
                Ok(value)
            }
            Err(right_error) => Err(left_error.deepest(right_error)),
        }
    }
}

/// See [`Parser::map`].
#[derive(Debug, Clone, Copy)]
pub struct Map<P, F, T> {
    parser: P,
    f: F,
    _input: PhantomData<fn() -> T>,
}

impl<T, U, P, F> Parser<U> for Map<P, F, T>
where
    P: Parser<T>,
    F: Fn(T) -> U,
{
    fn parse(&self, input: &mut Cursor<'_>) -> ParseResult<U> {
        self.parser.parse(input).map(&self.f)
    }
}

/// See [`Parser::try_map`].
#[derive(Debug, Clone, Copy)]
pub struct TryMap<P, F, T> {
    parser: P,
    f: F,
    _input: PhantomData<fn() -> T>,
}

impl<T, U, P, F> Parser<U> for TryMap<P, F, T>
where
    P: Parser<T>,
    F: Fn(T) -> Result<U, Invalid>,
{
    fn parse(&self, input: &mut Cursor<'_>) -> ParseResult<U> {
        let start_line = input.line_number();
        let mut cursor = *input;
        let value = self.parser.parse(&mut cursor)?;
        let mapped = (self.f)(value).map_err(|invalid| {
            ParseError::validation(invalid.line.unwrap_or(start_line), invalid.message)
        })?;
        *input = cursor;
        Ok(mapped)
    }
}

/// See [`end`].
#[derive(Debug, Clone, Copy)]
pub struct End;

impl Parser<()> for End {
    fn parse(&self, input: &mut Cursor<'_>) -> ParseResult<()> {
        let cursor = input.skip_blank();
        if cursor.peek().is_some() {
            return Err(ParseError::syntax(
                cursor.line_number(),
                "expected end of file but there are still lines remaining",
            ));
        }
        *input = cursor;
        Ok(())
    }
}

/// See [`not`].
#[derive(Debug, Clone, Copy)]
pub struct Not<P, T> {
    parser: P,
    _output: PhantomData<fn() -> T>,
}

impl<T, P> Parser<()> for Not<P, T>
where
    P: Parser<T>,
{
    fn parse(&self, input: &mut Cursor<'_>) -> ParseResult<()> {
        let mut cursor = *input;
        match self.parser.parse(&mut cursor) {
            Ok(_) => Err(ParseError::syntax(
                input.line_number(),
                "did not expect this line here",
            )),
            Err(_) => Ok(()),
        }
    }
}

/// See [`optional`].
#[derive(Debug, Clone, Copy)]
pub struct Optional<P> {
    parser: P,
}

impl<T, P> Parser<Option<T>> for Optional<P>
where
    P: Parser<T>,
{
    fn parse(&self, input: &mut Cursor<'_>) -> ParseResult<Option<T>> {
        let mut cursor = *input;
        match self.parser.parse(&mut cursor) {
            Ok(value) => {
                *input = cursor;
                Ok(Some(value))
            }
            Err(_) => Ok(None),
        }
    }
}

/// See [`zero_or_more`].
#[derive(Debug, Clone, Copy)]
pub struct ZeroOrMore<P, Q, U> {
    element: P,
    until: Q,
    _until: PhantomData<fn() -> U>,
}

impl<T, U, P, Q> Parser<Vec<T>> for ZeroOrMore<P, Q, U>
where
    P: Parser<T>,
    Q: Parser<U>,
{
    fn parse(&self, input: &mut Cursor<'_>) -> ParseResult<Vec<T>> {
        let mut cursor = input.skip_blank();
        let mut accumulated = Vec::new();
        loop {
            let mut lookahead = cursor;
            if self.until.parse(&mut lookahead).is_ok() {
                break;
            }
            let before = cursor.position();
            accumulated.push(self.element.parse(&mut cursor)?);
            if cursor.position() == before {
                break;
            }
        }
        *input = cursor;
        Ok(accumulated)
    }
}

/// See [`one_or_more`].
#[derive(Debug, Clone, Copy)]
pub struct OneOrMore<P, Q, U> {
    name: &'static str,
    inner: ZeroOrMore<P, Q, U>,
}

impl<T, U, P, Q> Parser<NonEmpty<T>> for OneOrMore<P, Q, U>
where
    P: Parser<T>,
    Q: Parser<U>,
{
    fn parse(&self, input: &mut Cursor<'_>) -> ParseResult<NonEmpty<T>> {
        let mut cursor = *input;
        let items = self.inner.parse(&mut cursor)?;
        let items = NonEmpty::from_vec(items).ok_or_else(|| {
            ParseError::syntax(
                cursor.line_number(),
                format!("expected at least one {}", self.name),
            )
        })?;
        *input = cursor;
        Ok(items)
    }
}
