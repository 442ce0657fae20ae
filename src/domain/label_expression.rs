//! Boolean queries over the labels of requirements and examples.
//!
//! Expressions are built left to right, either with the builder methods
//! ([`LabelExpression::label`], [`LabelExpression::and`], ...) or from text:
//!
//! ```
//! use reqkit::LabelExpression;
//!
//! let built = LabelExpression::label("fast").and_not("flaky");
//! let parsed: LabelExpression = "fast and not flaky".parse().unwrap();
//! assert_eq!(built, parsed);
//!
//! let labels = vec!["fast".to_string()];
//! assert!(parsed.matches(Some(&labels)));
//! ```
//!
//! A chain of label tests is folded through five intermediate outcomes, so
//! that a label which was never mentioned can be told apart from one that
//! was explicitly negated. Combining two whole expressions only looks at
//! whether each side matched.

use std::{fmt, iter::Peekable, str::FromStr, vec::IntoIter};

/// A query over a set of labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LabelExpression {
    /// Matches when the label is present.
    Label(String),
    /// Matches when the label is absent.
    Not(String),
    /// `left or label`
    OrLabel(Box<Self>, String),
    /// `left and label`
    AndLabel(Box<Self>, String),
    /// `left or not label`
    OrNotLabel(Box<Self>, String),
    /// `left and not label`
    AndNotLabel(Box<Self>, String),
    /// `left or (right)`
    OrExpression(Box<Self>, Box<Self>),
    /// `left and (right)`
    AndExpression(Box<Self>, Box<Self>),
    /// `left or not (right)`
    OrNotExpression(Box<Self>, Box<Self>),
    /// `left and not (right)`
    AndNotExpression(Box<Self>, Box<Self>),
}

/// The right-hand side of a binary combinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A single label.
    Label(String),
    /// A nested expression.
    Expression(LabelExpression),
}

impl From<&str> for Operand {
    fn from(label: &str) -> Self {
        Self::Label(label.to_string())
    }
}

impl From<String> for Operand {
    fn from(label: String) -> Self {
        Self::Label(label)
    }
}

impl From<LabelExpression> for Operand {
    fn from(expression: LabelExpression) -> Self {
        Self::Expression(expression)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    NotIncluded,
    Excluded,
    NotIncludedAndExcluded,
    Failure,
}

impl Outcome {
    const fn from_bool(matched: bool) -> Self {
        if matched { Self::Success } else { Self::Failure }
    }

    const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl LabelExpression {
    /// An expression matching when `label` is present.
    #[must_use]
    pub fn label(label: impl Into<String>) -> Self {
        Self::Label(label.into())
    }

    /// An expression matching when `label` is absent.
    #[must_use]
    pub fn not(label: impl Into<String>) -> Self {
        Self::Not(label.into())
    }

    /// `self or operand`
    #[must_use]
    pub fn or(self, operand: impl Into<Operand>) -> Self {
        match operand.into() {
            Operand::Label(label) => Self::OrLabel(Box::new(self), label),
            Operand::Expression(right) => Self::OrExpression(Box::new(self), Box::new(right)),
        }
    }

    /// `self and operand`
    #[must_use]
    pub fn and(self, operand: impl Into<Operand>) -> Self {
        match operand.into() {
            Operand::Label(label) => Self::AndLabel(Box::new(self), label),
            Operand::Expression(right) => Self::AndExpression(Box::new(self), Box::new(right)),
        }
    }

    /// `self or not operand`
    #[must_use]
    pub fn or_not(self, operand: impl Into<Operand>) -> Self {
        match operand.into() {
            Operand::Label(label) => Self::OrNotLabel(Box::new(self), label),
            Operand::Expression(right) => Self::OrNotExpression(Box::new(self), Box::new(right)),
        }
    }

    /// `self and not operand`
    #[must_use]
    pub fn and_not(self, operand: impl Into<Operand>) -> Self {
        match operand.into() {
            Operand::Label(label) => Self::AndNotLabel(Box::new(self), label),
            Operand::Expression(right) => Self::AndNotExpression(Box::new(self), Box::new(right)),
        }
    }

    /// Whether a node carrying `labels` is selected by this expression.
    ///
    /// Absent labels behave like an empty set.
    #[must_use]
    pub fn matches(&self, labels: Option<&[String]>) -> bool {
        self.evaluate(labels.unwrap_or_default()).is_success()
    }

    fn evaluate(&self, labels: &[String]) -> Outcome {
        use Outcome::{Excluded, Failure, NotIncluded, NotIncludedAndExcluded, Success};

        let has = |label: &str| labels.iter().any(|candidate| candidate == label);
        match self {
            Self::Label(label) => {
                if has(label) {
                    Success
                } else {
                    NotIncluded
                }
            }
            Self::Not(label) => {
                if has(label) {
                    Excluded
                } else {
                    Success
                }
            }
            Self::AndLabel(left, label) => match (left.evaluate(labels), has(label)) {
                (Success, true) => Success,
                (Success, false) => NotIncluded,
                (Excluded, true) => Excluded,
                (Excluded, false) => NotIncludedAndExcluded,
                (outcome, _) => outcome,
            },
            Self::OrLabel(left, label) => match (left.evaluate(labels), has(label)) {
                (Success, _) => Success,
                (Excluded, true) | (NotIncludedAndExcluded, true) => Excluded,
                (Excluded, false) | (NotIncludedAndExcluded, false) => NotIncludedAndExcluded,
                (NotIncluded, true) => Success,
                (NotIncluded, false) => NotIncluded,
                (Failure, _) => Failure,
            },
            Self::OrNotLabel(left, label) => match (left.evaluate(labels), has(label)) {
                (Success, _) | (Excluded, false) => Success,
                (Excluded, true) => Excluded,
                (NotIncludedAndExcluded, false) => NotIncluded,
                (outcome, _) => outcome,
            },
            Self::AndNotLabel(left, label) => match (left.evaluate(labels), has(label)) {
                (Success, false) => Success,
                (Success, true) => Excluded,
                (NotIncluded, true) => NotIncludedAndExcluded,
                (outcome, _) => outcome,
            },
            Self::OrExpression(left, right) => Outcome::from_bool(
                left.evaluate(labels).is_success() || right.evaluate(labels).is_success(),
            ),
            Self::AndExpression(left, right) => Outcome::from_bool(
                left.evaluate(labels).is_success() && right.evaluate(labels).is_success(),
            ),
            Self::OrNotExpression(left, right) => Outcome::from_bool(
                left.evaluate(labels).is_success() || !right.evaluate(labels).is_success(),
            ),
            Self::AndNotExpression(left, right) => Outcome::from_bool(
                left.evaluate(labels).is_success() && !right.evaluate(labels).is_success(),
            ),
        }
    }
}

impl fmt::Display for LabelExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(label) => write!(f, "{label}"),
            Self::Not(label) => write!(f, "not {label}"),
            Self::OrLabel(left, label) => write!(f, "{left} or {label}"),
            Self::AndLabel(left, label) => write!(f, "{left} and {label}"),
            Self::OrNotLabel(left, label) => write!(f, "{left} or not {label}"),
            Self::AndNotLabel(left, label) => write!(f, "{left} and not {label}"),
            Self::OrExpression(left, right) => write!(f, "{left} or ({right})"),
            Self::AndExpression(left, right) => write!(f, "{left} and ({right})"),
            Self::OrNotExpression(left, right) => write!(f, "{left} or not ({right})"),
            Self::AndNotExpression(left, right) => write!(f, "{left} and not ({right})"),
        }
    }
}

/// An error parsing the textual form of a [`LabelExpression`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    /// There was nothing to parse.
    #[error("the label expression is empty")]
    Empty,

    /// A label or parenthesised expression was expected.
    #[error("expected a label or '(' but found {0}")]
    ExpectedTerm(String),

    /// Two terms were not joined by `and` or `or`.
    #[error("expected 'and' or 'or' but found '{0}'")]
    ExpectedOperator(String),

    /// A `(` without its `)` or the reverse.
    #[error("unbalanced parentheses in label expression")]
    Unbalanced,

    /// `not (...)` at the start of an expression.
    #[error("an expression can't start with a negated group; write it as a chain of labels instead")]
    NegatedGroup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Word(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("'('"),
            Self::Close => f.write_str("')'"),
            Self::Word(word) => write!(f, "'{word}'"),
        }
    }
}

const KEYWORDS: [&str; 3] = ["and", "or", "not"];

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for character in text.chars() {
        if character.is_whitespace() || character == '(' || character == ')' {
            if !word.is_empty() {
                tokens.push(Token::Word(std::mem::take(&mut word)));
            }
            match character {
                '(' => tokens.push(Token::Open),
                ')' => tokens.push(Token::Close),
                _ => {}
            }
        } else {
            word.push(character);
        }
    }
    if !word.is_empty() {
        tokens.push(Token::Word(word));
    }
    tokens
}

type Tokens = Peekable<IntoIter<Token>>;

fn describe(token: Option<&Token>) -> String {
    token.map_or_else(|| "the end of the expression".to_string(), ToString::to_string)
}

fn label(tokens: &mut Tokens) -> Result<String, ExpressionError> {
    match tokens.next() {
        Some(Token::Word(word)) if !KEYWORDS.contains(&word.as_str()) => Ok(word),
        other => Err(ExpressionError::ExpectedTerm(describe(other.as_ref()))),
    }
}

fn group(tokens: &mut Tokens) -> Result<LabelExpression, ExpressionError> {
    let inner = expression(tokens)?;
    match tokens.next() {
        Some(Token::Close) => Ok(inner),
        _ => Err(ExpressionError::Unbalanced),
    }
}

fn first_term(tokens: &mut Tokens) -> Result<LabelExpression, ExpressionError> {
    match tokens.peek() {
        Some(Token::Open) => {
            tokens.next();
            group(tokens)
        }
        Some(Token::Word(word)) if word == "not" => {
            tokens.next();
            if tokens.peek() == Some(&Token::Open) {
                return Err(ExpressionError::NegatedGroup);
            }
            label(tokens).map(LabelExpression::Not)
        }
        _ => label(tokens).map(LabelExpression::Label),
    }
}

fn operand(tokens: &mut Tokens) -> Result<Operand, ExpressionError> {
    if tokens.next_if_eq(&Token::Open).is_some() {
        group(tokens).map(Operand::Expression)
    } else {
        label(tokens).map(Operand::Label)
    }
}

fn expression(tokens: &mut Tokens) -> Result<LabelExpression, ExpressionError> {
    let mut expression = first_term(tokens)?;
    loop {
        let conjunction = match tokens.peek() {
            None | Some(Token::Close) => return Ok(expression),
            Some(Token::Word(word)) if word == "and" => true,
            Some(Token::Word(word)) if word == "or" => false,
            Some(other) => return Err(ExpressionError::ExpectedOperator(other.to_string())),
        };
        tokens.next();
        let negated = tokens
            .next_if_eq(&Token::Word("not".to_string()))
            .is_some();
        let right = operand(tokens)?;
        expression = match (conjunction, negated) {
            (true, false) => expression.and(right),
            (true, true) => expression.and_not(right),
            (false, false) => expression.or(right),
            (false, true) => expression.or_not(right),
        };
    }
}

impl FromStr for LabelExpression {
    type Err = ExpressionError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut tokens = tokenize(text).into_iter().peekable();
        if tokens.peek().is_none() {
            return Err(ExpressionError::Empty);
        }
        let expression = expression(&mut tokens)?;
        match tokens.next() {
            None => Ok(expression),
            Some(_) => Err(ExpressionError::Unbalanced),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn matches(expression: &LabelExpression, items: &[&str]) -> bool {
        expression.matches(Some(&labels(items)))
    }

    #[test]
    fn chained_and_requires_every_label() {
        let expression = LabelExpression::label("a").and("b");
        assert!(!matches(&expression, &["a"]));
        assert!(matches(&expression, &["a", "b"]));
    }

    #[test]
    fn not_matches_absent_labels() {
        let expression = LabelExpression::not("a");
        assert!(matches(&expression, &[]));
        assert!(!matches(&expression, &["a"]));
        assert!(expression.matches(None));
    }

    #[test]
    fn or_matches_either_label() {
        let expression = LabelExpression::label("a").or("b");
        assert!(matches(&expression, &["b"]));
        assert!(matches(&expression, &["a"]));
        assert!(!matches(&expression, &["c"]));
    }

    #[test_case(&[] => false; "nothing")]
    #[test_case(&["fast"] => true; "fast only")]
    #[test_case(&["fast", "flaky"] => false; "fast but flaky")]
    #[test_case(&["flaky"] => false; "flaky only")]
    fn and_not_label(items: &[&str]) -> bool {
        matches(&LabelExpression::label("fast").and_not("flaky"), items)
    }

    #[test_case(&[] => true; "nothing")]
    #[test_case(&["a"] => false; "excluded")]
    #[test_case(&["a", "b"] => false; "still excluded")]
    #[test_case(&["b"] => true; "unrelated")]
    fn excluded_stays_excluded_through_or(items: &[&str]) -> bool {
        matches(&LabelExpression::not("a").or("b"), items)
    }

    #[test_case(&[] => false; "nothing")]
    #[test_case(&["a"] => true; "first")]
    #[test_case(&["b"] => false; "excluded")]
    #[test_case(&["a", "b"] => false; "first but excluded")]
    fn negation_then_and(items: &[&str]) -> bool {
        matches(&LabelExpression::not("b").and("a"), items)
    }

    #[test]
    fn expressions_collapse_to_booleans() {
        let nested = LabelExpression::label("a").and("b");
        let expression = LabelExpression::label("c").or(nested.clone());
        assert!(matches(&expression, &["a", "b"]));
        assert!(matches(&expression, &["c"]));
        assert!(!matches(&expression, &["a"]));

        let negated = LabelExpression::label("c").and_not(nested);
        assert!(matches(&negated, &["c", "a"]));
        assert!(!matches(&negated, &["c", "a", "b"]));
    }

    #[test]
    fn or_not_expression() {
        let expression = LabelExpression::label("a").or_not(LabelExpression::label("b"));
        assert!(matches(&expression, &[]));
        assert!(matches(&expression, &["a", "b"]));
        assert!(!matches(&expression, &["b"]));
    }

    #[test_case("a" => LabelExpression::label("a"))]
    #[test_case("not a" => LabelExpression::not("a"))]
    #[test_case("a and b or not c" => LabelExpression::label("a").and("b").or_not("c"))]
    #[test_case("a and (b or c)" => LabelExpression::label("a").and(LabelExpression::label("b").or("c")))]
    #[test_case("(a or b) and not (c)" => LabelExpression::label("a").or("b").and_not(LabelExpression::label("c")))]
    #[test_case("  spaced   and\tout " => LabelExpression::label("spaced").and("out"))]
    fn parses_expressions(text: &str) -> LabelExpression {
        text.parse().unwrap()
    }

    #[test_case("" => ExpressionError::Empty)]
    #[test_case("a b" => ExpressionError::ExpectedOperator("'b'".to_string()))]
    #[test_case("a and" => ExpressionError::ExpectedTerm("the end of the expression".to_string()))]
    #[test_case("a and or" => ExpressionError::ExpectedTerm("'or'".to_string()))]
    #[test_case("(a and b" => ExpressionError::Unbalanced)]
    #[test_case("a)" => ExpressionError::Unbalanced)]
    #[test_case("not (a)" => ExpressionError::NegatedGroup)]
    fn rejects_malformed_expressions(text: &str) -> ExpressionError {
        text.parse::<LabelExpression>().unwrap_err()
    }

    #[test_case(LabelExpression::label("a").and("b").or_not("c"))]
    #[test_case(LabelExpression::not("a").and_not(LabelExpression::label("b").or("c")))]
    #[test_case(LabelExpression::label("a").or(LabelExpression::not("b").and(LabelExpression::label("c"))))]
    fn display_round_trips(expression: LabelExpression) {
        let text = expression.to_string();
        assert_eq!(text.parse::<LabelExpression>().unwrap(), expression);
    }
}
