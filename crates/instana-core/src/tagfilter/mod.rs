//! tag-filter expression language: parse, render, normalize and api mapping.

mod api;
mod field;
mod lexer;
mod parser;

pub use api::{
    canonical_text, from_api_model, tag_filter_from_api, tag_filter_to_api, to_api_model,
    TagFilterLeaf, TagFilterModel,
};
pub use field::{
    normalize_tag_filter, suppress_equivalent_tag_filters, tag_filter_field, validate_tag_filter,
};
pub use parser::parse;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// parse failure carrying the 1-based column of the offending input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message} at column {column}")]
pub struct ParseError {
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub(crate) fn at(offset: usize, message: impl Into<String>) -> Self {
        Self {
            column: offset + 1,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

/// entity side a tag is evaluated on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityOrigin {
    Source,
    #[default]
    Destination,
    NotApplicable,
}

impl EntityOrigin {
    /// textual form used after `@`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityOrigin::Source => "src",
            EntityOrigin::Destination => "dest",
            EntityOrigin::NotApplicable => "na",
        }
    }

    pub fn from_keyword(raw: &str) -> Option<Self> {
        match raw {
            "src" => Some(EntityOrigin::Source),
            "dest" => Some(EntityOrigin::Destination),
            "na" => Some(EntityOrigin::NotApplicable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Equals,
    NotEqual,
    Contains,
    NotContain,
    StartsWith,
    EndsWith,
    NotStartsWith,
    NotEndsWith,
    GreaterOrEqualThan,
    GreaterThan,
    LessOrEqualThan,
    LessThan,
    IsEmpty,
    NotEmpty,
    IsBlank,
    NotBlank,
}

impl Operator {
    pub const ALL: [Operator; 16] = [
        Operator::Equals,
        Operator::NotEqual,
        Operator::Contains,
        Operator::NotContain,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::NotStartsWith,
        Operator::NotEndsWith,
        Operator::GreaterOrEqualThan,
        Operator::GreaterThan,
        Operator::LessOrEqualThan,
        Operator::LessThan,
        Operator::IsEmpty,
        Operator::NotEmpty,
        Operator::IsBlank,
        Operator::NotBlank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "EQUALS",
            Operator::NotEqual => "NOT_EQUAL",
            Operator::Contains => "CONTAINS",
            Operator::NotContain => "NOT_CONTAIN",
            Operator::StartsWith => "STARTS_WITH",
            Operator::EndsWith => "ENDS_WITH",
            Operator::NotStartsWith => "NOT_STARTS_WITH",
            Operator::NotEndsWith => "NOT_ENDS_WITH",
            Operator::GreaterOrEqualThan => "GREATER_OR_EQUAL_THAN",
            Operator::GreaterThan => "GREATER_THAN",
            Operator::LessOrEqualThan => "LESS_OR_EQUAL_THAN",
            Operator::LessThan => "LESS_THAN",
            Operator::IsEmpty => "IS_EMPTY",
            Operator::NotEmpty => "NOT_EMPTY",
            Operator::IsBlank => "IS_BLANK",
            Operator::NotBlank => "NOT_BLANK",
        }
    }

    /// case-insensitive keyword lookup.
    pub fn from_keyword(raw: &str) -> Option<Self> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(raw))
    }

    /// unary operators take no value.
    pub fn is_unary(&self) -> bool {
        matches!(
            self,
            Operator::IsEmpty | Operator::NotEmpty | Operator::IsBlank | Operator::NotBlank
        )
    }
}

/// tag reference: `name(:key)?@origin`.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpec {
    pub name: String,
    pub key: Option<String>,
    pub origin: EntityOrigin,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    String(String),
    Number(f64),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub entity: EntitySpec,
    pub operator: Operator,
    pub value: Option<TagValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Logical {
        left: Box<Expression>,
        operator: LogicalOperator,
        right: Box<Expression>,
    },
    Bracket(Box<Expression>),
    Comparison(Comparison),
}

impl Expression {
    pub fn logical(left: Expression, operator: LogicalOperator, right: Expression) -> Self {
        Expression::Logical {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    /// canonical text form.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

fn is_plain_identifier(raw: &str) -> bool {
    let mut chars = raw.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '/'))
}

fn write_quoted(f: &mut fmt::Formatter<'_>, raw: &str) -> fmt::Result {
    write!(f, "'{}'", raw.replace('\'', "''"))
}

impl fmt::Display for EntitySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(key) = &self.key {
            f.write_str(":")?;
            if is_plain_identifier(key) {
                f.write_str(key)?;
            } else {
                write_quoted(f, key)?;
            }
        }
        write!(f, "@{}", self.origin.as_str())
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::String(raw) => write_quoted(f, raw),
            TagValue::Number(n) => write!(f, "{n}"),
            TagValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Logical {
                left,
                operator,
                right,
            } => write!(f, "{left} {} {right}", operator.as_str()),
            Expression::Bracket(inner) => write!(f, "({inner})"),
            Expression::Comparison(cmp) => {
                write!(f, "{} {}", cmp.entity, cmp.operator.as_str())?;
                match &cmp.value {
                    Some(value) => write!(f, " {value}"),
                    None => Ok(()),
                }
            }
        }
    }
}

/// canonical text of `input`, or `input` unchanged when it does not parse.
pub fn normalize(input: &str) -> String {
    match parse(input) {
        Ok(expr) => canonical_text(&expr),
        Err(_) => input.to_string(),
    }
}
