//! # Validation
//!
//! Two layers of validation share the `validator` crate:
//! - framework [`Settings`] are checked with `#[derive(Validate)]`
//! - configuration field values are checked against declared
//!   [`Constraint`]s before a binding pass commits them

use crate::schema::FieldSchema;
use crate::settings::Settings;
use crate::value::Value;
use regex::Regex;
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// Validate framework settings.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Validates settings loaded from TOML/YAML before they are applied.
///
/// ## Usage
/// ```rust,no_run
/// use hotconf::{Settings, validate};
///
/// let settings = Settings::default();
/// match validate(&settings) {
///     Ok(()) => println!("Settings are valid"),
///     Err(errors) => println!("Validation errors: {:?}", errors),
/// }
/// ```
///
/// ## Validation Rules
/// ### Codec
/// - `max_map_search_depth`: 1-20
///
/// ### Generator
/// - `starting_index`: 0 or 1
/// - `compact_max_length`: 16-1024
///
/// ### Keys
/// - every key: 32 hex characters
pub fn validate(settings: &Settings) -> Result<(), validator::ValidationErrors> {
    settings.validate()
}

/// A declarative check on one field value.
///
/// Null values pass every constraint except [`Constraint::NotNull`].
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Inclusive numeric range, applied per element to containers.
    Range { min: f64, max: f64 },
    /// Length of a string, collection or map.
    Length { min: Option<u64>, max: Option<u64> },
    /// Regular expression a string must match in full.
    Pattern(String),
    NotNull,
    /// Non-empty string, collection or map.
    NotEmpty,
    /// Number must equal one of the listed values.
    NumberEnum(Vec<f64>),
    /// String must equal one of the listed values.
    OneOf(Vec<String>),
    Positive,
    NonNegative,
}

impl Constraint {
    pub fn check(&self, value: &Value) -> Result<(), ValidationError> {
        if value.is_null() {
            return match self {
                Constraint::NotNull => Err(rejected("not_null", "value must not be null".into())),
                _ => Ok(()),
            };
        }
        match self {
            Constraint::Range { min, max } => match value {
                Value::Array { items, .. } | Value::List(items) | Value::Set(items) => {
                    items.iter().try_for_each(|item| self.check(item))?;
                }
                Value::Map(entries) => {
                    entries.iter().try_for_each(|(_, v)| self.check(v))?;
                }
                _ => {
                    let n = number(value)?;
                    if n < *min || n > *max {
                        return Err(rejected(
                            "range",
                            format!("{} is outside {}..={}", n, min, max).into(),
                        ));
                    }
                }
            },
            Constraint::Length { min, max } => {
                let len = length(value)?;
                if min.is_some_and(|m| len < m) || max.is_some_and(|m| len > m) {
                    return Err(rejected(
                        "length",
                        format!("length {} is outside {:?}..={:?}", len, min, max).into(),
                    ));
                }
            }
            Constraint::Pattern(pattern) => {
                let text = value
                    .as_str()
                    .ok_or_else(|| rejected("pattern", "pattern applies to strings".into()))?;
                let anchored = format!("^(?:{})$", pattern);
                let regex = Regex::new(&anchored).map_err(|e| {
                    rejected("pattern", format!("invalid pattern {}: {}", pattern, e).into())
                })?;
                if !regex.is_match(text) {
                    return Err(rejected(
                        "pattern",
                        format!("{:?} does not match {}", text, pattern).into(),
                    ));
                }
            }
            Constraint::NotNull => {}
            Constraint::NotEmpty => {
                if length(value)? == 0 {
                    return Err(rejected("not_empty", "value must not be empty".into()));
                }
            }
            Constraint::NumberEnum(allowed) => {
                let n = number(value)?;
                if !allowed.iter().any(|a| *a == n) {
                    return Err(rejected(
                        "number_enum",
                        format!("{} is not one of {:?}", n, allowed).into(),
                    ));
                }
            }
            Constraint::OneOf(allowed) => {
                let text = match value {
                    Value::Enum { constant, .. } => constant.as_str(),
                    other => other
                        .as_str()
                        .ok_or_else(|| rejected("one_of", "one_of applies to strings".into()))?,
                };
                if !allowed.iter().any(|a| a == text) {
                    return Err(rejected(
                        "one_of",
                        format!("{:?} is not one of {:?}", text, allowed).into(),
                    ));
                }
            }
            Constraint::Positive => {
                if number(value)? <= 0.0 {
                    return Err(rejected("positive", "value must be positive".into()));
                }
            }
            Constraint::NonNegative => {
                if number(value)? < 0.0 {
                    return Err(rejected("non_negative", "value must not be negative".into()));
                }
            }
        }
        Ok(())
    }
}

fn rejected(code: &'static str, message: Cow<'static, str>) -> ValidationError {
    ValidationError::new(code).with_message(message)
}

fn number(value: &Value) -> Result<f64, ValidationError> {
    value
        .as_f64()
        .ok_or_else(|| rejected("not_a_number", format!("{} is not a number", value).into()))
}

fn length(value: &Value) -> Result<u64, ValidationError> {
    let len = match value {
        Value::Str(s) => Some(s.chars().count()),
        other => other.len(),
    };
    len.map(|l| l as u64)
        .ok_or_else(|| rejected("no_length", format!("{} has no length", value).into()))
}

/// Checks a field value before it is committed.
pub trait FieldValidator: Send + Sync {
    fn validate(&self, field: &FieldSchema, value: &Value) -> Result<(), ValidationError>;
}

/// Applies the field's declared constraints in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintValidator;

impl FieldValidator for ConstraintValidator {
    fn validate(&self, field: &FieldSchema, value: &Value) -> Result<(), ValidationError> {
        field
            .constraints
            .iter()
            .try_for_each(|constraint| constraint.check(value))
    }
}
