//! Declarative field-rule validation for request bodies.
//!
//! A [`Schema`] is a list of [`Rule`]s over a typed input `T`. Every rule is
//! evaluated, so a single call reports all failing fields at once.
//!
//! ```rust,ignore
//! let schema = Schema::new()
//!   .rule(Rule::new("name", body_name, Check::NotEmpty, "Name is required"));
//! schema.validate(&body)?;
//! ```

use std::fmt;

use serde::Serialize;

// ─── Errors ───────────────────────────────────────────────────────────────────

/// Where a failing value was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
  Body,
}

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:    String,
  pub message:  String,
  pub location: Location,
}

impl FieldError {
  pub fn body(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      field:    field.into(),
      message:  message.into(),
      location: Location::Body,
    }
  }
}

/// The non-empty list of failures produced by [`Schema::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "validation failed on {}", self.fields().join(", "))
  }
}

impl std::error::Error for ValidationErrors {}

impl From<FieldError> for ValidationErrors {
  fn from(e: FieldError) -> Self { Self(vec![e]) }
}

impl ValidationErrors {
  pub fn errors(&self) -> &[FieldError] { &self.0 }

  pub fn into_errors(self) -> Vec<FieldError> { self.0 }

  /// Names of the failing fields, in rule order, without duplicates.
  pub fn fields(&self) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for e in &self.0 {
      if !out.contains(&e.field.as_str()) {
        out.push(&e.field);
      }
    }
    out
  }

  pub fn has_field(&self, field: &str) -> bool {
    self.0.iter().any(|e| e.field == field)
  }
}

// ─── Checks ───────────────────────────────────────────────────────────────────

/// A predicate applied to one optional string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
  /// Present and not blank once surrounding whitespace is trimmed.
  NotEmpty,
  /// At most `n` characters. Absent values pass.
  MaxLength(usize),
}

impl Check {
  fn passes(self, value: Option<&str>) -> bool {
    match self {
      Check::NotEmpty => value.is_some_and(|v| !v.trim().is_empty()),
      Check::MaxLength(n) => value.is_none_or(|v| v.chars().count() <= n),
    }
  }
}

// ─── Schema ───────────────────────────────────────────────────────────────────

/// A single declared constraint on a field of `T`.
pub struct Rule<T> {
  field:   &'static str,
  get:     fn(&T) -> Option<&str>,
  check:   Check,
  message: &'static str,
}

impl<T> Rule<T> {
  pub fn new(
    field: &'static str,
    get: fn(&T) -> Option<&str>,
    check: Check,
    message: &'static str,
  ) -> Self {
    Self { field, get, check, message }
  }
}

/// An ordered set of rules for one kind of request body.
pub struct Schema<T> {
  rules: Vec<Rule<T>>,
}

impl<T> Default for Schema<T> {
  fn default() -> Self { Self { rules: Vec::new() } }
}

impl<T> Schema<T> {
  pub fn new() -> Self { Self::default() }

  pub fn rule(mut self, rule: Rule<T>) -> Self {
    self.rules.push(rule);
    self
  }

  /// Evaluate every rule against `input`.
  pub fn validate(&self, input: &T) -> Result<(), ValidationErrors> {
    let errors: Vec<FieldError> = self
      .rules
      .iter()
      .filter(|r| !r.check.passes((r.get)(input)))
      .map(|r| FieldError::body(r.field, r.message))
      .collect();

    if errors.is_empty() {
      Ok(())
    } else {
      Err(ValidationErrors(errors))
    }
  }
}
