//! Field-level validation errors
//!
//! Models validate their input structs before touching the database. Simple
//! string rules (length, email format) are declared with `validator` derives;
//! rules that depend on decimals, enumerations or presence are checked by hand
//! through [`FieldErrors`]. Both end up as [`ValidationErrorDetail`] values
//! carrying a full, human-readable message such as `"Name can't be blank"`.
//!
//! # Example
//!
//! ```
//! use pantry_shared::validation::FieldErrors;
//! use rust_decimal::Decimal;
//!
//! let mut errors = FieldErrors::new();
//! errors.require_present("name", "");
//! errors.non_negative("min_quantity", Some(Decimal::new(-1, 0)));
//!
//! let details = errors.into_result().unwrap_err();
//! assert_eq!(details[0].message, "Name can't be blank");
//! assert_eq!(details[1].message, "Min quantity must be greater than or equal to 0");
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

/// Field name for errors that concern a record as a whole
pub const BASE: &str = "base";

/// Exclusive upper bound of a `NUMERIC(10, 2)` column
pub const COLUMN_LIMIT: i64 = 100_000_000;

/// Decimal places kept by `NUMERIC(10, 2)` columns
pub const COLUMN_SCALE: u32 = 2;

/// A single failed validation rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Full message, already prefixed with the humanized field name
    pub message: String,
}

impl ValidationErrorDetail {
    /// Builds a detail whose message is `"<Field> <message>"`
    ///
    /// Errors on the pseudo-field `base` describe the whole record and keep
    /// the message unprefixed.
    pub fn new(field: &str, message: &str) -> Self {
        let message = if field == BASE {
            message.to_string()
        } else {
            format!("{} {}", humanize(field), message)
        };

        Self {
            field: field.to_string(),
            message,
        }
    }
}

/// Turns a snake_case field name into a sentence-case label
///
/// ```
/// use pantry_shared::validation::humanize;
///
/// assert_eq!(humanize("out_of_stock_threshold"), "Out of stock threshold");
/// assert_eq!(humanize("storage_id"), "Storage");
/// ```
pub fn humanize(field: &str) -> String {
    let base = field.strip_suffix("_id").unwrap_or(field);
    let spaced = base.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Accumulates validation failures for one input struct
#[derive(Debug, Default)]
pub struct FieldErrors {
    details: Vec<ValidationErrorDetail>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a failure with a message relative to the field name
    pub fn add(&mut self, field: &str, message: &str) {
        self.details.push(ValidationErrorDetail::new(field, message));
    }

    /// Folds in the output of a `validator` derive
    ///
    /// Field order in `ValidationErrors` is unspecified, so the merged
    /// details are sorted by field to keep responses stable.
    pub fn merge(&mut self, result: Result<(), ValidationErrors>) {
        let Err(errors) = result else {
            return;
        };

        let mut merged: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "is invalid".to_string());
                    ValidationErrorDetail::new(field, &message)
                })
            })
            .collect();
        merged.sort_by(|a, b| a.field.cmp(&b.field));
        self.details.extend(merged);
    }

    /// Fails when the value is empty or whitespace only
    pub fn require_present(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "can't be blank");
        }
    }

    /// Fails when a required reference or value is absent
    pub fn require_some<T>(&mut self, field: &str, value: &Option<T>, message: &str) {
        if value.is_none() {
            self.add(field, message);
        }
    }

    /// Fails when a present decimal is below zero or overflows the column
    ///
    /// Rules apply to the value as stored, rounded to [`COLUMN_SCALE`].
    pub fn non_negative(&mut self, field: &str, value: Option<Decimal>) {
        if let Some(value) = value.map(|v| v.round_dp(COLUMN_SCALE)) {
            if value < Decimal::ZERO {
                self.add(field, "must be greater than or equal to 0");
            } else {
                self.fits_column(field, value);
            }
        }
    }

    /// Fails when a present decimal is zero, negative or overflows the column
    /// once rounded to [`COLUMN_SCALE`]
    pub fn positive(&mut self, field: &str, value: Option<Decimal>) {
        if let Some(value) = value.map(|v| v.round_dp(COLUMN_SCALE)) {
            if value <= Decimal::ZERO {
                self.add(field, "must be greater than 0");
            } else {
                self.fits_column(field, value);
            }
        }
    }

    /// Fails when a present value is not one of `allowed`
    pub fn inclusion(&mut self, field: &str, value: Option<&str>, allowed: &[&str]) {
        if let Some(value) = value {
            if !allowed.contains(&value) {
                self.add(field, "is not included in the list");
            }
        }
    }

    fn fits_column(&mut self, field: &str, value: Decimal) {
        if value >= Decimal::from(COLUMN_LIMIT) {
            self.add(field, "must be less than 100000000");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    pub fn into_result(self) -> Result<(), Vec<ValidationErrorDetail>> {
        if self.details.is_empty() {
            Ok(())
        } else {
            Err(self.details)
        }
    }
}
