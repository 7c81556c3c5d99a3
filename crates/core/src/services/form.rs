//! Form validation results.

use std::collections::BTreeMap;

use serde::Serialize;
use validator::ValidationErrors;

/// Message for a missing required field.
pub const REQUIRED_MESSAGE: &str = "Обязательное поле.";
/// Message for a choice that is not among the offered options.
pub const INVALID_CHOICE_MESSAGE: &str = "Выберите корректный вариант.";
/// Message for an upload that is not a usable image.
pub const INVALID_IMAGE_MESSAGE: &str = "Загрузите правильное изображение.";

/// Field-keyed validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    /// No errors yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Messages for one field.
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }

    /// Whether no field has an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All fields with errors, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = Self::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string);
                form_errors.add(&field, message);
            }
        }
        form_errors
    }
}

/// Outcome of a form submission.
#[derive(Debug, Clone)]
pub enum FormOutcome<T> {
    /// The submission was valid and stored.
    Saved(T),
    /// The submission was rejected; nothing was written.
    Invalid(FormErrors),
}

impl<T> FormOutcome<T> {
    /// The stored value, if the submission was valid.
    #[must_use]
    pub fn saved(self) -> Option<T> {
        match self {
            Self::Saved(value) => Some(value),
            Self::Invalid(_) => None,
        }
    }

    /// The validation errors, if the submission was rejected.
    #[must_use]
    pub const fn errors(&self) -> Option<&FormErrors> {
        match self {
            Self::Saved(_) => None,
            Self::Invalid(errors) => Some(errors),
        }
    }
}
