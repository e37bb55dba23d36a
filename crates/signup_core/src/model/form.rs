//! Sign-up submission draft.
//!
//! # Invariants
//! - `Debug` never renders the secret.
//! - Required fields are `name`, `email` and `secret`; `extra` is optional.

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Input fields of the sign-up form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Name,
    Email,
    Secret,
    Extra,
}

impl FormField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Secret => "password",
            Self::Extra => "extra",
        }
    }
}

/// Submission rejected before any record is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required fields that were empty or whitespace-only.
    MissingField(Vec<FormField>),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(fields) => {
                let labels = fields
                    .iter()
                    .map(|field| field.label())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "missing required field(s): {labels}")
            }
        }
    }
}

impl Error for ValidationError {}

/// Values entered by the submitter.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub secret: String,
    pub extra: String,
}

impl SignupForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        secret: impl Into<String>,
        extra: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            secret: secret.into(),
            extra: extra.into(),
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Name => self.name = value,
            FormField::Email => self.email = value,
            FormField::Secret => self.secret = value,
            FormField::Extra => self.extra = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.email.is_empty()
            && self.secret.is_empty()
            && self.extra.is_empty()
    }

    /// Checks that every required field has non-whitespace content.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing = [
            (FormField::Name, self.name.as_str()),
            (FormField::Email, self.email.as_str()),
            (FormField::Secret, self.secret.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingField(missing))
        }
    }
}

impl Debug for SignupForm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("secret", &"<redacted>")
            .field("extra", &self.extra)
            .finish()
    }
}
