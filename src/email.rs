//! Email addresses used as log-in identifiers.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

/// An email address that has passed a basic plausibility check.
///
/// The address is stored exactly as given, so `Foo@Example.com` and
/// `foo@example.com` are different accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate `raw_email` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidEmail] if the address is empty, contains whitespace,
    /// or does not have exactly one `@` separating a non-empty local part and domain.
    pub fn new(raw_email: &str) -> Result<Self, Error> {
        if raw_email.is_empty() {
            return Err(Error::InvalidEmail("email cannot be empty".to_owned()));
        }

        if raw_email.chars().any(char::is_whitespace) {
            return Err(Error::InvalidEmail(format!(
                "\"{raw_email}\" must not contain whitespace"
            )));
        }

        match raw_email.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(raw_email.to_owned()))
            }
            _ => Err(Error::InvalidEmail(format!(
                "\"{raw_email}\" is not a valid email address"
            ))),
        }
    }

    /// Create an email without validation.
    ///
    /// The caller should ensure the string came from a trusted source such as
    /// the application's database.
    pub fn new_unchecked(raw_email: &str) -> Self {
        Self(raw_email.to_owned())
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for Email {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Email::new(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}
