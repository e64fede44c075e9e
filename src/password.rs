//! This file defines types that handle password validation and hashing.
//! `ValidatedPassword` wraps a string and ensures it satisfies the password policy.
//! `PasswordHash` converts a `ValidatedPassword` into a salted and hashed password.

use std::{fmt::Display, sync::LazyLock};

use bcrypt::{BcryptError, hash, verify};

use crate::Error;

/// The fewest characters a password may have.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// bcrypt only looks at the first 72 bytes of its input, longer passwords are refused
/// rather than silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// A password that has been validated, but not yet hashed.
///
/// This struct can be used to construct a [PasswordHash].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Create and validate a new password from a string.
    ///
    /// # Errors
    ///
    /// This function will return [Error::InvalidPassword] if the password has fewer than
    /// [MIN_PASSWORD_CHARS] characters or more than [MAX_PASSWORD_BYTES] bytes.
    pub fn new(raw_password_string: &str) -> Result<Self, Error> {
        if raw_password_string.chars().count() < MIN_PASSWORD_CHARS {
            return Err(Error::InvalidPassword(format!(
                "password must be at least {MIN_PASSWORD_CHARS} characters long"
            )));
        }

        if raw_password_string.len() > MAX_PASSWORD_BYTES {
            return Err(Error::InvalidPassword(format!(
                "password must be at most {MAX_PASSWORD_BYTES} bytes long"
            )));
        }

        Ok(Self(raw_password_string.to_string()))
    }

    /// Create a new `ValidatedPassword` without any validation.
    ///
    /// The caller should ensure that `raw_password_string` satisfies the password policy.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if an invalid password is provided it may cause incorrect behaviour but will not affect memory safety.
    pub fn new_unchecked(raw_password_string: &str) -> Self {
        Self(raw_password_string.to_string())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// An alias for the default encryption cost for hashing passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Create a hashed password from a validated password with the specified `cost`.
    ///
    /// `cost` increases the rounds of hashing and therefore the time needed to verify a password.
    /// A value of at least 12 is recommended. Pass in [PasswordHash::DEFAULT_COST] to use the recommended cost.
    ///
    /// # Errors
    ///
    /// This function will return an error if the password could not be hashed.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        match hash(&password.0, cost) {
            Ok(password_hash) => Ok(Self(password_hash)),
            Err(e) => Err(Error::HashingError(e.to_string())),
        }
    }

    /// Create a new `PasswordHash` without any validation.
    ///
    /// The caller should ensure that `raw_password_hash` is a valid password hash.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_string())
    }

    /// Validate `raw_password` and hash it in one step.
    ///
    /// This function is used instead of `From<String>` or `FromStr` to make it a bit clearer that
    /// we are not parsing an existing password hash.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidPassword] if the password does not meet the policy, or
    /// [Error::HashingError] if hashing failed.
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, Error> {
        let validated_password = ValidatedPassword::new(raw_password)?;
        PasswordHash::new(validated_password, cost)
    }

    /// Check that `raw_password` matches the stored password.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }

    /// The hash in the modular crypt format used for storage.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

/// Checked in place of a real hash when a log-in names an unknown email, so that
/// the response takes as long as it would for a registered user.
static DUMMY_PASSWORD_HASH: LazyLock<Option<PasswordHash>> = LazyLock::new(|| {
    hash("not a real password", PasswordHash::DEFAULT_COST)
        .map(PasswordHash)
        .ok()
});

/// Validate and hash `raw_password` on the blocking thread pool.
///
/// # Errors
///
/// Returns [Error::InvalidPassword] if the password does not meet the policy, or
/// [Error::HashingError] if hashing failed.
pub async fn hash_password(raw_password: String, cost: u32) -> Result<PasswordHash, Error> {
    tokio::task::spawn_blocking(move || PasswordHash::from_raw_password(&raw_password, cost))
        .await
        .map_err(|error| Error::HashingError(error.to_string()))?
}

/// Check `raw_password` against `password_hash` on the blocking thread pool.
///
/// When `password_hash` is `None` a dummy hash is checked instead and the result
/// is always `false`.
///
/// # Errors
///
/// Returns [Error::HashingError] if the stored hash is malformed or the check could not run.
pub async fn verify_password(
    raw_password: String,
    password_hash: Option<PasswordHash>,
) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || match password_hash {
        Some(password_hash) => password_hash
            .verify(&raw_password)
            .map_err(|error| Error::HashingError(error.to_string())),
        None => {
            if let Some(dummy_hash) = DUMMY_PASSWORD_HASH.as_ref() {
                let _ = dummy_hash.verify(&raw_password);
            }
            Ok(false)
        }
    })
    .await
    .map_err(|error| Error::HashingError(error.to_string()))?
}
