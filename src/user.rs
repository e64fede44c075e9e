//! Code for creating the users table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Email, Error, PasswordHash, logging::SQL_LOG_TARGET};

/// A newtype wrapper for user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(Uuid);

impl UserID {
    /// Create a new, random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserID {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for UserID {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for UserID {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Uuid::parse_str(value.as_str()?)
            .map(Self)
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A registered user of the application.
///
/// The password hash is never serialized, so a `User` is safe to send to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The address the user logs in with.
    pub email: Email,
    /// The user's password hash.
    #[serde(skip_serializing)]
    pub password_hash: PasswordHash,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the user's email or password was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The current time truncated to whole seconds, matching what is shown to clients.
pub(crate) fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(0).unwrap_or(now)
}

/// Create the users table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a [Error::DuplicateEmail] if `email` is already registered, or
/// [Error::SqlError] if another SQL related error occurred.
pub fn create_user(
    email: Email,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let now = now_utc();
    let user = User {
        id: UserID::new(),
        email,
        password_hash,
        created_at: now,
        updated_at: now,
    };

    tracing::debug!(target: SQL_LOG_TARGET, "INSERT INTO users id={}", user.id);
    connection.execute(
        "INSERT INTO users (id, email, password, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &user.id,
            user.email.as_str(),
            user.password_hash.as_str(),
            &user.created_at,
            &user.updated_at,
        ),
    )?;

    Ok(user)
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_email: String = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: row.get(0)?,
        email: Email::new_unchecked(&raw_email),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    tracing::debug!(target: SQL_LOG_TARGET, "SELECT FROM users WHERE id={user_id}");
    connection
        .prepare(
            "SELECT id, email, password, created_at, updated_at FROM users WHERE id = :id",
        )?
        .query_row(&[(":id", &user_id)], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user registered with exactly `email`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has that email, or [Error::SqlError] if
/// there was an error trying to access the store.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    tracing::debug!(target: SQL_LOG_TARGET, "SELECT FROM users WHERE email=?");
    connection
        .prepare(
            "SELECT id, email, password, created_at, updated_at FROM users WHERE email = :email",
        )?
        .query_row(&[(":email", email)], map_user_row)
        .map_err(|error| error.into())
}

/// Change the email of the user with `user_id` and return the updated user.
///
/// # Errors
///
/// Returns [Error::DuplicateEmail] if another user already has `email`,
/// [Error::NotFound] if the user does not exist, or [Error::SqlError] for other SQL errors.
pub fn update_email(user_id: UserID, email: &Email, connection: &Connection) -> Result<User, Error> {
    tracing::debug!(target: SQL_LOG_TARGET, "UPDATE users SET email WHERE id={user_id}");
    let rows_affected = connection.execute(
        "UPDATE users SET email = ?1, updated_at = ?2 WHERE id = ?3",
        (email.as_str(), &now_utc(), &user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_user_by_id(user_id, connection)
}

/// Replace the password hash of the user with `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist, or [Error::SqlError] for other SQL errors.
pub fn update_password_hash(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    tracing::debug!(target: SQL_LOG_TARGET, "UPDATE users SET password WHERE id={user_id}");
    let rows_affected = connection.execute(
        "UPDATE users SET password = ?1, updated_at = ?2 WHERE id = ?3",
        (password_hash.as_str(), &now_utc(), &user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
