//! Bearer session tokens and the sessions table that backs them.
//!
//! Only the SHA-256 digest of a token is stored, so a leaked database does not
//! leak usable credentials.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, rngs::OsRng};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

use crate::{Error, UserID, logging::SQL_LOG_TARGET};

/// The default lifetime of a session.
pub const DEFAULT_SESSION_DURATION: Duration = Duration::days(1);

/// An opaque credential handed to a client at log-in.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a new random token from 256 bits of OS randomness.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);

        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap a token presented by a client.
    pub fn from_bearer(token: &str) -> Self {
        Self(token.to_owned())
    }

    /// The token as sent to clients.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn digest(&self) -> Vec<u8> {
        Sha256::digest(self.0.as_bytes()).to_vec()
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(********)")
    }
}

/// Create the sessions table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_session_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS sessions (
                token_hash BLOB PRIMARY KEY,
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES users(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Start a new session for `user_id` lasting `duration`.
///
/// Expired sessions of every user are purged first, since abandoned tokens are
/// otherwise never presented again.
///
/// # Errors
///
/// Returns [Error::SqlError] if the session could not be stored, e.g. the user does not exist.
pub fn create_session(
    user_id: UserID,
    duration: Duration,
    connection: &Connection,
) -> Result<SessionToken, Error> {
    let token = SessionToken::generate();
    let now = OffsetDateTime::now_utc();

    delete_expired_sessions(now, connection)?;

    tracing::debug!(target: SQL_LOG_TARGET, "INSERT INTO sessions user_id={user_id}");
    connection.execute(
        "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
        VALUES (?1, ?2, ?3, ?4)",
        (token.digest(), &user_id, &now, &(now + duration)),
    )?;

    Ok(token)
}

/// Resolve `token` to the user it was issued to.
///
/// Sessions with less than half of `duration` remaining are extended to expire
/// `duration` after `now`. Expired sessions are deleted.
///
/// # Errors
///
/// Returns [Error::Unauthorized] if the token is unknown or has expired, or
/// [Error::SqlError] if the store could not be accessed.
pub fn validate_session(
    token: &SessionToken,
    duration: Duration,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<UserID, Error> {
    let digest = token.digest();

    tracing::debug!(target: SQL_LOG_TARGET, "SELECT FROM sessions WHERE token_hash=?");
    let session: Option<(UserID, OffsetDateTime)> = connection
        .query_row(
            "SELECT user_id, expires_at FROM sessions WHERE token_hash = ?1",
            (&digest,),
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((user_id, expires_at)) = session else {
        return Err(Error::Unauthorized);
    };

    if expires_at <= now {
        tracing::debug!("Session for user {user_id} expired at {expires_at}");
        delete_session(token, connection)?;
        return Err(Error::Unauthorized);
    }

    if expires_at - now < duration / 2 {
        tracing::debug!(target: SQL_LOG_TARGET, "UPDATE sessions SET expires_at user_id={user_id}");
        connection.execute(
            "UPDATE sessions SET expires_at = ?1 WHERE token_hash = ?2",
            (&(now + duration), &digest),
        )?;
    }

    Ok(user_id)
}

/// End the session for `token`. Does nothing if there is no such session.
///
/// # Errors
///
/// Returns [Error::SqlError] if the store could not be accessed.
pub fn delete_session(token: &SessionToken, connection: &Connection) -> Result<(), Error> {
    tracing::debug!(target: SQL_LOG_TARGET, "DELETE FROM sessions WHERE token_hash=?");
    connection.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        (token.digest(),),
    )?;

    Ok(())
}

/// Delete every session that expired at or before `now`.
///
/// # Errors
///
/// Returns [Error::SqlError] if the store could not be accessed.
pub fn delete_expired_sessions(
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<usize, Error> {
    tracing::debug!(target: SQL_LOG_TARGET, "DELETE FROM sessions WHERE expires_at <= {now}");
    let deleted = connection.execute("DELETE FROM sessions WHERE expires_at <= ?1", (&now,))?;

    Ok(deleted)
}

/// End every session belonging to `user_id` except the one for `keep`.
///
/// # Errors
///
/// Returns [Error::SqlError] if the store could not be accessed.
pub fn delete_other_sessions(
    user_id: UserID,
    keep: &SessionToken,
    connection: &Connection,
) -> Result<usize, Error> {
    tracing::debug!(target: SQL_LOG_TARGET, "DELETE FROM sessions WHERE user_id={user_id}");
    let deleted = connection.execute(
        "DELETE FROM sessions WHERE user_id = ?1 AND token_hash != ?2",
        (&user_id, keep.digest()),
    )?;

    Ok(deleted)
}

/// End every session belonging to `user_id`.
///
/// # Errors
///
/// Returns [Error::SqlError] if the store could not be accessed.
pub fn delete_user_sessions(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    tracing::debug!(target: SQL_LOG_TARGET, "DELETE FROM sessions WHERE user_id={user_id}");
    let deleted = connection.execute("DELETE FROM sessions WHERE user_id = ?1", (&user_id,))?;

    Ok(deleted)
}
