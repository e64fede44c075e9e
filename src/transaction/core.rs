//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, UserID, logging::SQL_LOG_TARGET};

// ============================================================================
// MODELS
// ============================================================================

/// A newtype wrapper for transaction IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Create a new, random transaction ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for TransactionId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for TransactionId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Uuid::parse_str(value.as_str()?)
            .map(Self)
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserID,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned in this transaction.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// What kind of transaction this is, usually "income" or "expense".
    #[serde(rename = "type")]
    pub kind: String,
}

/// The client supplied fields of a transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewTransaction {
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned.
    ///
    /// Accepts a JSON number or a numeric string.
    pub amount: Decimal,
    /// What kind of transaction this is. Any string is accepted.
    #[serde(rename = "type")]
    pub kind: String,
}

impl NewTransaction {
    /// Shortcut for building a transaction in code.
    pub fn new(description: &str, amount: Decimal, kind: &str) -> Self {
        Self {
            description: description.to_owned(),
            amount,
            kind: kind.to_owned(),
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transactions table and its index on the owning user.
///
/// # Errors
/// Returns an error if the table could not be created.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                description TEXT NOT NULL,
                amount TEXT NOT NULL,
                type TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES users(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_user_id ON transactions(user_id)",
        (),
    )?;

    Ok(())
}

/// Store `transaction` as belonging to `user_id` and return the stored row.
///
/// The amount is stored as text so that it reads back exactly as it was written.
///
/// # Errors
/// Returns [Error::SqlError] if the insert failed, e.g. `user_id` does not refer to a user.
pub fn create_transaction(
    transaction: NewTransaction,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = Transaction {
        id: TransactionId::new(),
        user_id,
        description: transaction.description,
        amount: transaction.amount,
        kind: transaction.kind,
    };

    tracing::debug!(target: SQL_LOG_TARGET, "INSERT INTO transactions id={} user_id={user_id}", transaction.id);
    connection.execute(
        "INSERT INTO transactions (id, user_id, description, amount, type)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &transaction.id,
            &transaction.user_id,
            &transaction.description,
            transaction.amount.to_string(),
            &transaction.kind,
        ),
    )?;

    Ok(transaction)
}

/// Get every transaction belonging to `user_id` in the order they were created.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn list_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    tracing::debug!(target: SQL_LOG_TARGET, "SELECT FROM transactions WHERE user_id={user_id}");
    connection
        .prepare(
            "SELECT id, user_id, description, amount, type FROM transactions
            WHERE user_id = :user_id ORDER BY rowid ASC",
        )?
        .query_map(&[(":user_id", &user_id)], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Map a database row to a [Transaction].
///
/// Expects the columns `id, user_id, description, amount, type` in that order.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_amount: String = row.get(3)?;
    let amount = Decimal::from_str(&raw_amount)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(error)))?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        description: row.get(2)?,
        amount,
        kind: row.get(4)?,
    })
}
