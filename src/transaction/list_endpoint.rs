//! Defines the endpoint for listing the logged in user's transactions.

use axum::{Extension, extract::State};

use crate::{
    Error, UserID, db,
    json::Json,
    transaction::{Transaction, TransactionState, core::list_transactions},
};

/// A route handler that returns every transaction of the logged in user, oldest first.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = db::lock(&state.db_connection)?;

    list_transactions(user_id, &connection).map(Json)
}
