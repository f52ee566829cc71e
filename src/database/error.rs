use thiserror::Error;

use super::handle::HandleState;

/// Errors from the connection cache and the handles it hands out
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The tenant's database host could not be reached or refused the login
    #[error("Connection to {host} failed: {source}")]
    Connection {
        host: String,
        #[source]
        source: sqlx::Error,
    },

    /// A query was attempted on a handle that is not initialized
    #[error("Handle for {host} is {state:?}")]
    InvalidState { host: String, state: HandleState },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
