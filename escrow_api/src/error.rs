use thiserror::Error;

#[derive(Debug, Error)]
pub enum EscrowApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid request: {0}")]
    RequestError(String),
    #[error("Invalid response: {0}")]
    ResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The remote service reported an error: {0}")]
    RemoteError(String),
    #[error("The request did not complete within the deadline")]
    Timeout,
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
}
