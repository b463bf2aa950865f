use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    /// The filter document is not a JSON object.
    #[error("Invalid filter: {0}")]
    InvalidWhereClause(String),

    /// An operator was given a value it cannot compare against.
    #[error("Invalid operator value: {0}")]
    InvalidOperatorData(String),
}
