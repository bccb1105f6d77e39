use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Failure of a permission oracle query.
///
/// Never leaves the core: [`query_or_deny`](crate::permission::query_or_deny)
/// turns every variant into "not granted".
#[derive(Debug, ThisError)]
pub enum OracleError {
    #[error("Permission Query Error: {message} {location}")]
    Query {
        message: String,
        location: ErrorLocation,
    },
}
