mod config;
mod error;
mod rows;
mod store;

pub use config::PostgrestConfig;
pub use store::PostgrestStore;

use crate::dao::storage::StorageError;
use reqwest::StatusCode;

use self::error::PostgrestDaoError;

impl From<PostgrestDaoError> for StorageError {
    fn from(err: PostgrestDaoError) -> Self {
        match err {
            PostgrestDaoError::RequestStatus {
                status,
                ref body,
                ..
            } if status == StatusCode::CONFLICT => StorageError::conflict(body.clone()),
            PostgrestDaoError::NoRowsAffected { ref path } => {
                StorageError::missing(format!("no rows matched `{path}`"))
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
