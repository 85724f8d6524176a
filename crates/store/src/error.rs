//! Errors from the job record store (spec §4.1 "Job Record Store").

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no job run with id {0}")]
    NotFound(String),
}
