//! mp-results: trajectory output (CSV) and run manifests.

pub mod csv;
pub mod hash;
pub mod store;
pub mod types;

pub use csv::{write_csv, write_csv_to};
pub use hash::compute_run_id;
pub use store::{OutputSink, load_manifest, manifest_path_for};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
