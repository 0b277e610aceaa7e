//! Content-based hashing for run IDs.

use mp_project::ScenarioConfig;
use sha2::{Digest, Sha256};

use crate::ResultsResult;

/// Run id: SHA-256 over the normalized scenario and the engine version.
///
/// Normalization is the serde JSON form, so defaults filled in at load time
/// hash the same as explicit values.
pub fn compute_run_id(config: &ScenarioConfig, engine_version: &str) -> ResultsResult<String> {
    let mut hasher = Sha256::new();

    let config_json = serde_json::to_string(config)?;
    hasher.update(config_json.as_bytes());

    hasher.update(engine_version.as_bytes());

    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}
