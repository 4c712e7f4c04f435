//! Loading of the Jest results file.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::Result;
use crate::model::Results;

/// File name Jest is asked to write its results to, inside the working
/// directory.
pub const RESULTS_FILE: &str = "jest.results.json";

/// Parse results from raw bytes.
pub fn parse(input: &[u8]) -> Result<Results> {
    Ok(serde_json::from_slice(input)?)
}

/// Read and parse a results file.
///
/// Any failure (missing file, invalid UTF-8, malformed JSON, wrong shape) is
/// logged and turned into `None`; callers treat that as "nothing to report".
pub fn load(path: &Path) -> Option<Results> {
    let content = match std::fs::read(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Could not read test results from {}: {e}", path.display());
            return None;
        }
    };
    match parse(&content) {
        Ok(results) => {
            debug!(
                "Loaded {} suites from {}",
                results.test_results.len(),
                path.display()
            );
            Some(results)
        }
        Err(e) => {
            warn!("Could not parse test results in {}: {e}", path.display());
            None
        }
    }
}
