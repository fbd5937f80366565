//! Reading endpoint lists and writing results

use crate::error::SiftError;
use crate::proxy::models::Endpoint;
use std::fs;
use std::path::Path;

/// Load one endpoint per line. Lines are trimmed and blank lines skipped;
/// nothing else is validated or deduplicated.
pub fn load_endpoints<P: AsRef<Path>>(path: P) -> Result<Vec<Endpoint>, SiftError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| SiftError::load(path, e))?;
    Ok(parse_endpoints(&content))
}

pub fn parse_endpoints(content: &str) -> Vec<Endpoint> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Endpoint::from)
        .collect()
}

/// Write endpoints one per line with a trailing newline (merged input lists)
pub fn save_endpoints<P: AsRef<Path>>(endpoints: &[Endpoint], path: P) -> Result<(), SiftError> {
    let path = path.as_ref();
    let mut content = String::new();
    for endpoint in endpoints {
        content.push_str(endpoint.as_str());
        content.push('\n');
    }
    fs::write(path, content).map_err(|e| SiftError::persist(path, e))
}

/// Overwrite `path` with the reachable endpoints joined by newlines
pub fn save_results<P: AsRef<Path>>(good: &[Endpoint], path: P) -> Result<(), SiftError> {
    let path = path.as_ref();
    let content = good
        .iter()
        .map(Endpoint::as_str)
        .collect::<Vec<_>>()
        .join("\n");
    fs::write(path, content).map_err(|e| SiftError::persist(path, e))
}
