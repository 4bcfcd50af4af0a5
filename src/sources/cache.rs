use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::TARGET_WEB_REQUEST;

/// Cached API responses older than this are refetched.
pub const MAX_CACHE_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Load a cached value if the file exists, parses, and is fresh.
/// Stale or corrupt cache entries are treated as misses.
pub fn load_fresh<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let metadata = fs::metadata(path).ok()?;
    let age = metadata.modified().ok()?.elapsed().ok()?;
    if age > MAX_CACHE_AGE {
        debug!(target: TARGET_WEB_REQUEST, "Cache expired: {}", path.display());
        return None;
    }

    let body = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&body) {
        Ok(value) => {
            debug!(target: TARGET_WEB_REQUEST, "Cache hit: {}", path.display());
            Some(value)
        }
        Err(err) => {
            warn!(
                target: TARGET_WEB_REQUEST,
                "Discarding unreadable cache file {}: {}", path.display(), err
            );
            None
        }
    }
}

/// Persist a value to the cache. Failure to write is logged and ignored;
/// the cache is an optimization, not a requirement.
pub fn store<T: Serialize>(path: &Path, value: &T) {
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            warn!(
                target: TARGET_WEB_REQUEST,
                "Failed to create cache directory {}: {}", parent.display(), err
            );
            return;
        }
    }
    match serde_json::to_string(value) {
        Ok(body) => {
            if let Err(err) = fs::write(path, body) {
                warn!(
                    target: TARGET_WEB_REQUEST,
                    "Failed to write cache file {}: {}", path.display(), err
                );
            }
        }
        Err(err) => {
            warn!(target: TARGET_WEB_REQUEST, "Failed to serialize cache value: {}", err);
        }
    }
}
