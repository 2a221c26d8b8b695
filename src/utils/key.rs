use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;

use crate::constants::KEY_SEPARATOR;

/// Deterministic key for a tuple of names, e.g. `(host, app_id, cluster)`.
///
/// The URL-safe alphabet keeps the result usable as a file name.
pub(crate) fn create_key(parts: &[&str]) -> String {
    URL_SAFE.encode(parts.join(KEY_SEPARATOR))
}
