//! Content-derived document identity.

use farmline_template::{Template, TemplateView};
use sha2::{Digest, Sha256};

/// Length of the hex prefix used for hash-derived identities.
const HASH_SID_LEN: usize = 32;

/// Compute a document's sid.
///
/// The pipeline's sid template is rendered against the merged view; a
/// non-empty result is the base identity. Otherwise the base is a SHA-256
/// over the row's non-empty raw values (in column order) plus the perspective
/// code, rendered as a fixed-length lowercase hex prefix. The collection name
/// is appended either way.
///
/// Pure and stable across runs: the same row in the same collection always
/// produces the same sid, and two perspectives of one row produce distinct
/// sids because the perspective feeds the hash.
pub fn compute_sid(
    view: &dyn TemplateView,
    sid_template: Option<&Template>,
    raw_values: &[String],
    perspective: &str,
    collection: &str,
) -> String {
    let base = sid_template
        .map(|t| t.render(view))
        .filter(|rendered| !rendered.is_empty())
        .unwrap_or_else(|| hash_identity(raw_values, perspective));

    format!("{}_{}", base, collection)
}

/// Hash the non-empty raw row values plus the perspective code.
fn hash_identity(raw_values: &[String], perspective: &str) -> String {
    let mut hasher = Sha256::new();
    for value in raw_values.iter().filter(|v| !v.is_empty()) {
        hasher.update(value.as_bytes());
    }
    hasher.update(perspective.as_bytes());

    let mut hex = hex::encode(hasher.finalize());
    hex.truncate(HASH_SID_LEN);
    hex
}
