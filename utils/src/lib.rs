//! # Platform Utilities
//!
//! Small pure helpers shared by the platform packages: case conversion,
//! template interpolation, JSON object merging, array helpers and
//! emptiness checks.
//!
//! Nothing in this crate holds state or performs I/O.

pub mod array;
pub mod check;
pub mod object;
pub mod string;

pub use array::{chunk, compact, difference, intersection, unique};
pub use check::{ValueType, is_blank, is_empty_value, value_type};
pub use object::{deep_merge, deep_merge_all, flatten_keys, get_path, omit, pick};
pub use string::{
    capitalize, interpolate, mask, placeholders, slugify, to_camel_case, to_kebab_case,
    to_pascal_case, to_snake_case, truncate,
};

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Compute SHA-256 hash of content string
///
/// # Examples
///
/// ```
/// use utils::compute_content_hash;
///
/// let hash = compute_content_hash("hello world");
/// assert_eq!(hash.len(), 64);
/// ```
#[must_use]
pub fn compute_content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate UUID v4 string
#[must_use]
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}
