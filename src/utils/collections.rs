//! Collection constructors shared across the crate.

use rustc_hash::FxHashMap;
use serde_json::Value;

/// Fresh attribute map for event attributes and extra-channel updates.
#[must_use]
pub fn new_attr_map() -> FxHashMap<String, Value> {
    FxHashMap::default()
}
