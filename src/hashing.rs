//! Badge Digests
//!
//! Re-exporting the same attendees with the same layout and templates must
//! produce identical PNGs. Each archive entry records its SHA-256 so two
//! runs can be compared entry by entry, and the manifest records a digest
//! of itself and of the layout that drove the run.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::layout::LayoutConfig;

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Compact JSON with object keys sorted at every depth.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(&with_sorted_keys(serde_json::to_value(value)?))
}

fn with_sorted_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<(String, Value)> = map.into_iter().collect();
            pairs.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
            let sorted: Map<String, Value> = pairs
                .into_iter()
                .map(|(key, inner)| (key, with_sorted_keys(inner)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(with_sorted_keys).collect()),
        scalar => scalar,
    }
}

/// Digest of an export manifest, taken before `manifest_hash` is filled in.
pub fn compute_manifest_hash<T: Serialize>(manifest: &T) -> Result<String, serde_json::Error> {
    canonical_json(manifest).map(|json| sha256_hex(json.as_bytes()))
}

/// Hash of a layout in draw order.
///
/// Not canonicalized: reordering entries changes z-order, so it must change
/// the hash too.
pub fn layout_hash(layout: &LayoutConfig) -> Result<String, serde_json::Error> {
    let fields: Vec<Value> = layout
        .iter()
        .map(|(field, entry)| {
            let entry = canonical_json(entry)?;
            Ok(serde_json::json!([field, entry]))
        })
        .collect::<Result<_, serde_json::Error>>()?;
    Ok(sha256_hex(serde_json::to_string(&fields)?.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": {"b": 1, "a": 2}});
        assert_eq!(canonical_json(&obj).unwrap(), r#"{"a":2,"m":{"a":2,"b":1},"z":1}"#);
    }

    #[test]
    fn test_canonical_json_sorts_inside_arrays() {
        let obj = json!([{"b": 1, "a": [{"d": 0, "c": 0}]}]);
        assert_eq!(canonical_json(&obj).unwrap(), r#"[{"a":[{"c":0,"d":0}],"b":1}]"#);
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_layout_hash_tracks_order() {
        let a = LayoutConfig::from_json_str(
            r#"{"f": {"x":1,"y":1,"w":1,"h":1,"fontsize":1,"fontfamily":"A"},
                "l": {"x":2,"y":2,"w":2,"h":2,"fontsize":2,"fontfamily":"A"}}"#,
        )
        .unwrap();
        let b = LayoutConfig::from_json_str(
            r#"{"l": {"x":2,"y":2,"w":2,"h":2,"fontsize":2,"fontfamily":"A"},
                "f": {"x":1,"y":1,"w":1,"h":1,"fontsize":1,"fontfamily":"A"}}"#,
        )
        .unwrap();
        assert_eq!(layout_hash(&a).unwrap(), layout_hash(&a.clone()).unwrap());
        assert_ne!(layout_hash(&a).unwrap(), layout_hash(&b).unwrap());
    }
}
