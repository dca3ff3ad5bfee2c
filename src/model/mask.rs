//! Encoded masks as they travel over the wire.

use serde::{Deserialize, Serialize};

/// Payload of the `counts` field.
///
/// The backend is not consistent about what this holds: usually Base64 of
/// the raw mask bytes, sometimes a run-length string, sometimes a plain
/// array. The codec sorts out which one it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaskCounts {
    Encoded(String),
    Values(Vec<f64>),
}

impl MaskCounts {
    pub fn is_empty(&self) -> bool {
        match self {
            MaskCounts::Encoded(s) => s.trim().is_empty(),
            MaskCounts::Values(v) => v.is_empty(),
        }
    }

    /// Length of the encoded payload (characters or array entries).
    pub fn len(&self) -> usize {
        match self {
            MaskCounts::Encoded(s) => s.len(),
            MaskCounts::Values(v) => v.len(),
        }
    }
}

impl Default for MaskCounts {
    fn default() -> Self {
        MaskCounts::Encoded(String::new())
    }
}

/// An encoded mask: `size` is `[height, width]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskData {
    pub size: [u32; 2],
    #[serde(default)]
    pub counts: MaskCounts,
}

impl MaskData {
    pub fn new(height: u32, width: u32, counts: MaskCounts) -> Self {
        Self {
            size: [height, width],
            counts,
        }
    }

    pub fn height(&self) -> u32 {
        self.size[0]
    }

    pub fn width(&self) -> u32 {
        self.size[1]
    }

    /// A mask whose payload is empty carries no pixels worth decoding.
    pub fn has_payload(&self) -> bool {
        !self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_counts() {
        let m: MaskData = serde_json::from_str(r#"{"size":[2,3],"counts":"AAAA"}"#).unwrap();
        assert_eq!((m.height(), m.width()), (2, 3));
        assert_eq!(m.counts, MaskCounts::Encoded("AAAA".into()));
    }

    #[test]
    fn test_parse_array_counts() {
        let m: MaskData = serde_json::from_str(r#"{"size":[1,2],"counts":[0,255]}"#).unwrap();
        assert_eq!(m.counts, MaskCounts::Values(vec![0.0, 255.0]));
    }

    #[test]
    fn test_missing_counts_is_empty() {
        let m: MaskData = serde_json::from_str(r#"{"size":[4,4]}"#).unwrap();
        assert!(!m.has_payload());
    }

    #[test]
    fn test_serialize_keeps_shape() {
        let m = MaskData::new(5, 7, MaskCounts::Encoded("abc=".into()));
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["size"], serde_json::json!([5, 7]));
        assert_eq!(json["counts"], "abc=");
    }
}
