//! Mask decoding and synthesis.
//!
//! The `counts` field of a mask is not self-describing, so decoding tries
//! each known encoding in turn:
//!
//! 1. **Base64 raw buffer**: one byte per pixel, row-major.
//! 2. **Run lengths**: whitespace- or comma-separated counts alternating
//!    background/foreground, starting with background.
//! 3. **Numeric array**: byte values given directly.
//!
//! [`decode`] never fails. A payload that matches none of the above is
//! logged and replaced with an all-background buffer of the declared size,
//! so one broken mask never stops the rest of the overlay from drawing.

mod error;

use base64::Engine;
use base64::alphabet;
use base64::engine::DecodePaddingMode;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use labelseg_raster::MaskLayer;

pub use error::DecodeError;

use crate::model::{BoundingBox, ImageSize, MaskCounts, MaskData};

/// Byte written for foreground pixels by this module.
pub const MASK_FOREGROUND: u8 = 1;

/// A dense per-pixel mask, row-major, `width * height` bytes.
///
/// Any non-zero byte is foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl DecodedMask {
    /// All-background mask.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// Value at `(x, y)`, or `None` outside the mask.
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.get(x, y).is_some_and(|v| v > 0)
    }

    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v > 0).count()
    }

    /// Tight box around the foreground, with exclusive right/bottom edges.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let width = self.width as usize;
        if width == 0 {
            return None;
        }
        let mut min = (usize::MAX, usize::MAX);
        let mut max = (0usize, 0usize);
        let mut any = false;
        for (i, _) in self.data.iter().enumerate().filter(|(_, v)| **v > 0) {
            let (x, y) = (i % width, i / width);
            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x), max.1.max(y));
            any = true;
        }
        any.then(|| {
            BoundingBox::new(
                min.0 as f32,
                min.1 as f32,
                (max.0 + 1) as f32,
                (max.1 + 1) as f32,
            )
        })
    }

    /// Borrow as a drawable layer.
    pub fn as_layer(&self) -> MaskLayer<'_> {
        MaskLayer {
            width: self.width,
            height: self.height,
            coverage: &self.data,
        }
    }
}

/// Decode a mask, trying every known encoding.
pub fn try_decode(mask: &MaskData) -> Result<DecodedMask, DecodeError> {
    let (width, height) = (mask.width(), mask.height());
    let len = ImageSize::new(width, height).pixel_count();

    let data = match &mask.counts {
        MaskCounts::Encoded(text) => match decode_base64(text) {
            Some(bytes) => fit_to_length(bytes, len),
            None => decode_runs(text, len)?,
        },
        MaskCounts::Values(values) => decode_values(values, len)?,
    };

    Ok(DecodedMask {
        width,
        height,
        data,
    })
}

/// Decode a mask, falling back to an all-background buffer on failure.
pub fn decode(mask: &MaskData) -> DecodedMask {
    try_decode(mask).unwrap_or_else(|e| {
        log::warn!(
            "Mask decode failed for {}x{} mask ({} payload units): {}",
            mask.width(),
            mask.height(),
            mask.counts.len(),
            e
        );
        DecodedMask::empty(mask.width(), mask.height())
    })
}

/// Encode a dense mask as Base64 of its raw bytes.
pub fn encode_raw(mask: &DecodedMask) -> MaskData {
    MaskData::new(
        mask.height,
        mask.width,
        MaskCounts::Encoded(STANDARD.encode(&mask.data)),
    )
}

/// Build a solid rectangular mask for a box that came without one.
///
/// Pixel `(x, y)` is foreground when `floor(x1) <= x < ceil(x2)` and
/// likewise for `y`, after clipping the box to the image.
pub fn synthesize_from_bbox(bbox: &BoundingBox, image: ImageSize) -> MaskData {
    let mut mask = DecodedMask::empty(image.width, image.height);
    let clipped = bbox.clipped_to(image);

    let x_start = clipped.x1.floor() as usize;
    let x_end = (clipped.x2.ceil() as usize).min(image.width as usize);
    let y_start = clipped.y1.floor() as usize;
    let y_end = (clipped.y2.ceil() as usize).min(image.height as usize);

    if x_start < x_end {
        let width = image.width as usize;
        for row in mask.data.chunks_exact_mut(width).take(y_end).skip(y_start) {
            row[x_start..x_end].fill(MASK_FOREGROUND);
        }
    }

    log::debug!(
        "Synthesized {}x{} mask from box [{}, {}, {}, {}]",
        image.width,
        image.height,
        clipped.x1,
        clipped.y1,
        clipped.x2,
        clipped.y2
    );
    encode_raw(&mask)
}

/// Standard alphabet, padding optional.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Text made only of digits, commas and whitespace could be run lengths.
fn looks_like_runs(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_ascii_digit() || c.is_whitespace() || c == ',')
}

fn decode_base64(text: &str) -> Option<Vec<u8>> {
    let text = text.trim();
    if looks_like_runs(text) {
        // Strict here, or "10 20 30 40" would join into valid Base64
        return STANDARD.decode(text).ok();
    }
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    LENIENT.decode(compact).ok()
}

/// Truncate or zero-pad to exactly `len` bytes.
fn fit_to_length(mut bytes: Vec<u8>, len: usize) -> Vec<u8> {
    bytes.resize(len, 0);
    bytes
}

fn decode_runs(text: &str, len: usize) -> Result<Vec<u8>, DecodeError> {
    let runs = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<usize>().map_err(|_| DecodeError::InvalidRun {
                token: t.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut data = Vec::with_capacity(len);
    let mut value = 0u8;
    let mut last_emitted = 0u8;
    for run in runs {
        let remaining = len - data.len();
        if remaining == 0 {
            break;
        }
        let count = run.min(remaining);
        if count > 0 {
            data.resize(data.len() + count, value);
            last_emitted = value;
        }
        value = 1 - value;
    }
    data.resize(len, last_emitted);
    Ok(data)
}

fn decode_values(values: &[f64], len: usize) -> Result<Vec<u8>, DecodeError> {
    let bytes = values
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            if value.is_finite() {
                Ok(value.round().clamp(0.0, 255.0) as u8)
            } else {
                Err(DecodeError::InvalidValue { index, value })
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(fit_to_length(bytes, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(height: u32, width: u32, counts: &str) -> MaskData {
        MaskData::new(height, width, MaskCounts::Encoded(counts.to_string()))
    }

    #[test]
    fn test_base64_exact_bytes() {
        let raw: Vec<u8> = (0..12).map(|i| (i * 20) as u8).collect();
        let mask = encoded(3, 4, &STANDARD.encode(&raw));
        let decoded = try_decode(&mask).unwrap();
        assert_eq!(decoded.data, raw);
        assert_eq!((decoded.width, decoded.height), (4, 3));
    }

    #[test]
    fn test_base64_short_is_zero_padded() {
        let mask = encoded(2, 2, &STANDARD.encode([255u8, 255]));
        assert_eq!(decode(&mask).data, vec![255, 255, 0, 0]);
    }

    #[test]
    fn test_base64_long_is_truncated() {
        let mask = encoded(1, 2, &STANDARD.encode([1u8, 2, 3, 4, 5]));
        assert_eq!(decode(&mask).data, vec![1, 2]);
    }

    #[test]
    fn test_base64_line_wrapped() {
        let raw: Vec<u8> = (0..60).collect();
        let text = STANDARD.encode(&raw);
        let wrapped = format!("{}\n{}\r\n{}", &text[..40], &text[40..76], &text[76..]);
        assert_eq!(try_decode(&encoded(6, 10, &wrapped)).unwrap().data, raw);
    }

    #[test]
    fn test_base64_unpadded() {
        let text = STANDARD.encode([7u8, 8, 9, 10]);
        let unpadded = text.trim_end_matches('=');
        assert_ne!(unpadded, text);
        assert_eq!(decode(&encoded(2, 2, unpadded)).data, vec![7, 8, 9, 10]);
    }

    #[test]
    fn test_spaced_digit_runs_are_not_joined_into_base64() {
        // "1020 3040" would be valid Base64 with the space removed
        let mask = encoded(1, 10, "1 2 3 4");
        assert_eq!(decode(&mask).data, vec![0, 1, 1, 0, 0, 0, 1, 1, 1, 1]);
    }

    #[test]
    fn test_rle_space_separated() {
        // 3 background, 2 foreground, 1 background
        let decoded = try_decode(&encoded(2, 3, "3 2 1")).unwrap();
        assert_eq!(decoded.data, vec![0, 0, 0, 1, 1, 0]);
        assert_eq!(decoded.foreground_count(), 2);
    }

    #[test]
    fn test_rle_comma_separated() {
        let decoded = try_decode(&encoded(1, 5, "1,3,1")).unwrap();
        assert_eq!(decoded.data, vec![0, 1, 1, 1, 0]);
    }

    #[test]
    fn test_rle_foreground_matches_odd_runs() {
        let runs = [17usize, 4, 9, 30, 2, 1, 37];
        let total: usize = runs.iter().sum();
        let text = runs.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(" ");
        let decoded = try_decode(&encoded(1, total as u32, &text)).unwrap();
        let expected: usize = runs.iter().skip(1).step_by(2).sum();
        assert_eq!(decoded.data.len(), total);
        assert_eq!(decoded.foreground_count(), expected);
    }

    #[test]
    fn test_rle_short_runs_extend_last_value() {
        let decoded = try_decode(&encoded(1, 6, "2 2")).unwrap();
        assert_eq!(decoded.data, vec![0, 0, 1, 1, 1, 1]);
    }

    #[test]
    fn test_rle_overlong_runs_are_cut() {
        let decoded = try_decode(&encoded(1, 4, "1 100 5")).unwrap();
        assert_eq!(decoded.data, vec![0, 1, 1, 1]);
    }

    #[test]
    fn test_numeric_array() {
        let mask = MaskData::new(1, 4, MaskCounts::Values(vec![0.0, 1.0, 300.0, -4.0]));
        assert_eq!(try_decode(&mask).unwrap().data, vec![0, 1, 255, 0]);
    }

    #[test]
    fn test_array_with_nan_falls_back() {
        let mask = MaskData::new(1, 3, MaskCounts::Values(vec![1.0, f64::NAN]));
        assert!(try_decode(&mask).is_err());
        assert_eq!(decode(&mask).data, vec![0, 0, 0]);
    }

    #[test]
    fn test_garbage_never_fails() {
        for counts in ["", "   ", "not base64 !!", "12 x 4", "%%%%", "-3 4", "3.5 2"] {
            let decoded = decode(&encoded(3, 5, counts));
            assert_eq!(decoded.data.len(), 15, "input {:?}", counts);
        }
    }

    #[test]
    fn test_zero_sized_mask() {
        let decoded = decode(&encoded(0, 10, "AAAA"));
        assert!(decoded.data.is_empty());
        assert_eq!(decoded.bounding_box(), None);
    }

    #[test]
    fn test_synthesize_fills_exact_box() {
        let size = ImageSize::new(10, 8);
        let bbox = BoundingBox::new(2.0, 3.0, 5.0, 6.0);
        let decoded = try_decode(&synthesize_from_bbox(&bbox, size)).unwrap();

        for y in 0..8 {
            for x in 0..10 {
                let inside = (2..5).contains(&x) && (3..6).contains(&y);
                assert_eq!(decoded.is_foreground(x, y), inside, "pixel ({}, {})", x, y);
            }
        }
        assert_eq!(decoded.foreground_count(), 9);
    }

    #[test]
    fn test_synthesize_clips_to_image() {
        let size = ImageSize::new(4, 4);
        let bbox = BoundingBox::new(-10.0, 2.0, 100.0, 50.0);
        let decoded = decode(&synthesize_from_bbox(&bbox, size));
        assert_eq!(decoded.foreground_count(), 8);
        assert!(decoded.is_foreground(0, 2));
        assert!(decoded.is_foreground(3, 3));
        assert!(!decoded.is_foreground(0, 1));
    }

    #[test]
    fn test_synthesize_box_outside_image_is_empty() {
        let decoded = decode(&synthesize_from_bbox(
            &BoundingBox::new(50.0, 50.0, 60.0, 60.0),
            ImageSize::new(10, 10),
        ));
        assert_eq!(decoded.foreground_count(), 0);
    }

    #[test]
    fn test_bounding_box_is_exclusive() {
        let mut mask = DecodedMask::empty(100, 100);
        for y in 48..52 {
            for x in 48..52 {
                mask.data[y * 100 + x] = 255;
            }
        }
        assert_eq!(
            mask.bounding_box().unwrap().to_array(),
            [48.0, 48.0, 52.0, 52.0]
        );
    }

    #[test]
    fn test_encode_raw_roundtrip() {
        let mut mask = DecodedMask::empty(3, 2);
        mask.data[4] = 1;
        assert_eq!(decode(&encode_raw(&mask)), mask);
    }
}
