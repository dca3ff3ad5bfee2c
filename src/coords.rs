//! Display-to-image coordinate mapping.
//!
//! Clicks arrive in CSS/display pixels relative to the viewport. The image
//! element occupies `DisplayRect` on screen and is scaled uniformly (no
//! rotation, aspect ratio preserved by layout). These functions move points
//! between that rectangle and the session's coordinate space.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ImageSize;

/// Side length of the normalized percent space.
pub const PERCENT_EXTENT: f32 = 100.0;

/// Space that stored prompt points live in.
///
/// A session picks one and keeps it for storage, rendering and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSpace {
    /// Native image pixels
    #[default]
    Pixels,
    /// `[0, 100] x [0, 100]` percentage of the displayed image, independent of zoom and pan
    Percent,
}

impl CoordinateSpace {
    pub fn name(&self) -> &'static str {
        match self {
            CoordinateSpace::Pixels => "pixels",
            CoordinateSpace::Percent => "percent",
        }
    }

    /// Extent of this space for an image of the given native size.
    fn extent(&self, native: ImageSize) -> (f32, f32) {
        match self {
            CoordinateSpace::Pixels => (native.width as f32, native.height as f32),
            CoordinateSpace::Percent => (PERCENT_EXTENT, PERCENT_EXTENT),
        }
    }
}

/// Error returned when a mapping cannot be computed.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MappingError {
    /// The display rectangle has no usable area (collapsed or not laid out yet).
    #[error("mapping unavailable: display rect is {width}x{height}")]
    DisplayUnavailable { width: f32, height: f32 },

    /// The native image size is zero.
    #[error("mapping unavailable: image size is {width}x{height}")]
    ImageUnavailable { width: u32, height: u32 },
}

/// A position in display (CSS) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClientPoint {
    pub x: f32,
    pub y: f32,
}

impl ClientPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A position in a session's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImagePoint {
    pub x: f32,
    pub y: f32,
}

impl ImagePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Where the image is drawn on screen, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A rect at the origin with the given size.
    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    fn check(&self) -> Result<(), MappingError> {
        let usable = |v: f32| v.is_finite() && v > 0.0;
        if usable(self.width) && usable(self.height) {
            Ok(())
        } else {
            Err(MappingError::DisplayUnavailable {
                width: self.width,
                height: self.height,
            })
        }
    }
}

fn check_native(native: ImageSize) -> Result<(), MappingError> {
    if native.is_empty() {
        Err(MappingError::ImageUnavailable {
            width: native.width,
            height: native.height,
        })
    } else {
        Ok(())
    }
}

/// Map a display-space click into `space`.
///
/// `native` is only consulted in [`CoordinateSpace::Pixels`].
pub fn to_image_space(
    client: ClientPoint,
    rect: DisplayRect,
    native: ImageSize,
    space: CoordinateSpace,
) -> Result<ImagePoint, MappingError> {
    rect.check()?;
    if space == CoordinateSpace::Pixels {
        check_native(native)?;
    }
    let (extent_x, extent_y) = space.extent(native);
    Ok(ImagePoint {
        x: (client.x - rect.left) / rect.width * extent_x,
        y: (client.y - rect.top) / rect.height * extent_y,
    })
}

/// Map a point stored in `space` back to display pixels.
pub fn to_display_space(
    point: ImagePoint,
    rect: DisplayRect,
    native: ImageSize,
    space: CoordinateSpace,
) -> Result<ClientPoint, MappingError> {
    rect.check()?;
    if space == CoordinateSpace::Pixels {
        check_native(native)?;
    }
    let (extent_x, extent_y) = space.extent(native);
    Ok(ClientPoint {
        x: rect.left + point.x / extent_x * rect.width,
        y: rect.top + point.y / extent_y * rect.height,
    })
}

/// Convert a point stored in `space` to native pixels.
pub fn to_native_pixels(
    point: ImagePoint,
    native: ImageSize,
    space: CoordinateSpace,
) -> Result<ImagePoint, MappingError> {
    match space {
        CoordinateSpace::Pixels => Ok(point),
        CoordinateSpace::Percent => {
            check_native(native)?;
            Ok(ImagePoint {
                x: point.x / PERCENT_EXTENT * native.width as f32,
                y: point.y / PERCENT_EXTENT * native.height as f32,
            })
        }
    }
}

/// Convert a percent-space point to native pixels.
pub fn percent_to_pixels(point: ImagePoint, native: ImageSize) -> Result<ImagePoint, MappingError> {
    to_native_pixels(point, native, CoordinateSpace::Percent)
}

/// Convert a native pixel point to percent space.
pub fn pixels_to_percent(point: ImagePoint, native: ImageSize) -> Result<ImagePoint, MappingError> {
    check_native(native)?;
    Ok(ImagePoint {
        x: point.x / native.width as f32 * PERCENT_EXTENT,
        y: point.y / native.height as f32 * PERCENT_EXTENT,
    })
}

/// Scale factors from native pixels to display pixels.
pub fn display_scale(rect: DisplayRect, native: ImageSize) -> Result<(f32, f32), MappingError> {
    rect.check()?;
    check_native(native)?;
    Ok((
        rect.width / native.width as f32,
        rect.height / native.height as f32,
    ))
}
