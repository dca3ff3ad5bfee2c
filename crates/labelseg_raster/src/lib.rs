//! labelseg_raster - drawing surfaces for the segmentation overlay.
//!
//! The overlay renderer talks to an [`OverlaySurface`]. Two surfaces are
//! provided: [`DisplayList`], which records [`DrawCommand`]s for a UI layer
//! to replay, and [`PixmapSurface`], which rasterizes with `tiny-skia`.

mod color;
mod pixmap;
mod surface;

pub use color::{Color, ColorParseError};
pub use pixmap::{PixmapSurface, RasterError, TextLabel};
pub use surface::{DisplayList, DrawCommand, MaskLayer, OverlaySurface, Point, Rect};
