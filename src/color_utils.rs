//! Display colors for annotation objects.
//!
//! Object colors come from a fixed palette indexed by object id, so the same
//! id always renders and exports with the same color.

use labelseg_raster::Color;

use crate::model::ObjectId;

/// Object palette, indexed by `(id - 1) % len`.
pub const PALETTE: [Color; 6] = [
    Color::rgb(0x18, 0x90, 0xff),
    Color::rgb(0x52, 0xc4, 0x1a),
    Color::rgb(0xfa, 0xad, 0x14),
    Color::rgb(0xf5, 0x22, 0x2d),
    Color::rgb(0x72, 0x2e, 0xd1),
    Color::rgb(0x13, 0xc2, 0xc2),
];

/// Fill for negative (background) prompt points regardless of object.
pub const NEGATIVE_POINT_COLOR: Color = Color::rgb(0xff, 0x4d, 0x4f);

/// Color assigned to an object id. Ids start at 1; 0 maps to the first entry.
pub fn palette_color(id: ObjectId) -> Color {
    let index = id.saturating_sub(1) as usize % PALETTE.len();
    PALETTE[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_indexed_from_one() {
        assert_eq!(palette_color(1), PALETTE[0]);
        assert_eq!(palette_color(2), PALETTE[1]);
        assert_eq!(palette_color(3), PALETTE[2]);
    }

    #[test]
    fn test_palette_wraps() {
        assert_eq!(palette_color(7), PALETTE[0]);
        assert_eq!(palette_color(12), PALETTE[5]);
    }

    #[test]
    fn test_palette_hex_values() {
        assert_eq!(PALETTE[0].to_hex(), "#1890ff");
        assert_eq!(PALETTE[5].to_hex(), "#13c2c2");
        assert_eq!(NEGATIVE_POINT_COLOR.to_hex(), "#ff4d4f");
    }
}
