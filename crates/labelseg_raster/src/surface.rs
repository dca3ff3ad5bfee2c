//! The drawing surface abstraction and its recording implementation.

use crate::color::Color;

/// A point in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from two corners, normalizing so width and height are non-negative.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs())
    }
}

/// A borrowed single-channel mask. Any non-zero byte is foreground.
#[derive(Debug, Clone, Copy)]
pub struct MaskLayer<'a> {
    pub width: u32,
    pub height: u32,
    pub coverage: &'a [u8],
}

impl MaskLayer<'_> {
    /// Whether the buffer length matches the declared dimensions.
    pub fn is_consistent(&self) -> bool {
        self.coverage.len() == self.width as usize * self.height as usize
    }
}

/// Anything the overlay renderer can draw on.
///
/// Coordinates are surface pixels. Implementations must make `clear` drop
/// everything drawn before it so a full redraw never accumulates artifacts.
pub trait OverlaySurface {
    /// Reset the surface to fully transparent at the given size.
    fn clear(&mut self, width: u32, height: u32);

    /// Composite the foreground of `mask`, scaled to `dest`, in `color`.
    fn fill_mask(&mut self, mask: MaskLayer<'_>, color: Color, dest: Rect);

    /// Stroke a rectangle outline, optionally dashed with `[on, off]` lengths.
    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32, dash: Option<[f32; 2]>);

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color);

    fn stroke_circle(&mut self, center: Point, radius: f32, color: Color, width: f32);

    fn line(&mut self, from: Point, to: Point, color: Color, width: f32);

    /// Draw text with its baseline starting at `position`.
    fn fill_text(&mut self, text: &str, position: Point, color: Color, size: f32);
}

/// A draw command recorded by [`DisplayList`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear {
        width: u32,
        height: u32,
    },
    FillMask {
        width: u32,
        height: u32,
        coverage: Vec<u8>,
        color: Color,
        dest: Rect,
    },
    StrokeRect {
        rect: Rect,
        color: Color,
        width: f32,
        dash: Option<[f32; 2]>,
    },
    FillCircle {
        center: Point,
        radius: f32,
        color: Color,
    },
    StrokeCircle {
        center: Point,
        radius: f32,
        color: Color,
        width: f32,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
        width: f32,
    },
    Text {
        text: String,
        position: Point,
        color: Color,
        size: f32,
    },
}

/// Surface that records commands instead of drawing them.
///
/// A UI binding can replay the list onto its own canvas; `clear` discards
/// everything recorded so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl OverlaySurface for DisplayList {
    fn clear(&mut self, width: u32, height: u32) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear { width, height });
    }

    fn fill_mask(&mut self, mask: MaskLayer<'_>, color: Color, dest: Rect) {
        self.commands.push(DrawCommand::FillMask {
            width: mask.width,
            height: mask.height,
            coverage: mask.coverage.to_vec(),
            color,
            dest,
        });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32, dash: Option<[f32; 2]>) {
        self.commands.push(DrawCommand::StrokeRect {
            rect,
            color,
            width,
            dash,
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            color,
        });
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, color: Color, width: f32) {
        self.commands.push(DrawCommand::StrokeCircle {
            center,
            radius,
            color,
            width,
        });
    }

    fn line(&mut self, from: Point, to: Point, color: Color, width: f32) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            color,
            width,
        });
    }

    fn fill_text(&mut self, text: &str, position: Point, color: Color, size: f32) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            position,
            color,
            size,
        });
    }
}
