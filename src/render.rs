//! Render requests, flags and pixel buffers.

use bitflags::bitflags;
use libc::c_int;

use crate::error::{Error, Result};

/// Opaque white, seeded before rasterization so uncovered regions are
/// well-defined.
pub(crate) const BACKGROUND_OPAQUE: u32 = 0xFFFF_FFFF;
/// Transparent white, used when [`RenderFlags::TRANSPARENT`] is set.
pub(crate) const BACKGROUND_TRANSPARENT: u32 = 0x00FF_FFFF;

bitflags! {
    /// Rendering behavior toggles.
    ///
    /// `TRANSPARENT`, `CORRECT_DPI` and `FORMS` are composition policy
    /// handled by the wrapper and never reach the engine; the remaining
    /// bits map directly onto engine raster flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct RenderFlags: u32 {
        /// Draw annotations.
        const ANNOTATIONS = 0x0000_0001;
        /// Optimize text for LCD display.
        const LCD_TEXT = 0x0000_0002;
        /// Bypass the platform's native text rendering path.
        const NO_NATIVE_TEXT = 0x0000_0004;
        /// Render in grayscale.
        const GRAYSCALE = 0x0000_0008;
        /// Cap the engine's image cache while rendering.
        const LIMIT_IMAGE_CACHE = 0x0000_0200;
        /// Seed a transparent instead of an opaque white background.
        const TRANSPARENT = 0x0000_1000;
        /// Scale the requested dimensions by dpi/72 before rendering.
        const CORRECT_DPI = 0x0000_2000;
        /// Overlay interactive form-field appearances after the base raster.
        const FORMS = 0x0000_4000;
    }
}

impl RenderFlags {
    /// Engine-facing bits. Composition-policy flags are stripped, and when
    /// the form overlay is requested the engine's own annotation bit is
    /// dropped too: form rendering subsumes it, and leaving both would
    /// draw the fields twice.
    pub(crate) fn to_engine(self) -> c_int {
        let mut flags = self & !(Self::TRANSPARENT | Self::CORRECT_DPI | Self::FORMS);
        if self.contains(Self::FORMS) {
            flags &= !Self::ANNOTATIONS;
        }
        flags.bits() as c_int
    }

    pub(crate) fn background(self) -> u32 {
        if self.contains(Self::TRANSPARENT) {
            BACKGROUND_TRANSPARENT
        } else {
            BACKGROUND_OPAQUE
        }
    }
}

/// Page rotation applied at render time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    None,
    /// 90 degrees clockwise.
    Clockwise90,
    Rotate180,
    /// 270 degrees clockwise.
    Clockwise270,
}

impl Rotation {
    pub(crate) fn to_engine(self) -> c_int {
        match self {
            Self::None => 0,
            Self::Clockwise90 => 1,
            Self::Rotate180 => 2,
            Self::Clockwise270 => 3,
        }
    }
}

/// Visible window within the virtual raster canvas. The pixel buffer gets
/// the clip's size; the draw origin passed to the engine is the clip
/// origin, negated.
#[derive(Clone, Copy, Debug)]
pub struct Clip {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Parameters of one rasterization. Pure value, no identity.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Target raster width of the full canvas in pixels; 0 derives it from
    /// the height and the page aspect ratio.
    pub width: i32,
    /// Target raster height; 0 derives it from the width.
    pub height: i32,
    /// Visible window; `None` renders the whole canvas.
    pub clip: Option<Clip>,
    pub dpi_x: f32,
    pub dpi_y: f32,
    pub rotation: Rotation,
    pub flags: RenderFlags,
}

impl RenderOptions {
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            clip: None,
            dpi_x: 72.0,
            dpi_y: 72.0,
            rotation: Rotation::None,
            flags: RenderFlags::empty(),
        }
    }
}

/// Rendered pixels: 32-bit BGRA rows, top to bottom, no padding.
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Bitmap {
    pub(crate) fn from_parts(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            data,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Resolve the final canvas dimensions for a page of `page_width` by
/// `page_height` points. A zero side is derived from the other via the page
/// aspect ratio; DPI correction scales by dpi/72 (the document's
/// points-per-inch convention) before the buffer is allocated.
pub(crate) fn resolve_dimensions(
    options: &RenderOptions,
    page_width: f64,
    page_height: f64,
) -> Result<(i32, i32)> {
    let mut width = options.width;
    let mut height = options.height;

    if width < 0 || height < 0 {
        return Err(Error::invalid("render dimensions must not be negative"));
    }
    if width == 0 && height == 0 {
        return Err(Error::invalid(
            "render width and height must not both be zero",
        ));
    }
    if page_width <= 0.0 || page_height <= 0.0 {
        return Err(Error::invalid("page has no usable dimensions"));
    }

    if width == 0 {
        width = (f64::from(height) * page_width / page_height).round() as i32;
    } else if height == 0 {
        height = (f64::from(width) * page_height / page_width).round() as i32;
    }

    if options.flags.contains(RenderFlags::CORRECT_DPI) {
        width = (f64::from(width) * f64::from(options.dpi_x) / 72.0).round() as i32;
        height = (f64::from(height) * f64::from(options.dpi_y) / 72.0).round() as i32;
    }

    Ok((width.max(1), height.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_policy_bits_never_reach_the_engine() {
        let flags = RenderFlags::ANNOTATIONS
            | RenderFlags::LCD_TEXT
            | RenderFlags::TRANSPARENT
            | RenderFlags::CORRECT_DPI;
        assert_eq!(flags.to_engine(), 0x03);
    }

    #[test]
    fn form_overlay_drops_the_annotation_bit() {
        let flags = RenderFlags::ANNOTATIONS | RenderFlags::GRAYSCALE | RenderFlags::FORMS;
        assert_eq!(flags.to_engine(), 0x08);
    }

    #[test]
    fn background_follows_transparency_flag() {
        assert_eq!(RenderFlags::empty().background(), 0xFFFF_FFFF);
        assert_eq!(RenderFlags::TRANSPARENT.background(), 0x00FF_FFFF);
    }

    #[test]
    fn zero_height_derives_from_aspect_ratio() {
        let options = RenderOptions::new(200, 0);
        // US Letter: 612 x 792 points.
        let (width, height) = resolve_dimensions(&options, 612.0, 792.0).unwrap();
        assert_eq!(width, 200);
        assert_eq!(height, 259);
    }

    #[test]
    fn zero_width_derives_from_aspect_ratio() {
        let options = RenderOptions::new(0, 792);
        let (width, height) = resolve_dimensions(&options, 612.0, 792.0).unwrap();
        assert_eq!(width, 612);
        assert_eq!(height, 792);
    }

    #[test]
    fn both_dimensions_zero_is_an_argument_error() {
        let options = RenderOptions::new(0, 0);
        assert!(matches!(
            resolve_dimensions(&options, 612.0, 792.0),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn dpi_correction_scales_both_axes() {
        let mut options = RenderOptions::new(100, 200);
        options.dpi_x = 144.0;
        options.dpi_y = 144.0;
        options.flags = RenderFlags::CORRECT_DPI;
        let (width, height) = resolve_dimensions(&options, 612.0, 792.0).unwrap();
        assert_eq!((width, height), (200, 400));
    }
}
