//! Page lifecycle, rasterization and text geometry.

use libc::{c_int, c_ulong};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::ffi::{self, Bindings};
use crate::geometry::{self, DeviceRect, DeviceWindow, PageRect, Rect};
use crate::render::{self, Bitmap, Clip, RenderFlags, RenderOptions, Rotation};

/// An open page of a [`Document`].
///
/// Borrows the document for its whole lifetime, so a page can never outlive
/// the document it came from or observe it disposed. Closing reverses the
/// open sequence exactly and is idempotent; it also runs on drop.
pub struct Page<'doc> {
    document: &'doc Document,
    handle: ffi::FPDF_PAGE,
    text_handle: ffi::FPDF_TEXTPAGE,
    index: usize,
    width: f64,
    height: f64,
    closed: bool,
}

impl<'doc> Page<'doc> {
    pub(crate) fn open(document: &'doc Document, index: usize) -> Result<Self> {
        let opened = document.engine.run(|b| unsafe {
            let handle = (b.FPDF_LoadPage)(document.handle, index as c_int);
            if handle.is_null() {
                return None;
            }
            let text_handle = (b.FPDFText_LoadPage)(handle);
            if !document.form_handle.is_null() {
                // Let the form environment see the page before its declared
                // open action runs.
                (b.FORM_OnAfterLoadPage)(handle, document.form_handle);
                (b.FORM_DoPageAAction)(handle, document.form_handle, ffi::FPDFPAGE_AACTION_OPEN);
            }
            let width = (b.FPDF_GetPageWidth)(handle);
            let height = (b.FPDF_GetPageHeight)(handle);
            Some((handle, text_handle, width, height))
        });

        let Some((handle, text_handle, width, height)) = opened else {
            return Err(Error::Load {
                code: crate::error::LoadErrorCode::BadPage,
            });
        };
        log::trace!("opened page {index} ({width:.1} x {height:.1} pt)");
        Ok(Self {
            document,
            handle,
            text_handle,
            index,
            width,
            height,
            closed: false,
        })
    }

    /// Zero-based index of this page in its document.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Page width in points, fixed at open time.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Page height in points, fixed at open time.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::usage("page has been closed"))
        } else {
            Ok(())
        }
    }

    /// Rasterize the page into a BGRA pixel buffer.
    ///
    /// The buffer covers the clip window (the full canvas when no clip is
    /// given), seeded with an opaque or transparent white background before
    /// the engine draws. With [`RenderFlags::FORMS`], a second engine pass
    /// overlays interactive form-field appearances using the document's
    /// form environment.
    pub fn render(&self, options: &RenderOptions) -> Result<Bitmap> {
        self.ensure_open()?;
        let (width, height) = render::resolve_dimensions(options, self.width, self.height)?;
        let clip = options.clip.unwrap_or(Clip {
            x: 0,
            y: 0,
            width,
            height,
        });
        if clip.width <= 0 || clip.height <= 0 {
            return Err(Error::invalid("clip window must have positive extent"));
        }

        let stride = clip.width as usize * 4;
        let mut data = vec![0u8; stride * clip.height as usize];

        let rotation = options.rotation.to_engine();
        let engine_flags = options.flags.to_engine();
        let draw_forms =
            options.flags.contains(RenderFlags::FORMS) && !self.document.form_handle.is_null();

        let drawn = self.document.engine.run(|b| {
            let raw = unsafe {
                (b.FPDFBitmap_CreateEx)(
                    clip.width,
                    clip.height,
                    ffi::FPDFBITMAP_BGRA,
                    data.as_mut_ptr().cast(),
                    stride as c_int,
                )
            };
            if raw.is_null() {
                return false;
            }
            let bitmap = BitmapGuard {
                bindings: b,
                handle: raw,
            };
            unsafe {
                // Seed the background first so regions the page content
                // never touches are well-defined.
                (b.FPDFBitmap_FillRect)(
                    bitmap.handle,
                    0,
                    0,
                    clip.width,
                    clip.height,
                    options.flags.background() as c_ulong,
                );
                // The clip origin says where the window sits inside the
                // virtual canvas; the engine wants the draw origin, which
                // is its negation.
                (b.FPDF_RenderPageBitmap)(
                    bitmap.handle,
                    self.handle,
                    -clip.x,
                    -clip.y,
                    width,
                    height,
                    rotation,
                    engine_flags,
                );
                if draw_forms {
                    (b.FPDF_FFLDraw)(
                        self.document.form_handle,
                        bitmap.handle,
                        self.handle,
                        -clip.x,
                        -clip.y,
                        width,
                        height,
                        rotation,
                        engine_flags,
                    );
                }
            }
            true
        });

        if !drawn {
            return Err(Error::render("engine could not create the target bitmap"));
        }
        Ok(Bitmap::from_parts(
            clip.width as u32,
            clip.height as u32,
            data,
        ))
    }

    /// Rasterize the whole page at a target DPI with default flags; the
    /// canvas size is `points * dpi / 72`, rounded.
    pub fn render_at_dpi(&self, dpi: f32) -> Result<Bitmap> {
        let width = (self.width * f64::from(dpi) / 72.0).round() as i32;
        let height = (self.height * f64::from(dpi) / 72.0).round() as i32;
        self.render(&RenderOptions::new(width, height))
    }

    /// Persist a new base rotation on the page object.
    pub fn set_rotation(&self, rotation: Rotation) -> Result<()> {
        self.ensure_open()?;
        self.document
            .engine
            .run(|b| unsafe { (b.FPDFPage_SetRotation)(self.handle, rotation.to_engine()) });
        Ok(())
    }

    /// Number of characters on the page.
    pub fn char_count(&self) -> Result<usize> {
        self.ensure_open()?;
        let count = self
            .document
            .engine
            .run(|b| unsafe { (b.FPDFText_CountChars)(self.text_handle) });
        Ok(count.max(0) as usize)
    }

    /// Extract `length` characters of page text starting at `offset`.
    pub fn text_range(&self, offset: usize, length: usize) -> Result<String> {
        self.ensure_open()?;
        if length == 0 {
            return Ok(String::new());
        }
        let text = self.document.engine.run(|b| unsafe {
            // The engine writes UTF-16 plus a terminator, so the buffer
            // needs one extra unit the decode then drops.
            let mut buf = vec![0u16; length + 1];
            let written =
                (b.FPDFText_GetText)(self.text_handle, offset as c_int, length as c_int, buf.as_mut_ptr());
            let units = (written.max(0) as usize).saturating_sub(1).min(length);
            String::from_utf16_lossy(&buf[..units])
        });
        Ok(text)
    }

    /// All text on the page.
    pub fn text(&self) -> Result<String> {
        let count = self.char_count()?;
        self.text_range(0, count)
    }

    /// Bounding rectangles covering the character range, page-tagged, in
    /// document order. Degenerate zero-extent rectangles are dropped.
    pub fn text_bounds(&self, offset: usize, length: usize) -> Result<Vec<PageRect>> {
        self.ensure_open()?;
        let rects = self.document.engine.run(|b| unsafe {
            let count =
                (b.FPDFText_CountRects)(self.text_handle, offset as c_int, length as c_int);
            let mut rects = Vec::with_capacity(count.max(0) as usize);
            for i in 0..count {
                let (mut left, mut top, mut right, mut bottom) = (0f64, 0f64, 0f64, 0f64);
                let ok = (b.FPDFText_GetRect)(
                    self.text_handle,
                    i,
                    &mut left,
                    &mut top,
                    &mut right,
                    &mut bottom,
                );
                if ok == 0 {
                    continue;
                }
                let bounds = geometry::rect_from_corners(left, top, right, bottom);
                if bounds.width == 0.0 || bounds.height == 0.0 {
                    continue;
                }
                rects.push(PageRect {
                    page: self.index,
                    bounds,
                });
            }
            rects
        });
        Ok(rects)
    }

    /// Index of the character at or near `(x, y)` in page coordinates,
    /// searching within `tolerance` points on both axes. Engine convention:
    /// -1 when no character is nearby, -3 on error.
    pub fn char_index_at(&self, x: f64, y: f64, tolerance: f64) -> Result<i32> {
        self.ensure_open()?;
        Ok(self.document.engine.run(|b| unsafe {
            (b.FPDFText_GetCharIndexAtPos)(self.text_handle, x, y, tolerance, tolerance)
        }))
    }

    /// Map a device-space point into page space.
    pub fn device_to_page(&self, window: &DeviceWindow, x: i32, y: i32) -> Result<(f64, f64)> {
        self.ensure_open()?;
        let point = self.document.engine.run(|b| unsafe {
            let mut page_x = 0f64;
            let mut page_y = 0f64;
            let ok = (b.FPDF_DeviceToPage)(
                self.handle,
                window.origin_x,
                window.origin_y,
                window.width,
                window.height,
                window.rotation.to_engine(),
                x,
                y,
                &mut page_x,
                &mut page_y,
            );
            (ok != 0).then_some((page_x, page_y))
        });
        point.ok_or(Error::invalid("device point could not be mapped"))
    }

    /// Map a page-space point into device space.
    pub fn page_to_device(&self, window: &DeviceWindow, x: f64, y: f64) -> Result<(i32, i32)> {
        self.ensure_open()?;
        let point = self.document.engine.run(|b| unsafe {
            let mut device_x: c_int = 0;
            let mut device_y: c_int = 0;
            let ok = (b.FPDF_PageToDevice)(
                self.handle,
                window.origin_x,
                window.origin_y,
                window.width,
                window.height,
                window.rotation.to_engine(),
                x,
                y,
                &mut device_x,
                &mut device_y,
            );
            (ok != 0).then_some((device_x, device_y))
        });
        point.ok_or(Error::invalid("page point could not be mapped"))
    }

    /// Map a device rectangle into page space. Both corners are converted
    /// independently and the result normalized, so width and height stay
    /// non-negative under every rotation.
    pub fn rect_to_page(&self, window: &DeviceWindow, rect: DeviceRect) -> Result<PageRect> {
        let (ax, ay) = self.device_to_page(window, rect.x, rect.y)?;
        let (bx, by) = self.device_to_page(window, rect.x + rect.width, rect.y + rect.height)?;
        Ok(PageRect {
            page: self.index,
            bounds: geometry::rect_from_corners(ax, ay, bx, by),
        })
    }

    /// Map a page rectangle into device space, normalized the same way as
    /// [`Page::rect_to_page`].
    pub fn rect_to_device(&self, window: &DeviceWindow, rect: &Rect) -> Result<DeviceRect> {
        let (ax, ay) = self.page_to_device(window, f64::from(rect.x), f64::from(rect.y))?;
        let (bx, by) = self.page_to_device(
            window,
            f64::from(rect.x + rect.width),
            f64::from(rect.y + rect.height),
        )?;
        Ok(geometry::device_rect_from_corners(ax, ay, bx, by))
    }

    /// Close the page, reversing the open sequence exactly: close action,
    /// form notification, text handle, page handle. Idempotent; also runs
    /// on drop.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.document.engine.run(|b| unsafe {
            if !self.document.form_handle.is_null() {
                (b.FORM_DoPageAAction)(self.handle, self.document.form_handle, ffi::FPDFPAGE_AACTION_CLOSE);
                (b.FORM_OnBeforeClosePage)(self.handle, self.document.form_handle);
            }
            (b.FPDFText_ClosePage)(self.text_handle);
            (b.FPDF_ClosePage)(self.handle);
        });
        log::trace!("closed page {}", self.index);
    }
}

impl Drop for Page<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Scoped native bitmap: destroyed on every exit path, so the engine-side
/// handle never leaks even when rasterization fails partway.
struct BitmapGuard<'b> {
    bindings: &'b Bindings,
    handle: ffi::FPDF_BITMAP,
}

impl Drop for BitmapGuard<'_> {
    fn drop(&mut self) {
        unsafe { (self.bindings.FPDFBitmap_Destroy)(self.handle) };
    }
}
