//! End-to-end tests against a real engine library.
//!
//! These need a loadable `libpdfium` (point `PDFIUM_LIB_PATH` at it) and are
//! ignored by default; run them with `cargo test -- --ignored`.

use std::io::Cursor;

use pdfium_light::{Document, DeviceWindow, Error, RenderOptions};

/// Assemble a minimal well-formed PDF from object bodies, computing the
/// cross-reference table from the actual byte offsets.
fn build_pdf(objects: &[String]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref_at = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        )
        .as_bytes(),
    );
    out
}

/// Three empty US-Letter pages.
fn three_page_pdf() -> Vec<u8> {
    let page = "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>".to_string();
    build_pdf(&[
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R 4 0 R 5 0 R] /Count 3 >>".to_string(),
        page.clone(),
        page.clone(),
        page,
    ])
}

/// Same three pages plus an outline: two top-level nodes, the first with
/// one child.
fn outlined_pdf() -> Vec<u8> {
    let page = "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>".to_string();
    build_pdf(&[
        "<< /Type /Catalog /Pages 2 0 R /Outlines 6 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R 4 0 R 5 0 R] /Count 3 >>".to_string(),
        page.clone(),
        page.clone(),
        page,
        "<< /Type /Outlines /First 7 0 R /Last 8 0 R /Count 3 >>".to_string(),
        "<< /Title (Intro) /Parent 6 0 R /Next 8 0 R /First 9 0 R /Last 9 0 R /Count 1 /Dest [3 0 R /Fit] >>"
            .to_string(),
        "<< /Title (Summary) /Parent 6 0 R /Prev 7 0 R /Dest [5 0 R /Fit] >>".to_string(),
        "<< /Title (Background) /Parent 7 0 R /Dest [4 0 R /Fit] >>".to_string(),
    ])
}

#[test]
#[ignore = "requires a libpdfium library"]
fn load_render_dispose_roundtrip() {
    let mut doc = Document::open_bytes(three_page_pdf(), None).unwrap();
    assert_eq!(doc.page_count().unwrap(), 3);

    {
        let page = doc.page(0).unwrap();
        let bitmap = page.render(&RenderOptions::new(200, 0)).unwrap();
        assert_eq!(bitmap.width(), 200);
        // Height follows the page aspect ratio within a pixel.
        let expected = (200.0_f64 * 792.0 / 612.0).round() as i64;
        assert!((i64::from(bitmap.height()) - expected).abs() <= 1);
        assert_eq!(bitmap.data().len(), bitmap.stride() * bitmap.height() as usize);
    }

    doc.close();
    assert!(matches!(doc.page_count(), Err(Error::Usage { .. })));
    assert!(matches!(doc.page(0), Err(Error::Usage { .. })));
    // A second dispose is a no-op.
    doc.close();
}

#[test]
#[ignore = "requires a libpdfium library"]
fn sequential_pages_are_distinct_and_out_of_range_errors() {
    let doc = Document::open_bytes(three_page_pdf(), None).unwrap();
    let count = doc.page_count().unwrap();
    assert_eq!(count, 3);
    for index in 0..count {
        let page = doc.page(index).unwrap();
        assert_eq!(page.index(), index);
        assert!((page.width() - 612.0).abs() < 0.5);
        assert!((page.height() - 792.0).abs() < 0.5);
    }
    assert!(doc.page(count).is_err());
}

#[test]
#[ignore = "requires a libpdfium library"]
fn device_page_roundtrip_is_identity_without_rotation() {
    let doc = Document::open_bytes(three_page_pdf(), None).unwrap();
    let page = doc.page(0).unwrap();
    let window = DeviceWindow::new(612, 792);
    for (x, y) in [(0, 0), (100, 250), (611, 791)] {
        let (px, py) = page.device_to_page(&window, x, y).unwrap();
        let (rx, ry) = page.page_to_device(&window, px, py).unwrap();
        assert!((rx - x).abs() <= 1, "x: {x} -> {rx}");
        assert!((ry - y).abs() <= 1, "y: {y} -> {ry}");
    }
}

#[test]
#[ignore = "requires a libpdfium library"]
fn outline_snapshot_preserves_shape_and_titles() {
    let doc = Document::open_bytes(outlined_pdf(), None).unwrap();
    let outline = doc.outline();
    assert_eq!(outline.len(), 2);
    assert_eq!(outline[0].title, "Intro");
    assert_eq!(outline[0].page_index, Some(0));
    assert_eq!(outline[0].children.len(), 1);
    assert_eq!(outline[0].children[0].title, "Background");
    assert_eq!(outline[0].children[0].page_index, Some(1));
    assert_eq!(outline[1].title, "Summary");
    assert_eq!(outline[1].page_index, Some(2));
    assert!(outline[1].children.is_empty());
}

#[test]
#[ignore = "requires a libpdfium library"]
fn seekable_reader_matches_in_memory_open() -> anyhow::Result<()> {
    let bytes = three_page_pdf();
    let from_reader = Document::open_reader(Cursor::new(bytes.clone()), None)?;
    let from_bytes = Document::open_bytes(bytes, None)?;
    assert_eq!(from_reader.page_count()?, from_bytes.page_count()?);
    assert_eq!(from_reader.page_size(0)?, from_bytes.page_size(0)?);
    Ok(())
}

#[test]
#[ignore = "requires a libpdfium library"]
fn garbage_bytes_surface_a_load_error() {
    let result = Document::open_bytes(b"not a document at all".to_vec(), None);
    assert!(matches!(result, Err(Error::Load { .. })));
}

#[test]
#[ignore = "requires a libpdfium library"]
fn save_copy_roundtrips_through_a_temp_file() -> anyhow::Result<()> {
    let doc = Document::open_bytes(three_page_pdf(), None)?;

    let mut file = tempfile::NamedTempFile::new()?;
    doc.save_copy(file.as_file_mut())?;

    let copy = Document::open_file(file.path(), None)?;
    assert_eq!(copy.page_count()?, 3);
    Ok(())
}
