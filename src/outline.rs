//! Outline (bookmark) tree snapshot.

use std::ptr;

use crate::ffi::{self, Bindings};
use crate::strings;

/// One node of the document outline.
///
/// An owned snapshot: immutable after construction, no back-reference to
/// the document it came from.
#[derive(Clone, Debug, Default)]
pub struct OutlineNode {
    /// Decoded title text.
    pub title: String,
    /// Zero-based target page, if the node carries a destination. Page 0 is
    /// a valid target, distinct from a node with no destination at all.
    pub page_index: Option<u32>,
    /// Child nodes in document order.
    pub children: Vec<OutlineNode>,
}

/// Walk the engine's linked outline structure into an owned tree:
/// depth-first, sibling order preserved, stopping at null sibling/child
/// pointers. Runs once at document load, while the engine lock is held.
///
/// # Safety
///
/// `doc` must be a live document handle and the caller must hold the engine
/// lock.
pub(crate) unsafe fn snapshot(bindings: &Bindings, doc: ffi::FPDF_DOCUMENT) -> Vec<OutlineNode> {
    let first = unsafe { (bindings.FPDFBookmark_GetFirstChild)(doc, ptr::null_mut()) };
    unsafe { siblings(bindings, doc, first) }
}

unsafe fn siblings(
    bindings: &Bindings,
    doc: ffi::FPDF_DOCUMENT,
    first: ffi::FPDF_BOOKMARK,
) -> Vec<OutlineNode> {
    let mut nodes = Vec::new();
    let mut cursor = first;
    while !cursor.is_null() {
        nodes.push(unsafe { node(bindings, doc, cursor) });
        cursor = unsafe { (bindings.FPDFBookmark_GetNextSibling)(doc, cursor) };
    }
    nodes
}

unsafe fn node(
    bindings: &Bindings,
    doc: ffi::FPDF_DOCUMENT,
    bookmark: ffi::FPDF_BOOKMARK,
) -> OutlineNode {
    let title = unsafe { title(bindings, bookmark) };
    let page_index = unsafe { destination_page(bindings, doc, bookmark) };
    let child = unsafe { (bindings.FPDFBookmark_GetFirstChild)(doc, bookmark) };
    let children = if child.is_null() {
        Vec::new()
    } else {
        unsafe { siblings(bindings, doc, child) }
    };
    OutlineNode {
        title,
        page_index,
        children,
    }
}

unsafe fn title(bindings: &Bindings, bookmark: ffi::FPDF_BOOKMARK) -> String {
    // First call sizes the buffer; the reported length covers a UTF-16
    // terminator the decoder strips.
    let len = unsafe { (bindings.FPDFBookmark_GetTitle)(bookmark, ptr::null_mut(), 0) };
    if len == 0 {
        return String::new();
    }
    let mut buf = vec![0u8; len as usize];
    unsafe { (bindings.FPDFBookmark_GetTitle)(bookmark, buf.as_mut_ptr().cast(), len) };
    strings::from_utf16le_bytes(&buf)
}

unsafe fn destination_page(
    bindings: &Bindings,
    doc: ffi::FPDF_DOCUMENT,
    bookmark: ffi::FPDF_BOOKMARK,
) -> Option<u32> {
    let dest = unsafe { (bindings.FPDFBookmark_GetDest)(doc, bookmark) };
    if dest.is_null() {
        return None;
    }
    let index = unsafe { (bindings.FPDFDest_GetDestPageIndex)(doc, dest) };
    u32::try_from(index).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_without_destination_are_distinct_from_page_zero() {
        let with_dest = OutlineNode {
            title: "Cover".into(),
            page_index: Some(0),
            children: Vec::new(),
        };
        let without_dest = OutlineNode {
            title: "Group".into(),
            page_index: None,
            children: vec![with_dest.clone()],
        };
        assert_eq!(with_dest.page_index, Some(0));
        assert_eq!(without_dest.page_index, None);
        assert_eq!(without_dest.children.len(), 1);
    }
}
