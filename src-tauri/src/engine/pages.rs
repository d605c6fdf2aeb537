//! Page-tree plumbing shared by every operation that writes a new page list.

use std::path::Path;

use log::debug;
use lopdf::{dictionary, Document, Object, ObjectId};

use crate::error::{AppError, AppResult};

/// Attributes a page may inherit from its ancestor `Pages` nodes.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against `Parent` cycles in damaged files.
const MAX_TREE_DEPTH: usize = 64;

/// A4 in points, used when a page carries no readable MediaBox.
pub const DEFAULT_PAGE_SIZE: (f64, f64) = (595.28, 841.89);

/// Look up `key` on the page or the closest ancestor that defines it.
pub fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node_id = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(node_id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        node_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// Copy inherited attributes onto the page itself so it can be reparented
/// (or moved into another document) without losing fonts or its size.
pub fn materialize_inherited(doc: &mut Document, page_id: ObjectId) -> AppResult<()> {
    let page = doc.get_dictionary(page_id)?;
    let inherited: Vec<(&[u8], Object)> = INHERITABLE
        .iter()
        .filter(|key| !page.has(key))
        .filter_map(|key| inherited_attribute(doc, page_id, key).map(|v| (*key, v.clone())))
        .collect();

    if inherited.is_empty() {
        return Ok(());
    }
    let page = doc.get_dictionary_mut(page_id)?;
    for (key, value) in inherited {
        page.set(key, value);
    }
    Ok(())
}

/// Replace the document's page tree with a single flat `Pages` node holding
/// `page_ids` in order, then drop everything no longer reachable.
///
/// Pages are never copied, only reparented, so their resources stay intact.
pub fn rebuild_page_tree(doc: &mut Document, page_ids: &[ObjectId]) -> AppResult<ObjectId> {
    for &page_id in page_ids {
        materialize_inherited(doc, page_id)?;
    }

    let pages_root_id = doc.new_object_id();
    for &page_id in page_ids {
        doc.get_dictionary_mut(page_id)?
            .set("Parent", Object::Reference(pages_root_id));
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Count" => page_ids.len() as i64,
        "Kids" => page_ids.iter().copied().map(Object::Reference).collect::<Vec<_>>(),
    };
    doc.objects.insert(pages_root_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.trailer.get(b"Root")?.as_reference()?;
    doc.get_dictionary_mut(catalog_id)?.set("Pages", Object::Reference(pages_root_id));

    let pruned = doc.prune_objects();
    debug!(
        "rebuilt page tree with {} pages, pruned {} objects",
        page_ids.len(),
        pruned.len()
    );
    Ok(pages_root_id)
}

/// Page ids in document order.
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}

/// `(current + delta)` wrapped into `0..360`. Only quarter turns are valid.
pub fn normalize_rotation(current: i64, delta: i32) -> AppResult<i64> {
    if delta % 90 != 0 {
        return Err(AppError::Validation(format!(
            "Rotation must be a multiple of 90 degrees, got {}.",
            delta
        )));
    }
    Ok((current + delta as i64).rem_euclid(360))
}

/// Effective `/Rotate` of a page, inherited if needed.
pub fn page_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|o| o.as_i64().ok())
        .map(|r| r.rem_euclid(360))
        .unwrap_or(0)
}

/// Add `delta` degrees to a page's rotation.
pub fn rotate_page(doc: &mut Document, page_id: ObjectId, delta: i32) -> AppResult<i64> {
    let rotation = normalize_rotation(page_rotation(doc, page_id), delta)?;
    doc.get_dictionary_mut(page_id)?
        .set("Rotate", Object::Integer(rotation));
    Ok(rotation)
}

/// Width and height of the page's MediaBox in points, unrotated.
pub fn page_size(doc: &Document, page_id: ObjectId) -> (f64, f64) {
    inherited_attribute(doc, page_id, b"MediaBox")
        .and_then(rect_size)
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

fn rect_size(obj: &Object) -> Option<(f64, f64)> {
    let arr = obj.as_array().ok()?;
    let nums: Vec<f64> = arr
        .iter()
        .filter_map(|o| match o {
            Object::Real(f) => Some(*f as f64),
            Object::Integer(i) => Some(*i as f64),
            _ => None,
        })
        .collect();
    match nums.as_slice() {
        [x1, y1, x2, y2] => Some(((x2 - x1).abs(), (y2 - y1).abs())),
        _ => None,
    }
}

/// Save to `output`, refusing to write into a directory that does not exist.
pub fn write_pdf(doc: &mut Document, output: &Path) -> AppResult<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(AppError::Path(format!(
                "Output directory does not exist: {}",
                parent.display()
            )));
        }
    }
    doc.save(output)?;
    Ok(())
}
