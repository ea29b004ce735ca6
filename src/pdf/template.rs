//! Template loading and page geometry

use std::path::{Path, PathBuf};

use lopdf::{Document, Object, ObjectId};

use crate::error::{Error, Result};

/// A loaded badge template
///
/// Loaded once per run and shared read-only across all names; every
/// stamping call clones the underlying document so template page objects
/// are never mutated in place.
#[derive(Debug)]
pub struct Template {
    path: PathBuf,
    doc: Document,
}

impl Template {
    /// Load and validate a template PDF
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let mut doc = Document::load(path)?;

        // Decompress once so overlay code can inspect content streams
        doc.decompress();

        if doc.get_pages().is_empty() {
            return Err(Error::EmptyPdf(path.to_path_buf()));
        }

        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    /// Number of pages in the template
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Path the template was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn document(&self) -> &Document {
        &self.doc
    }
}

/// Count pages by reading the Count field from the Pages dictionary
/// This is more reliable than get_pages() for nested page trees
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let catalog_ref = doc
        .trailer
        .get(b"Root")
        .map_err(|_| Error::General("No Root in trailer".to_string()))?;

    let catalog_id = match catalog_ref {
        Object::Reference(id) => *id,
        _ => return Err(Error::General("Root is not a reference".to_string())),
    };

    let catalog_dict = match doc.get_object(catalog_id)? {
        Object::Dictionary(dict) => dict,
        _ => return Err(Error::General("Catalog is not a dictionary".to_string())),
    };

    let pages_id = match catalog_dict.get(b"Pages") {
        Ok(Object::Reference(id)) => *id,
        _ => return Err(Error::General("No Pages reference in catalog".to_string())),
    };

    let pages_dict = match doc.get_object(pages_id)? {
        Object::Dictionary(dict) => dict,
        _ => return Err(Error::General("Pages is not a dictionary".to_string())),
    };

    match pages_dict.get(b"Count") {
        Ok(Object::Integer(n)) => Ok(*n as usize),
        _ => Err(Error::General("No Count in Pages".to_string())),
    }
}

/// Count the number of pages in a PDF file
pub fn count_pages(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    let page_count = count_pages_from_catalog(&doc)?;

    if page_count == 0 {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }

    Ok(page_count)
}

/// Resolve a page's MediaBox as [x1, y1, x2, y2]
///
/// The MediaBox may live on the page itself or be inherited from an
/// ancestor Pages node, so missing entries follow the Parent chain.
pub(crate) fn page_media_box(doc: &Document, page_id: ObjectId) -> Result<[f32; 4]> {
    let mut current = page_id;

    loop {
        let dict = match doc.get_object(current)? {
            Object::Dictionary(dict) => dict,
            _ => return Err(Error::General("Page node is not a dictionary".to_string())),
        };

        if let Ok(media_box) = dict.get(b"MediaBox") {
            let array = match media_box {
                Object::Array(array) => array.clone(),
                Object::Reference(id) => match doc.get_object(*id)? {
                    Object::Array(array) => array.clone(),
                    _ => return Err(Error::General("MediaBox is not an array".to_string())),
                },
                _ => return Err(Error::General("MediaBox is not an array".to_string())),
            };

            if array.len() != 4 {
                return Err(Error::General("MediaBox does not have 4 entries".to_string()));
            }

            let mut coords = [0.0f32; 4];
            for (slot, value) in coords.iter_mut().zip(array.iter()) {
                *slot = number_as_f32(doc, value)?;
            }
            return Ok(coords);
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => return Err(Error::General("Page has no MediaBox".to_string())),
        }
    }
}

/// Width and height of a MediaBox
pub(crate) fn media_box_size(media_box: &[f32; 4]) -> (f32, f32) {
    (
        (media_box[2] - media_box[0]).abs(),
        (media_box[3] - media_box[1]).abs(),
    )
}

fn number_as_f32(doc: &Document, object: &Object) -> Result<f32> {
    match object {
        Object::Integer(n) => Ok(*n as f32),
        Object::Real(r) => Ok(*r),
        Object::Reference(id) => number_as_f32(doc, doc.get_object(*id)?),
        _ => Err(Error::General("Expected a number in MediaBox".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_nonexistent_template() {
        let result = Template::load(Path::new("nonexistent.pdf"));
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    #[test]
    fn test_count_pages_nonexistent_file() {
        let result = count_pages(Path::new("nonexistent.pdf"));
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    #[test]
    fn test_media_box_size() {
        let letter = [0.0, 0.0, 612.0, 792.0];
        assert_eq!(media_box_size(&letter), (612.0, 792.0));

        // Offset origins still yield the same extent
        let offset = [10.0, 20.0, 622.0, 812.0];
        assert_eq!(media_box_size(&offset), (612.0, 792.0));
    }
}
