//! The stamping pipeline
//!
//! For one name and one template, produces a duplex-ready PDF: every
//! template page gets the name overlaid, and every stamped page appears
//! twice in a row so double-sided printing yields identical content on
//! both sides of each sheet.

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::font::{encode_win_ansi, BadgeFont};
use crate::pdf::embed::embed_badge_font;
use crate::pdf::overlay::{
    add_badge_resources, append_page_content, badge_content, centered_x, create_badge_xobject,
    detect_page_transform,
};
use crate::pdf::template::{media_box_size, page_media_box, Template};

/// Default text size for the stamped name, in points
pub const DEFAULT_FONT_SIZE: f32 = 17.0;

/// Baseline of the stamped name, measured up from the page's bottom edge.
/// A fixed offset, not proportional to page height.
const BASELINE_Y: f32 = 44.0;

/// Options for stamping a badge
#[derive(Debug, Clone)]
pub struct StampOptions {
    /// Text size for the stamped name in points
    pub font_size: f32,
}

impl Default for StampOptions {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

/// Stamp one name onto the template and write the duplex PDF
///
/// The output lands at `<output_dir>/<name>.pdf`, overwriting any existing
/// file at that path (last writer wins when two names collide). Returns
/// the path of the written file.
///
/// # Example
///
/// ```no_run
/// use duplex_badges::font::BadgeFont;
/// use duplex_badges::pdf::{stamp_badge, StampOptions, Template};
/// use std::path::Path;
///
/// let font = BadgeFont::load(Path::new("badge.ttf")).expect("font");
/// let template = Template::load(Path::new("template.pdf")).expect("template");
///
/// let path = stamp_badge(&template, "Jane Doe", Path::new("output"), &font,
///                        &StampOptions::default())
///     .expect("Failed to stamp badge");
/// println!("wrote {}", path.display());
/// ```
pub fn stamp_badge(
    template: &Template,
    name: &str,
    output_dir: &Path,
    font: &BadgeFont,
    options: &StampOptions,
) -> Result<PathBuf> {
    validate_name(name)?;

    // Idempotent; concurrent callers racing here is fine
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join(format!("{}.pdf", name));

    // Fresh copy per badge so template page objects are never mutated in
    // place; merging an overlay onto a shared page would compound across
    // names.
    let mut doc = template.document().clone();

    let font_id = embed_badge_font(&mut doc, font)?;

    let page_ids: Vec<ObjectId> = doc.get_pages().into_iter().map(|(_, id)| id).collect();

    let encoded_name = encode_win_ansi(name);
    let mut output_pages: Vec<ObjectId> = Vec::with_capacity(page_ids.len() * 2);

    for page_id in page_ids {
        let media_box = page_media_box(&doc, page_id)?;
        let (page_width, page_height) = media_box_size(&media_box);

        let text_width = font.measure(name, options.font_size)?;
        let x = centered_x(page_width, text_width);

        let transform = detect_page_transform(&doc, page_id)?;
        let content = badge_content(&encoded_name, options.font_size, x, BASELINE_Y);
        let xobject_id = create_badge_xobject(
            &mut doc,
            content,
            font_id,
            (page_width, page_height),
            &transform,
        )?;

        add_badge_resources(&mut doc, page_id, xobject_id)?;

        let invoke_id = doc.add_object(Stream::new(
            Dictionary::new(),
            b"q\n/Badge Do\nQ\n".to_vec(),
        ));
        append_page_content(&mut doc, page_id, invoke_id)?;

        // Inherited attributes must move onto the page before it is
        // reparented under the flat tree built below
        own_media_box(&mut doc, page_id, &media_box)?;

        // The duplex back: a fresh page object sharing the stamped
        // content streams, so both sides render identically
        let twin_id = clone_page(&mut doc, page_id)?;

        output_pages.push(page_id);
        output_pages.push(twin_id);
    }

    rebuild_page_tree(&mut doc, &output_pages)?;

    doc.compress();
    doc.save(&output_path)?;

    Ok(output_path)
}

/// Reject names that cannot be used verbatim as a filename
///
/// Names are used as-is for the output path, so path separators and NUL
/// would escape the output directory or fail at write time in surprising
/// ways. Decided here rather than silently passed through.
fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidName("name is empty".to_string()));
    }
    if name == "." || name == ".." {
        return Err(Error::InvalidName(format!("'{}' is a reserved path", name)));
    }
    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        return Err(Error::InvalidName(format!(
            "'{}' contains a path separator",
            name
        )));
    }
    Ok(())
}

/// Duplicate a finished page dictionary under a fresh object id
fn clone_page(doc: &mut Document, page_id: ObjectId) -> Result<ObjectId> {
    let page_dict = match doc.get_object(page_id)? {
        Object::Dictionary(dict) => dict.clone(),
        _ => return Err(Error::General("Page is not a dictionary".to_string())),
    };

    Ok(doc.add_object(Object::Dictionary(page_dict)))
}

/// Ensure a page carries its own MediaBox before reparenting
fn own_media_box(doc: &mut Document, page_id: ObjectId, media_box: &[f32; 4]) -> Result<()> {
    let page_obj = doc.get_object_mut(page_id)?;

    if let Object::Dictionary(ref mut page_dict) = page_obj {
        if page_dict.get(b"MediaBox").is_err() {
            page_dict.set(
                "MediaBox",
                Object::Array(media_box.iter().map(|&v| Object::Real(v)).collect()),
            );
        }
    }

    Ok(())
}

/// Build a flat page tree over the given pages
///
/// A fresh Pages node and Catalog replace the template's tree; the old
/// nodes stay in the file as unreferenced objects, which readers ignore.
fn rebuild_page_tree(doc: &mut Document, page_ids: &[ObjectId]) -> Result<()> {
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(page_ids.len() as i64));
    pages_dict.set("Kids", Object::Array(kids));

    let catalog_id = doc.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
    doc.objects.insert(catalog_id, Object::Dictionary(catalog));

    doc.trailer.set("Root", Object::Reference(catalog_id));

    for &page_id in page_ids {
        if let Ok(page_object) = doc.get_object_mut(page_id) {
            if let Object::Dictionary(ref mut dict) = page_object {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_accepts_ordinary_names() {
        assert!(validate_name("Jane Doe").is_ok());
        assert!(validate_name("O'Brien").is_ok());
        assert!(validate_name("Ren\u{E9}").is_ok());
    }

    #[test]
    fn test_validate_name_rejects_separators() {
        assert!(matches!(
            validate_name("a/b").unwrap_err(),
            Error::InvalidName(_)
        ));
        assert!(matches!(
            validate_name("a\\b").unwrap_err(),
            Error::InvalidName(_)
        ));
        assert!(matches!(
            validate_name("nul\0byte").unwrap_err(),
            Error::InvalidName(_)
        ));
    }

    #[test]
    fn test_validate_name_rejects_reserved_paths() {
        assert!(validate_name(".").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
    }

    #[test]
    fn test_default_options() {
        let options = StampOptions::default();
        assert_eq!(options.font_size, 17.0);
    }
}
