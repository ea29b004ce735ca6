//! TrueType font embedding
//!
//! Embeds the badge typeface directly into the output PDF so badges render
//! correctly on any system, regardless of whether the font is installed.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::Result;
use crate::font::BadgeFont;

/// Embed the badge font into a document and return its object id
///
/// Produces a TrueType font with WinAnsiEncoding, a FontDescriptor built
/// from the loaded face's metrics, and the raw TTF data as a FontFile2
/// stream. Embedded once per output document and shared by all pages.
pub fn embed_badge_font(doc: &mut Document, font: &BadgeFont) -> Result<ObjectId> {
    // Font stream object (the actual TTF data)
    let mut font_stream_dict = Dictionary::new();
    font_stream_dict.set("Length1", Object::Integer(font.data().len() as i64));

    let font_stream = Stream {
        dict: font_stream_dict,
        content: font.data().to_vec(),
        allows_compression: true,
        start_position: None,
    };
    let font_stream_id = doc.add_object(Object::Stream(font_stream));

    // Font descriptor with metrics taken from the parsed face
    let mut font_descriptor = Dictionary::new();
    font_descriptor.set("Type", Object::Name(b"FontDescriptor".to_vec()));
    font_descriptor.set("FontName", Object::Name(font.base_name().as_bytes().to_vec()));
    font_descriptor.set("Flags", Object::Integer(32)); // Nonsymbolic
    font_descriptor.set(
        "FontBBox",
        Object::Array(font.scaled_bbox().iter().map(|&v| Object::Integer(v)).collect()),
    );
    font_descriptor.set("ItalicAngle", Object::Integer(0));
    font_descriptor.set("Ascent", Object::Integer(font.scaled_ascent()));
    font_descriptor.set("Descent", Object::Integer(font.scaled_descent()));
    font_descriptor.set("CapHeight", Object::Integer(font.scaled_cap_height()));
    font_descriptor.set("StemV", Object::Integer(80));
    font_descriptor.set("FontFile2", Object::Reference(font_stream_id));

    let font_descriptor_id = doc.add_object(Object::Dictionary(font_descriptor));

    // TrueType font with WinAnsiEncoding, so the badge text can be written
    // as simple single-byte strings
    let mut font_dict = Dictionary::new();
    font_dict.set("Type", Object::Name(b"Font".to_vec()));
    font_dict.set("Subtype", Object::Name(b"TrueType".to_vec()));
    font_dict.set("BaseFont", Object::Name(font.base_name().as_bytes().to_vec()));
    font_dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    font_dict.set("FontDescriptor", Object::Reference(font_descriptor_id));
    font_dict.set("FirstChar", Object::Integer(32));
    font_dict.set("LastChar", Object::Integer(255));

    // Widths array for chars 32-255, computed from the face's advances
    let widths = font.win_ansi_widths()?;
    font_dict.set(
        "Widths",
        Object::Array(widths.into_iter().map(Object::Integer).collect()),
    );

    let font_id = doc.add_object(Object::Dictionary(font_dict));
    Ok(font_id)
}
