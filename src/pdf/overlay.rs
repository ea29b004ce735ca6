//! Badge overlay construction
//!
//! The badge is a transparent layer carrying a single centered line of
//! text, realized as a Form XObject sized to the page and invoked from a
//! content stream appended after the original page content, so the name
//! composites on top of the template artwork.
//!
//! PDF pages use a bottom-left origin: (0, 0) is the bottom-left corner
//! and y increases upward. Some generators (Google Docs among them) open
//! the page content with a `cm` operator that is not wrapped in q/Q, which
//! would drag appended content into the transformed space; the XObject
//! carries the inverse matrix for those pages so badge coordinates stay in
//! page space.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};

/// A PDF transformation matrix [a b c d e f]
/// where: x' = a*x + c*y + e, y' = b*x + d*y + f
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CoordTransform {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl CoordTransform {
    fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Inverse of this affine transform; singular matrices fall back to
    /// identity rather than producing garbage coordinates
    fn inverse(&self) -> Self {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-10 {
            return Self::identity();
        }

        Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        }
    }

    fn is_identity(&self) -> bool {
        (self.a - 1.0).abs() < 0.001
            && self.b.abs() < 0.001
            && self.c.abs() < 0.001
            && (self.d - 1.0).abs() < 0.001
            && self.e.abs() < 0.001
            && self.f.abs() < 0.001
    }
}

/// Horizontal offset that centers text of the given width on the page
///
/// Depends only on the page width, never on the height.
pub fn centered_x(page_width: f32, text_width: f32) -> f32 {
    (page_width - text_width) / 2.0
}

/// Build the badge content stream: one line of text at (x, y)
///
/// `name_bytes` is the WinAnsi-encoded name; the caller computes x from
/// the measured text width and y from the fixed baseline.
pub(crate) fn badge_content(name_bytes: &[u8], font_size: f32, x: f32, y: f32) -> Vec<u8> {
    let mut content = Vec::new();
    content.extend_from_slice(b"0 g\n");
    content.extend_from_slice(b"BT\n");
    content.extend_from_slice(format!("/F1 {} Tf\n", font_size).as_bytes());
    content.extend_from_slice(format!("1 0 0 1 {:.2} {:.2} Tm\n", x, y).as_bytes());
    content.push(b'(');
    content.extend_from_slice(&escape_pdf_bytes(name_bytes));
    content.extend_from_slice(b") Tj\n");
    content.extend_from_slice(b"ET\n");
    content
}

/// Escape special characters in a PDF string operand
fn escape_pdf_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(bytes.len());
    for &byte in bytes {
        match byte {
            b'\\' => escaped.extend_from_slice(b"\\\\"),
            b'(' => escaped.extend_from_slice(b"\\("),
            b')' => escaped.extend_from_slice(b"\\)"),
            b'\r' => escaped.extend_from_slice(b"\\r"),
            b'\n' => escaped.extend_from_slice(b"\\n"),
            _ => escaped.push(byte),
        }
    }
    escaped
}

/// Detect the transformation in effect at the start of a page's content
///
/// Returns identity when the page applies no persistent transform.
pub(crate) fn detect_page_transform(doc: &Document, page_id: ObjectId) -> Result<CoordTransform> {
    let page_dict = match doc.get_object(page_id)? {
        Object::Dictionary(dict) => dict,
        _ => return Ok(CoordTransform::identity()),
    };

    let content_ids: Vec<ObjectId> = match page_dict.get(b"Contents") {
        Ok(Object::Reference(id)) => vec![*id],
        Ok(Object::Array(array)) => array
            .iter()
            .filter_map(|object| {
                if let Object::Reference(id) = object {
                    Some(*id)
                } else {
                    None
                }
            })
            .collect(),
        _ => vec![],
    };

    // Only the first stream can establish a page-wide transform
    if let Some(content_id) = content_ids.first() {
        if let Ok(Object::Stream(stream)) = doc.get_object(*content_id) {
            let content_str = String::from_utf8_lossy(&stream.content);
            return Ok(initial_matrix(&content_str));
        }
    }

    Ok(CoordTransform::identity())
}

/// Parse an initial `cm` operator from a content stream
///
/// A transform wrapped in q/Q is restored before appended content runs
/// and is reported as identity; an unwrapped one persists and must be
/// counteracted.
fn initial_matrix(content: &str) -> CoordTransform {
    let content = content.trim();

    if let Some(cm_pos) = content.find(" cm") {
        let before_cm = &content[..cm_pos];
        let parts: Vec<&str> = before_cm.split_whitespace().collect();

        if parts.len() >= 6 {
            let start = parts.len() - 6;

            let has_q_before = parts[..start].iter().any(|&p| p == "q");
            let starts_with_q = content.starts_with("q ");

            if has_q_before || starts_with_q {
                return CoordTransform::identity();
            }

            let nums: Vec<f32> = parts[start..]
                .iter()
                .filter_map(|s| s.parse::<f32>().ok())
                .collect();

            if nums.len() == 6 {
                return CoordTransform {
                    a: nums[0],
                    b: nums[1],
                    c: nums[2],
                    d: nums[3],
                    e: nums[4],
                    f: nums[5],
                };
            }
        }
    }

    CoordTransform::identity()
}

/// Create the badge Form XObject for one page
///
/// The BBox matches the page's MediaBox extent so badge coordinates are
/// page coordinates. The Matrix is the inverse of any persistent page
/// transform (identity otherwise).
pub(crate) fn create_badge_xobject(
    doc: &mut Document,
    content: Vec<u8>,
    font_id: ObjectId,
    page_size: (f32, f32),
    page_transform: &CoordTransform,
) -> Result<ObjectId> {
    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));

    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));

    let mut xobject_dict = Dictionary::new();
    xobject_dict.set("Type", Object::Name(b"XObject".to_vec()));
    xobject_dict.set("Subtype", Object::Name(b"Form".to_vec()));
    xobject_dict.set("FormType", Object::Integer(1));
    xobject_dict.set(
        "BBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(page_size.0),
            Object::Real(page_size.1),
        ]),
    );

    let matrix = if page_transform.is_identity() {
        CoordTransform::identity()
    } else {
        page_transform.inverse()
    };
    xobject_dict.set(
        "Matrix",
        Object::Array(vec![
            Object::Real(matrix.a),
            Object::Real(matrix.b),
            Object::Real(matrix.c),
            Object::Real(matrix.d),
            Object::Real(matrix.e),
            Object::Real(matrix.f),
        ]),
    );
    xobject_dict.set("Resources", Object::Dictionary(resources));

    let xobject_stream = Stream::new(xobject_dict, content);

    Ok(doc.add_object(Object::Stream(xobject_stream)))
}

/// Register the badge XObject in the page's resources
///
/// The page's effective Resources dictionary (its own, or one inherited
/// through the Parent chain) is copied onto the page itself with the
/// badge entry added, so every output page owns its resources.
pub(crate) fn add_badge_resources(
    doc: &mut Document,
    page_id: ObjectId,
    xobject_id: ObjectId,
) -> Result<()> {
    let mut resources = effective_resources(doc, page_id);

    let mut xobjects = if let Ok(Object::Dictionary(existing)) = resources.get(b"XObject") {
        existing.clone()
    } else {
        Dictionary::new()
    };
    xobjects.set("Badge", Object::Reference(xobject_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    let page_obj = doc.get_object_mut(page_id)?;
    if let Object::Dictionary(ref mut page_dict) = page_obj {
        page_dict.set("Resources", Object::Dictionary(resources));
    }

    Ok(())
}

/// The Resources dictionary in effect for a page, following Parent links
/// for inherited dictionaries and dereferencing indirect ones
fn effective_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut current = page_id;

    loop {
        let dict = match doc.get_object(current) {
            Ok(Object::Dictionary(dict)) => dict,
            _ => return Dictionary::new(),
        };

        if let Ok(resources) = dict.get(b"Resources") {
            return match resources {
                Object::Dictionary(resources_dict) => resources_dict.clone(),
                Object::Reference(resources_id) => match doc.get_object(*resources_id) {
                    Ok(Object::Dictionary(resources_dict)) => resources_dict.clone(),
                    _ => Dictionary::new(),
                },
                _ => Dictionary::new(),
            };
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => return Dictionary::new(),
        }
    }
}

/// Append a content stream to a page's Contents
///
/// The badge invocation goes after the original content so the name is
/// drawn on top, not covered by background fills.
pub(crate) fn append_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    new_content_id: ObjectId,
) -> Result<()> {
    let page_obj = doc.get_object_mut(page_id)?;

    let page_dict = match page_obj {
        Object::Dictionary(ref mut dict) => dict,
        _ => return Err(Error::General("Page is not a dictionary".to_string())),
    };

    let existing_content = page_dict.get(b"Contents").ok().cloned();

    match existing_content {
        Some(Object::Reference(content_id)) => {
            page_dict.set(
                "Contents",
                Object::Array(vec![
                    Object::Reference(content_id),
                    Object::Reference(new_content_id),
                ]),
            );
        }
        Some(Object::Array(mut content_array)) => {
            content_array.push(Object::Reference(new_content_id));
            page_dict.set("Contents", Object::Array(content_array));
        }
        _ => {
            page_dict.set(
                "Contents",
                Object::Array(vec![Object::Reference(new_content_id)]),
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_x() {
        // (W - T) / 2, independent of page height
        assert_eq!(centered_x(612.0, 100.0), 256.0);
        assert_eq!(centered_x(612.0, 0.0), 306.0);
        assert_eq!(centered_x(200.0, 300.0), -50.0);
    }

    #[test]
    fn test_badge_content_operators() {
        let content = badge_content(b"Jane Doe", 17.0, 256.0, 44.0);
        let text = String::from_utf8(content).unwrap();

        assert!(text.contains("/F1 17 Tf"));
        assert!(text.contains("1 0 0 1 256.00 44.00 Tm"));
        assert!(text.contains("(Jane Doe) Tj"));
        assert!(text.starts_with("0 g\n"));
        assert!(text.contains("BT\n") && text.contains("ET\n"));
    }

    #[test]
    fn test_escape_pdf_bytes() {
        assert_eq!(escape_pdf_bytes(b"plain"), b"plain".to_vec());
        assert_eq!(escape_pdf_bytes(b"a(b)c"), b"a\\(b\\)c".to_vec());
        assert_eq!(escape_pdf_bytes(b"back\\slash"), b"back\\\\slash".to_vec());
    }

    #[test]
    fn test_initial_matrix_unwrapped_transform() {
        // Google-Docs-style content: cm not wrapped in q/Q
        let transform = initial_matrix(".24 0 0 -.24 0 792 cm\n0 0 612 792 re W n");
        assert!(!transform.is_identity());
        assert_eq!(transform.a, 0.24);
        assert_eq!(transform.d, -0.24);
        assert_eq!(transform.f, 792.0);
    }

    #[test]
    fn test_initial_matrix_wrapped_transform_is_identity() {
        let transform = initial_matrix("q 0.75 0 0 0.75 0 0 cm\n... Q");
        assert!(transform.is_identity());
    }

    #[test]
    fn test_initial_matrix_no_transform() {
        let transform = initial_matrix("BT /F1 12 Tf (hello) Tj ET");
        assert!(transform.is_identity());
    }

    #[test]
    fn test_inverse_round_trip() {
        let transform = CoordTransform {
            a: 0.24,
            b: 0.0,
            c: 0.0,
            d: -0.24,
            e: 0.0,
            f: 792.0,
        };
        let inverse = transform.inverse();

        // Applying the inverse to a transformed point recovers the original
        let (x, y) = (100.0f32, 44.0f32);
        let (tx, ty) = (
            transform.a * x + transform.c * y + transform.e,
            transform.b * x + transform.d * y + transform.f,
        );
        let (rx, ry) = (
            inverse.a * tx + inverse.c * ty + inverse.e,
            inverse.b * tx + inverse.d * ty + inverse.f,
        );

        assert!((rx - x).abs() < 0.01);
        assert!((ry - y).abs() < 0.01);
    }

    #[test]
    fn test_singular_matrix_inverse_is_identity() {
        let singular = CoordTransform {
            a: 0.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            e: 5.0,
            f: 5.0,
        };
        assert!(singular.inverse().is_identity());
    }
}
