//! PDF text extraction.

use lopdf::Document;
use tracing::debug;

use crate::error::{Error, Result};

/// Extract text from a multi-page PDF.
///
/// Pages yielding no extractable text are skipped silently; the remaining
/// page texts are joined with newlines. An all-empty PDF yields an empty
/// string, which still flows through the prompt templater downstream.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| Error::Validation(format!("file is not a readable PDF: {e}")))?;

    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    debug!(pages = pages.len(), "extracting PDF text");

    let mut texts = Vec::new();
    for page in pages {
        match doc.extract_text(&[page]) {
            Ok(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    texts.push(trimmed.to_string());
                }
            }
            // Unextractable pages (scans, broken streams) are skipped.
            Err(e) => debug!(page, "no extractable text: {e}"),
        }
    }

    Ok(texts.join("\n"))
}

// Build a minimal single-font PDF with one content stream per page text.
// `None` produces a page with no text at all. Shared with the runtime tests.
#[cfg(test)]
pub(crate) fn pdf_with_pages(page_texts: &[Option<&str>]) -> Vec<u8> {
    use lopdf::dictionary;
    use lopdf::{Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in page_texts {
        let content = match text {
            Some(text) => format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET"),
            None => String::new(),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(Object::Reference(page_id));
    }

    let kids_len = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => kids_len,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pages_are_skipped() {
        let bytes = pdf_with_pages(&[Some("first page"), None, Some("third page")]);
        let text = extract_pdf_text(&bytes).unwrap();
        assert!(text.contains("first page"));
        assert!(text.contains("third page"));
        // Two non-empty pages -> exactly one joining newline.
        assert_eq!(text.matches('\n').count(), 1);
    }

    #[test]
    fn all_empty_pdf_yields_empty_string() {
        let bytes = pdf_with_pages(&[None, None]);
        assert_eq!(extract_pdf_text(&bytes).unwrap(), "");
    }

    #[test]
    fn garbage_is_a_validation_error() {
        let err = extract_pdf_text(b"definitely not a pdf").unwrap_err();
        assert!(err.is_validation());
    }
}
