//! One-line-per-page document assembly.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use thiserror::Error;

/// Result type alias using [`PdfError`].
pub type PdfResult<T> = Result<T, PdfError>;

/// Errors raised while assembling a document.
#[derive(Debug, Error)]
pub enum PdfError {
    /// The underlying PDF library rejected the document.
    #[error("document assembly failed: {0}")]
    Assembly(#[from] lopdf::Error),
}

// A4 in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const FONT_SIZE: i64 = 20;
// Baseline of the single text line, measured from the page bottom.
const BASELINE_Y: i64 = PAGE_HEIGHT - 50;

/// Builder for a document with one centered text line per page.
///
/// # Example
///
/// ```
/// use pandora_pdf::DocumentBuilder;
///
/// let mut builder = DocumentBuilder::new();
/// builder.add_page("Document 0000000001");
/// builder.add_page("Document 0000000002");
/// let bytes = builder.finish().unwrap();
/// assert!(bytes.starts_with(b"%PDF"));
/// ```
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    page_lines: Vec<String>,
}

impl DocumentBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page carrying a single centered line.
    pub fn add_page(&mut self, line: impl Into<String>) -> &mut Self {
        self.page_lines.push(line.into());
        self
    }

    /// Number of pages added so far.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_lines.len()
    }

    /// Assemble and serialize the document.
    ///
    /// A builder with no pages produces a single blank-line page; a PDF
    /// page tree cannot be empty.
    pub fn finish(self) -> PdfResult<Vec<u8>> {
        let lines = if self.page_lines.is_empty() {
            vec![String::new()]
        } else {
            self.page_lines
        };

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

        let mut kids: Vec<Object> = Vec::with_capacity(lines.len());
        for line in &lines {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new(
                        "Tf",
                        vec![Object::Name(b"F1".to_vec()), Object::Integer(FONT_SIZE)],
                    ),
                    Operation::new(
                        "Td",
                        vec![
                            Object::Integer(centered_x(line)),
                            Object::Integer(BASELINE_Y),
                        ],
                    ),
                    Operation::new("Tj", vec![Object::string_literal(line.as_str())]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(PAGE_WIDTH),
                    Object::Integer(PAGE_HEIGHT),
                ],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).map_err(lopdf::Error::from)?;
        Ok(out)
    }
}

/// Horizontal start so the line sits centered on the page.
///
/// Uses the average Helvetica advance of roughly 0.55 em; exact metrics are
/// not tracked.
fn centered_x(line: &str) -> i64 {
    let width = line.len() as i64 * FONT_SIZE * 11 / 20;
    ((PAGE_WIDTH - width) / 2).max(0)
}
