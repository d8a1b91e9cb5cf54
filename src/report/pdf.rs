//! Text-only PDF rendering.
//!
//! A4 pages, manual y-cursor, page break on overflow. No images, no chart
//! rendering: the export is the textual subset of the report outline.

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use super::outline::Block;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_X: f32 = 12.0;
const TOP_Y: f32 = 14.0;
/// Past this distance from the top of the page, start a new page.
const OVERFLOW_Y: f32 = 282.0;
const LINE_STEP: f32 = 6.0;

const TITLE_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 11.0;

/// Rough character capacity of an 11pt line across the printable width.
const WRAP_CHARS: usize = 90;

/// Word-wrap text to a line capacity. Overlong single words are kept on
/// their own line rather than split.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Cursor, measured from the top of the page.
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> anyhow::Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| anyhow::anyhow!("Failed to load PDF font: {}", e))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| anyhow::anyhow!("Failed to load PDF font: {}", e))?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: TOP_Y,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = TOP_Y;
    }

    /// Write one line at the cursor (page-breaking first if needed), then
    /// advance by `step`.
    fn line(&mut self, text: &str, size: f32, bold: bool, step: f32) {
        if self.y > OVERFLOW_Y {
            self.new_page();
        }
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(text, size, Mm(MARGIN_X), Mm(PAGE_HEIGHT - self.y), font);
        self.y += step;
    }

    fn title(&mut self, text: &str) {
        self.line(text, TITLE_SIZE, true, 8.0);
    }

    fn heading(&mut self, text: &str) {
        self.line(text, HEADING_SIZE, true, LINE_STEP);
    }

    fn paragraph(&mut self, text: &str) {
        for line in wrap(text, WRAP_CHARS) {
            self.line(&line, BODY_SIZE, false, LINE_STEP);
        }
        self.y += 1.0;
    }

    fn finish(self) -> anyhow::Result<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| anyhow::anyhow!("Failed to serialize PDF: {}", e))
    }
}

/// Render an outline into PDF bytes.
pub fn render_pdf(blocks: &[Block]) -> anyhow::Result<Vec<u8>> {
    let title = blocks
        .iter()
        .find_map(|b| match b {
            Block::Title(t) => Some(t.as_str()),
            _ => None,
        })
        .unwrap_or("Report");

    let mut writer = PdfWriter::new(title)?;
    for block in blocks {
        match block {
            Block::Title(text) => writer.title(text),
            Block::Heading(text) => writer.heading(text),
            Block::Paragraph(text) => writer.paragraph(text),
            Block::Bullet(text) => writer.paragraph(&format!("- {}", text)),
        }
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_short_text() {
        assert_eq!(wrap("Rows: 10", 90), vec!["Rows: 10"]);
    }

    #[test]
    fn test_wrap_long_text_splits_on_words() {
        let text = "alpha beta gamma delta";
        let lines = wrap(text, 11);
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn test_wrap_empty_text_yields_blank_line() {
        assert_eq!(wrap("", 90), vec![""]);
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let blocks = vec![
            Block::Title("DataPulse Analysis Report".to_string()),
            Block::Heading("Data Profile".to_string()),
            Block::Paragraph("Rows: 120    Columns: 5".to_string()),
            Block::Bullet("t1".to_string()),
        ];
        let bytes = render_pdf(&blocks).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_paginates_long_reports() {
        // Enough paragraphs to overflow a single A4 page.
        let mut blocks = vec![Block::Title("Report".to_string())];
        for i in 0..120 {
            blocks.push(Block::Paragraph(format!("Line {}", i)));
        }
        let bytes = render_pdf(&blocks).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        // Each page carries its own MediaBox; two of them means the
        // overflow break fired.
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.matches("MediaBox").count() >= 2);
    }
}
