//! services/api/src/adapters/docx.rs
//!
//! Word-processor output. Implements the `DocumentRenderer` port with `docx-rs`.

use docsmith_core::assembly::{BodyLine, DocumentOutline};
use docsmith_core::ports::{DocumentRenderer, PortError, PortResult};
use docx_rs::{
    AbstractNumbering, Docx, IndentLevel, Level, LevelJc, LevelText, NumberFormat, Numbering,
    NumberingId, Paragraph, Run, SpecialIndentType, Start, Style, StyleType,
};
use std::io::Cursor;

use crate::adapters::xml_text::xml_safe;

const TITLE_STYLE: &str = "Heading1";
const SECTION_STYLE: &str = "Heading2";
const BULLET_NUMBERING_ID: usize = 1;

/// Renders an outline as a `.docx` file: Heading 1 title, a topic paragraph,
/// then a Heading 2 plus body paragraphs per section.
#[derive(Clone, Default)]
pub struct DocxRenderer;

impl DocxRenderer {
    pub fn new() -> Self {
        Self
    }

    fn base_document() -> Docx {
        Docx::new()
            .add_style(
                Style::new(TITLE_STYLE, StyleType::Paragraph)
                    .name("Heading 1")
                    .size(32)
                    .bold(),
            )
            .add_style(
                Style::new(SECTION_STYLE, StyleType::Paragraph)
                    .name("Heading 2")
                    .size(26)
                    .bold(),
            )
            .add_abstract_numbering(
                AbstractNumbering::new(BULLET_NUMBERING_ID).add_level(
                    Level::new(
                        0,
                        Start::new(1),
                        NumberFormat::new("bullet"),
                        LevelText::new("•"),
                        LevelJc::new("left"),
                    )
                    .indent(Some(720), Some(SpecialIndentType::Hanging(360)), None, None),
                ),
            )
            .add_numbering(Numbering::new(BULLET_NUMBERING_ID, BULLET_NUMBERING_ID))
    }
}

fn text_paragraph(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(xml_safe(text).into_owned()))
}

fn body_paragraph(line: &BodyLine) -> Paragraph {
    match line {
        BodyLine::Paragraph(text) => text_paragraph(text),
        BodyLine::Bullet(text) => text_paragraph(text).numbering(
            NumberingId::new(BULLET_NUMBERING_ID),
            IndentLevel::new(0),
        ),
    }
}

impl DocumentRenderer for DocxRenderer {
    fn render(&self, outline: &DocumentOutline) -> PortResult<Vec<u8>> {
        let mut doc = Self::base_document()
            .add_paragraph(text_paragraph(&outline.title).style(TITLE_STYLE));

        if let Some(topic) = &outline.intro {
            doc = doc.add_paragraph(text_paragraph(&format!("Topic: {}", topic)));
        }

        for section in &outline.sections {
            doc = doc.add_paragraph(text_paragraph(&section.heading).style(SECTION_STYLE));
            for line in &section.body {
                doc = doc.add_paragraph(body_paragraph(line));
            }
        }

        let mut buffer = Cursor::new(Vec::new());
        doc.build()
            .pack(&mut buffer)
            .map_err(|e| PortError::Unexpected(format!("Failed to write docx: {}", e)))?;
        Ok(buffer.into_inner())
    }
}
