//! crates/docsmith_core/src/assembly.rs
//!
//! Turns a project and its nodes into a format-neutral outline. Renderers in
//! the `api` service serialize the outline into DOCX or PPTX bytes.

use crate::domain::{DocType, Node, Project};

/// One classified line of a node's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyLine {
    Paragraph(String),
    Bullet(String),
}

impl BodyLine {
    pub fn text(&self) -> &str {
        match self {
            BodyLine::Paragraph(text) | BodyLine::Bullet(text) => text,
        }
    }

    pub fn is_bullet(&self) -> bool {
        matches!(self, BodyLine::Bullet(_))
    }
}

/// A section (docx) or slide (pptx) headed by a node title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: String,
    pub body: Vec<BodyLine>,
}

/// The logical document tree shared by both output formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutline {
    pub doc_type: DocType,
    pub title: String,
    /// The project's main topic, present only when non-empty.
    pub intro: Option<String>,
    pub sections: Vec<Section>,
}

/// Classifies a single line. `- ` and `* ` (after trimming) mark bullets.
pub fn classify_line(line: &str) -> BodyLine {
    let trimmed = line.trim();
    match trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
    {
        Some(rest) => BodyLine::Bullet(rest.trim().to_string()),
        None => BodyLine::Paragraph(line.to_string()),
    }
}

/// Splits node content on line breaks and classifies every line.
///
/// Empty lines are kept as empty paragraphs.
pub fn split_content(content: &str) -> Vec<BodyLine> {
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .map(classify_line)
        .collect()
}

/// Orders nodes by `idx`. The sort is stable, so equal indices keep their
/// input order.
pub fn ordered_nodes(nodes: &[Node]) -> Vec<&Node> {
    let mut ordered: Vec<&Node> = nodes.iter().collect();
    ordered.sort_by_key(|node| node.idx);
    ordered
}

/// Builds the outline for `project` using `doc_type` as the target format.
pub fn build_outline(project: &Project, doc_type: DocType) -> DocumentOutline {
    let title = if project.title.is_empty() {
        doc_type.fallback_title().to_string()
    } else {
        project.title.clone()
    };

    let intro = project
        .main_prompt
        .as_deref()
        .filter(|topic| !topic.is_empty())
        .map(str::to_string);

    let sections = ordered_nodes(&project.nodes)
        .into_iter()
        .map(|node| Section {
            heading: node.title.clone().unwrap_or_default(),
            body: match node.content_current.as_deref() {
                Some(content) if !content.is_empty() => split_content(content),
                _ => Vec::new(),
            },
        })
        .collect();

    DocumentOutline {
        doc_type,
        title,
        intro,
        sections,
    }
}
