//! services/api/src/adapters/pptx.rs
//!
//! Slide-deck output. Implements the `DocumentRenderer` port by writing a
//! PresentationML package with the `zip` crate: one master, a "Title Slide"
//! layout for the opening slide and a "Title and Content" layout for every
//! section.

use docsmith_core::assembly::{BodyLine, DocumentOutline};
use docsmith_core::ports::{DocumentRenderer, PortError, PortResult};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::adapters::xml_text::xml_safe;

const THEME: &str = include_str!("../../templates/pptx/theme1.xml");
const SLIDE_MASTER: &str = include_str!("../../templates/pptx/slideMaster1.xml");
const SLIDE_MASTER_RELS: &str = include_str!("../../templates/pptx/slideMaster1.xml.rels");
const TITLE_LAYOUT: &str = include_str!("../../templates/pptx/slideLayout1.xml");
const CONTENT_LAYOUT: &str = include_str!("../../templates/pptx/slideLayout2.xml");
const LAYOUT_RELS: &str = include_str!("../../templates/pptx/slideLayout.xml.rels");
const PRES_PROPS: &str = include_str!("../../templates/pptx/presProps.xml");
const TABLE_STYLES: &str = include_str!("../../templates/pptx/tableStyles.xml");
const ROOT_RELS: &str = include_str!("../../templates/pptx/root.rels");

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const PML_NAMESPACES: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const CT_PML: &str = "application/vnd.openxmlformats-officedocument.presentationml";

/// Relationship ids in `presentation.xml.rels` below this value are fixed parts.
const FIRST_SLIDE_REL_ID: usize = 5;
const FIRST_SLIDE_ID: usize = 256;

const TITLE_LAYOUT_PATH: &str = "../slideLayouts/slideLayout1.xml";
const CONTENT_LAYOUT_PATH: &str = "../slideLayouts/slideLayout2.xml";

/// Renders an outline as a `.pptx` deck.
///
/// Bullet lines carry a bullet character; plain lines have bullets switched
/// off, so the two kinds stay distinguishable on the slide.
#[derive(Clone, Default)]
pub struct PptxRenderer;

impl PptxRenderer {
    pub fn new() -> Self {
        Self
    }
}

/// One slide ready to be written: its XML and the layout it points at.
struct SlidePart {
    xml: String,
    layout_path: &'static str,
}

impl DocumentRenderer for PptxRenderer {
    fn render(&self, outline: &DocumentOutline) -> PortResult<Vec<u8>> {
        let mut slides = Vec::with_capacity(outline.sections.len() + 1);

        let subtitle = match &outline.intro {
            Some(topic) => text_paragraph(topic),
            None => empty_paragraph(""),
        };
        slides.push(SlidePart {
            xml: slide_xml(
                placeholder_shape(2, "Title 1", r#"<p:ph type="ctrTitle"/>"#, &text_paragraph(&outline.title)),
                placeholder_shape(3, "Subtitle 2", r#"<p:ph type="subTitle" idx="1"/>"#, &subtitle),
            ),
            layout_path: TITLE_LAYOUT_PATH,
        });

        for section in &outline.sections {
            let body = if section.body.is_empty() {
                empty_paragraph("")
            } else {
                section.body.iter().map(body_paragraph).collect()
            };
            slides.push(SlidePart {
                xml: slide_xml(
                    placeholder_shape(2, "Title 1", r#"<p:ph type="title"/>"#, &text_paragraph(&section.heading)),
                    placeholder_shape(3, "Content Placeholder 2", r#"<p:ph idx="1"/>"#, &body),
                ),
                layout_path: CONTENT_LAYOUT_PATH,
            });
        }

        package(&outline.title, &slides)
            .map_err(|e| PortError::Unexpected(format!("Failed to write pptx: {}", e)))
    }
}

//=========================================================================================
// Package assembly
//=========================================================================================

fn package(title: &str, slides: &[SlidePart]) -> zip::result::ZipResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    let mut put = |path: &str, contents: &str| -> zip::result::ZipResult<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file(path, options)?;
        writer.write_all(contents.as_bytes())?;
        Ok(())
    };

    put("[Content_Types].xml", &content_types(slides.len()))?;
    put("_rels/.rels", ROOT_RELS)?;
    put("docProps/core.xml", &core_properties(title))?;
    put("ppt/presentation.xml", &presentation(slides.len()))?;
    put("ppt/_rels/presentation.xml.rels", &presentation_rels(slides.len()))?;
    put("ppt/presProps.xml", PRES_PROPS)?;
    put("ppt/tableStyles.xml", TABLE_STYLES)?;
    put("ppt/theme/theme1.xml", THEME)?;
    put("ppt/slideMasters/slideMaster1.xml", SLIDE_MASTER)?;
    put("ppt/slideMasters/_rels/slideMaster1.xml.rels", SLIDE_MASTER_RELS)?;
    put("ppt/slideLayouts/slideLayout1.xml", TITLE_LAYOUT)?;
    put("ppt/slideLayouts/_rels/slideLayout1.xml.rels", LAYOUT_RELS)?;
    put("ppt/slideLayouts/slideLayout2.xml", CONTENT_LAYOUT)?;
    put("ppt/slideLayouts/_rels/slideLayout2.xml.rels", LAYOUT_RELS)?;

    for (i, slide) in slides.iter().enumerate() {
        let number = i + 1;
        put(&format!("ppt/slides/slide{}.xml", number), &slide.xml)?;
        put(
            &format!("ppt/slides/_rels/slide{}.xml.rels", number),
            &relationships(&[("rId1", "slideLayout", slide.layout_path)]),
        )?;
    }

    Ok(writer.finish()?.into_inner())
}

fn content_types(slide_count: usize) -> String {
    let mut xml = format!(
        r#"{XML_DECLARATION}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>"#
    );
    let overrides = [
        ("/ppt/presentation.xml", format!("{CT_PML}.presentation.main+xml")),
        ("/ppt/presProps.xml", format!("{CT_PML}.presProps+xml")),
        ("/ppt/tableStyles.xml", format!("{CT_PML}.tableStyles+xml")),
        ("/ppt/slideMasters/slideMaster1.xml", format!("{CT_PML}.slideMaster+xml")),
        ("/ppt/slideLayouts/slideLayout1.xml", format!("{CT_PML}.slideLayout+xml")),
        ("/ppt/slideLayouts/slideLayout2.xml", format!("{CT_PML}.slideLayout+xml")),
        ("/ppt/theme/theme1.xml", "application/vnd.openxmlformats-officedocument.theme+xml".to_string()),
        ("/docProps/core.xml", "application/vnd.openxmlformats-package.core-properties+xml".to_string()),
    ];
    for (part, content_type) in overrides {
        xml.push_str(&format!(
            r#"<Override PartName="{part}" ContentType="{content_type}"/>"#
        ));
    }
    let slide_overrides: String = (1..=slide_count)
        .map(|number| {
            format!(
                r#"<Override PartName="/ppt/slides/slide{number}.xml" ContentType="{CT_PML}.slide+xml"/>"#
            )
        })
        .collect();
    xml.push_str(&slide_overrides);
    xml.push_str("</Types>");
    xml
}

fn core_properties(title: &str) -> String {
    format!(
        r#"{XML_DECLARATION}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{}</dc:title></cp:coreProperties>"#,
        escape_xml(title)
    )
}

fn presentation(slide_count: usize) -> String {
    let slide_ids: String = (0..slide_count)
        .map(|i| {
            format!(
                r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                FIRST_SLIDE_ID + i,
                FIRST_SLIDE_REL_ID + i
            )
        })
        .collect();
    format!(
        r#"{XML_DECLARATION}<p:presentation {PML_NAMESPACES} saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{slide_ids}</p:sldIdLst><p:sldSz cx="9144000" cy="6858000" type="screen4x3"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
    )
}

fn presentation_rels(slide_count: usize) -> String {
    let slide_targets: Vec<(String, String)> = (0..slide_count)
        .map(|i| {
            (
                format!("rId{}", FIRST_SLIDE_REL_ID + i),
                format!("slides/slide{}.xml", i + 1),
            )
        })
        .collect();

    let mut entries: Vec<(&str, &str, &str)> = vec![
        ("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
        ("rId2", "theme", "theme/theme1.xml"),
        ("rId3", "presProps", "presProps.xml"),
        ("rId4", "tableStyles", "tableStyles.xml"),
    ];
    entries.extend(
        slide_targets
            .iter()
            .map(|(id, target)| (id.as_str(), "slide", target.as_str())),
    );
    relationships(&entries)
}

/// `(id, relationship type suffix, target)` triples as a `.rels` part.
fn relationships(entries: &[(&str, &str, &str)]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, kind, target)| {
            format!(r#"<Relationship Id="{id}" Type="{REL_NS}/{kind}" Target="{target}"/>"#)
        })
        .collect();
    format!(
        r#"{XML_DECLARATION}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{body}</Relationships>"#
    )
}

//=========================================================================================
// Slide XML
//=========================================================================================

fn slide_xml(title_shape: String, body_shape: String) -> String {
    format!(
        r#"{XML_DECLARATION}<p:sld {PML_NAMESPACES}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>{title_shape}{body_shape}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
    )
}

fn placeholder_shape(id: u32, name: &str, placeholder: &str, paragraphs: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{placeholder}</p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#
    )
}

const BULLET_PROPS: &str =
    r#"<a:pPr marL="342900" indent="-342900"><a:buFont typeface="Arial"/><a:buChar char="&#8226;"/></a:pPr>"#;
const PLAIN_PROPS: &str = r#"<a:pPr marL="0" indent="0"><a:buNone/></a:pPr>"#;

fn body_paragraph(line: &BodyLine) -> String {
    let props = if line.is_bullet() { BULLET_PROPS } else { PLAIN_PROPS };
    if line.text().is_empty() {
        empty_paragraph(props)
    } else {
        run_paragraph(props, line.text())
    }
}

fn text_paragraph(text: &str) -> String {
    if text.is_empty() {
        empty_paragraph("")
    } else {
        run_paragraph("", text)
    }
}

fn run_paragraph(props: &str, text: &str) -> String {
    format!(
        r#"<a:p>{props}<a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
        escape_xml(text)
    )
}

fn empty_paragraph(props: &str) -> String {
    format!(r#"<a:p>{props}<a:endParaRPr lang="en-US" dirty="0"/></a:p>"#)
}

/// Escapes markup characters and drops characters XML 1.0 cannot carry.
fn escape_xml(text: &str) -> String {
    let text = xml_safe(text);
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsmith_core::assembly::Section;
    use docsmith_core::domain::DocType;
    use std::io::Read;

    fn outline(sections: Vec<Section>) -> DocumentOutline {
        DocumentOutline {
            doc_type: DocType::Pptx,
            title: "Launch Plan".into(),
            intro: Some("Q3 <beta> & GA".into()),
            sections,
        }
    }

    fn open(bytes: Vec<u8>) -> zip::ZipArchive<Cursor<Vec<u8>>> {
        zip::ZipArchive::new(Cursor::new(bytes)).unwrap()
    }

    fn read_part(archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut xml = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn one_slide_per_section_plus_title_slide() {
        let sections = vec![
            Section { heading: "Goals".into(), body: vec![] },
            Section { heading: "Timeline".into(), body: vec![] },
        ];
        let mut archive = open(PptxRenderer::new().render(&outline(sections)).unwrap());
        let slide_parts = archive
            .file_names()
            .filter(|name| name.starts_with("ppt/slides/slide"))
            .count();
        assert_eq!(slide_parts, 3);

        let presentation = read_part(&mut archive, "ppt/presentation.xml");
        assert_eq!(presentation.matches("<p:sldId ").count(), 3);
        let content_types = read_part(&mut archive, "[Content_Types].xml");
        assert!(content_types.contains("/ppt/slides/slide3.xml"));
    }

    #[test]
    fn title_slide_uses_title_layout_and_escapes_topic() {
        let mut archive = open(PptxRenderer::new().render(&outline(vec![])).unwrap());
        let slide = read_part(&mut archive, "ppt/slides/slide1.xml");
        assert!(slide.contains("<a:t>Launch Plan</a:t>"));
        assert!(slide.contains("<a:t>Q3 &lt;beta&gt; &amp; GA</a:t>"));
        let rels = read_part(&mut archive, "ppt/slides/_rels/slide1.xml.rels");
        assert!(rels.contains("slideLayout1.xml"));
    }

    #[test]
    fn missing_topic_leaves_subtitle_empty() {
        let mut outline = outline(vec![]);
        outline.intro = None;
        let mut archive = open(PptxRenderer::new().render(&outline).unwrap());
        let slide = read_part(&mut archive, "ppt/slides/slide1.xml");
        assert_eq!(slide.matches("<a:t>").count(), 1);
    }

    #[test]
    fn bullets_and_paragraphs_are_distinguished() {
        let sections = vec![Section {
            heading: "Risks".into(),
            body: vec![
                BodyLine::Paragraph("Known issues:".into()),
                BodyLine::Bullet("Latency".into()),
                BodyLine::Paragraph(String::new()),
                BodyLine::Bullet("Cost".into()),
            ],
        }];
        let mut archive = open(PptxRenderer::new().render(&outline(sections)).unwrap());
        let slide = read_part(&mut archive, "ppt/slides/slide2.xml");
        assert!(slide.contains("<a:t>Risks</a:t>"));
        assert_eq!(slide.matches("<a:buChar").count(), 2);
        assert_eq!(slide.matches("<a:buNone/>").count(), 2);
        let known = slide.find("Known issues:").unwrap();
        let latency = slide.find("Latency").unwrap();
        let cost = slide.find("Cost").unwrap();
        assert!(known < latency && latency < cost);
        let rels = read_part(&mut archive, "ppt/slides/_rels/slide2.xml.rels");
        assert!(rels.contains("slideLayout2.xml"));
    }

    #[test]
    fn escape_drops_control_characters() {
        assert_eq!(escape_xml("a\u{1}b'c"), "ab&apos;c");
        assert_eq!(escape_xml("x\u{FFFF}<y>"), "x&lt;y&gt;");
    }

    #[test]
    fn package_parts_list_every_override_and_relationship() {
        let types = content_types(2);
        assert_eq!(types.matches("<Override ").count(), 10);
        assert!(types.contains(r#"<Override PartName="/ppt/slides/slide2.xml""#));
        assert!(types.ends_with("</Types>"));

        let rels = presentation_rels(2);
        assert_eq!(rels.matches("<Relationship ").count(), 6);
        assert!(rels.contains(r#"Id="rId6""#));
        assert!(rels.contains(r#"Target="slides/slide2.xml""#));
        assert!(rels.ends_with("</Relationships>"));
    }
}
