//! services/api/src/adapters/xml_text.rs
//!
//! Character filtering shared by the DOCX and PPTX renderers. Generated text
//! can carry characters XML 1.0 does not allow, and a single one makes the
//! whole package unreadable.

use std::borrow::Cow;

/// True for characters allowed in an XML 1.0 document.
pub fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Drops every character XML 1.0 cannot carry. Borrows when nothing changes.
pub fn xml_safe(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| is_xml_char(c)).collect())
    }
}
