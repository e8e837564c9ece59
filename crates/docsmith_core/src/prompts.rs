//! crates/docsmith_core/src/prompts.rs
//!
//! Prompt templates sent to the text generation model.

/// Prompt for producing fresh content for a node.
pub fn generation_prompt(title: Option<&str>, main_topic: Option<&str>) -> String {
    format!(
        "Generate content for the document section:\nTitle: {}\nMain Topic: {}",
        title.unwrap_or_default(),
        main_topic.unwrap_or_default()
    )
}

/// Prompt for rewriting a node's existing content per a user instruction.
pub fn refinement_prompt(title: Option<&str>, content: Option<&str>, instruction: &str) -> String {
    format!(
        "Refine the existing content.\nSection Title: {}\nExisting Content: {}\nRefinement Instruction: {}",
        title.unwrap_or_default(),
        content.unwrap_or_default(),
        instruction
    )
}
