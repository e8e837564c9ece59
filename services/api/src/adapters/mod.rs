pub mod db;
pub mod docx;
pub mod generation_llm;
pub mod pptx;
pub mod xml_text;

pub use db::DbAdapter;
pub use docx::DocxRenderer;
pub use generation_llm::OpenAiGenerationAdapter;
pub use pptx::PptxRenderer;
