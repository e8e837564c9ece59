//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document for the document-generation API.
//!
//! Usage: `openapi [OUTPUT]`. OUTPUT defaults to `openapi.json`; `-` prints
//! the document to stdout instead.

use api_lib::web::rest::ApiDoc;
use std::path::PathBuf;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

#[derive(Debug, PartialEq)]
enum Output {
    Stdout,
    File(PathBuf),
}

fn output_from_args(mut args: impl Iterator<Item = String>) -> Output {
    match args.next().as_deref() {
        Some("-") => Output::Stdout,
        Some(path) => Output::File(PathBuf::from(path)),
        None => Output::File(PathBuf::from(DEFAULT_OUTPUT)),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let document = ApiDoc::openapi().to_pretty_json()?;
    match output_from_args(std::env::args().skip(1)) {
        Output::Stdout => println!("{}", document),
        Output::File(path) => {
            std::fs::write(&path, document)?;
            eprintln!(
                "OpenAPI document with {} paths written to {}",
                ApiDoc::openapi().paths.paths.len(),
                path.display()
            );
        }
    }
    Ok(())
}
