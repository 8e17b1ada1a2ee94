// All core functionality is in docmeta-core
// This CLI acts as a thin wrapper around the core library

use std::path::Path;

// Re-export core types for convenience
pub use docmeta_core::*;

/// Content type from the file extension, for inputs given without one
pub fn guess_content_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match extension.as_str() {
        "html" | "htm" => "text/html",
        "xhtml" => "application/xhtml+xml",
        "xml" => "application/xml",
        "csv" => "text/csv",
        "txt" | "text" | "log" => "text/plain",
        "md" => "text/markdown",
        "json" => "application/json",
        _ => return None,
    };
    Some(content_type)
}

/// `<input stem>[_<config stem>]_docmeta.json`
pub fn default_output_path(input: &str, config: Option<&str>) -> String {
    let input_name = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let config_suffix = config
        .and_then(|p| Path::new(p).file_stem())
        .and_then(|s| s.to_str())
        .map(|s| format!("_{s}"))
        .unwrap_or_default();
    format!("{input_name}{config_suffix}_docmeta.json")
}
