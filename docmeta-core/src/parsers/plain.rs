use super::ContentParser;
use crate::types::Metadata;
use anyhow::Result;

/// Passes content through, replacing invalid UTF-8 sequences
pub struct PlainTextParser;

impl ContentParser for PlainTextParser {
    fn parse(&self, _reference: &str, content: &[u8], _metadata: &mut Metadata) -> Result<Vec<u8>> {
        Ok(String::from_utf8_lossy(content).into_owned().into_bytes())
    }

    fn name(&self) -> &str {
        "PlainTextParser"
    }

    fn supports_content_type(&self, content_type: &str) -> bool {
        content_type.trim().to_lowercase().starts_with("text/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut metadata = Metadata::new();
        let out = PlainTextParser
            .parse("doc", b"caf\xE9 ok", &mut metadata)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "caf\u{FFFD} ok");
        assert!(metadata.is_empty());
    }
}
