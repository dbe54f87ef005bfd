//! Structured output: the documentation value itself, pretty-printed.

use super::DocRenderer;
use crate::doc_builder::Documentation;
use crate::error::Result;

pub struct JsonRenderer;

impl DocRenderer for JsonRenderer {
    fn render(&self, doc: &Documentation) -> Result<String> {
        Ok(serde_json::to_string_pretty(doc)?)
    }
}
