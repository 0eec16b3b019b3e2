use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

/// One node of the serialized DOM fragment the capture script saves.
/// Every field is optional in the dump; absent keys deserialize to `None`
/// so the locator and extractor can validate exactly the paths they need.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNode {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub children: Vec<RawNode>,
}

impl RawNode {
    pub fn child(&self, idx: usize) -> Result<&RawNode> {
        self.children.get(idx).ok_or_else(|| {
            anyhow!("missing child {idx} (node has {})", self.children.len())
        })
    }

    pub fn text_value(&self) -> Result<&str> {
        self.text.as_deref().ok_or_else(|| anyhow!("node has no text"))
    }

    pub fn href_value(&self) -> Result<&str> {
        self.href.as_deref().ok_or_else(|| anyhow!("node has no href"))
    }

    pub fn class_value(&self) -> Result<&str> {
        self.class.as_deref().ok_or_else(|| anyhow!("node has no class"))
    }
}

pub fn load_document(path: &Path) -> Result<Vec<RawNode>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read history dump {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid history json in {}", path.display()))
}
