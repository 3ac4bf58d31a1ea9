use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    captions: HashMap<String, String>,
    compositions: HashMap<String, CompositionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CompositionEntry {
    Path(String),
    Detailed {
        options: String,
        #[serde(default)]
        captions: Option<String>,
    },
}

impl CompositionEntry {
    fn options_path(&self) -> &str {
        match self {
            CompositionEntry::Path(path) => path,
            CompositionEntry::Detailed { options, .. } => options,
        }
    }

    fn captions_key(&self) -> Option<&str> {
        match self {
            CompositionEntry::Path(_) => None,
            CompositionEntry::Detailed { captions, .. } => captions.as_deref(),
        }
    }
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Caption files (SRT / WebVTT) as raw text.
pub mod captions {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.captions.keys().cloned().collect()
    }

    pub fn text(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.captions, "caption", name)?;
        read_to_string(rel)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.captions, "caption", name)?;
        Ok(resolve_path(rel))
    }
}

/// Engine option documents, optionally paired with a caption fixture.
pub mod compositions {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.compositions.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.compositions, "composition", name)?;
        read_to_string(entry.options_path())
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.compositions, "composition", name)?;
        super::load_json(entry.options_path())
    }

    /// Text of the caption fixture paired with this composition, if any.
    pub fn captions(name: &str) -> Result<Option<String>> {
        let entry = lookup(&MANIFEST.compositions, "composition", name)?;
        match entry.captions_key() {
            Some(key) => super::captions::text(key).map(Some),
            None => Ok(None),
        }
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.compositions, "composition", name)?;
        Ok(resolve_path(entry.options_path()))
    }
}
