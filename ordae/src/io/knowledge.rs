//! Knowledge-base collaborator: brand, voice, messaging and program documents.
//!
//! Every lookup returns an empty object when data is absent or unreadable.
//! Read failures are logged and never surface as errors.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::core::persona::Enrichment;

pub trait KnowledgeBase {
    fn load_brand_guidelines(&self, org: &str) -> Value;
    fn load_voice_tone(&self, org: &str) -> Value;
    fn load_messaging(&self, org: &str) -> Value;
    fn load_program_catalog(&self, org: &str) -> Value;
}

/// Gather all four documents for one organization.
pub fn load_enrichment<K: KnowledgeBase + ?Sized>(kb: &K, org: &str) -> Enrichment {
    Enrichment {
        brand_guidelines: kb.load_brand_guidelines(org),
        voice_tone: kb.load_voice_tone(org),
        messaging: kb.load_messaging(org),
        program_catalog: kb.load_program_catalog(org),
    }
}

/// YAML files under a knowledge root:
/// `universities/<org>/{brand_guidelines,voice_tone,messaging_framework}.yaml`
/// and `program_catalog/<org>_programs.yaml`.
#[derive(Debug)]
pub struct YamlKnowledgeBase {
    root: PathBuf,
    cache: RefCell<BTreeMap<PathBuf, Value>>,
}

impl YamlKnowledgeBase {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RefCell::new(BTreeMap::new()),
        }
    }

    fn org_document(&self, org: &str, name: &str) -> Value {
        self.load(&self.root.join("universities").join(org).join(name))
    }

    fn load(&self, path: &Path) -> Value {
        if let Some(cached) = self.cache.borrow().get(path) {
            return cached.clone();
        }
        let value = read_yaml(path);
        self.cache
            .borrow_mut()
            .insert(path.to_path_buf(), value.clone());
        value
    }
}

impl KnowledgeBase for YamlKnowledgeBase {
    fn load_brand_guidelines(&self, org: &str) -> Value {
        self.org_document(org, "brand_guidelines.yaml")
    }

    fn load_voice_tone(&self, org: &str) -> Value {
        self.org_document(org, "voice_tone.yaml")
    }

    fn load_messaging(&self, org: &str) -> Value {
        self.org_document(org, "messaging_framework.yaml")
    }

    fn load_program_catalog(&self, org: &str) -> Value {
        self.load(
            &self
                .root
                .join("program_catalog")
                .join(format!("{org}_programs.yaml")),
        )
    }
}

fn read_yaml(path: &Path) -> Value {
    if !path.exists() {
        debug!(path = %path.display(), "knowledge document absent");
        return empty();
    }
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read knowledge document");
            return empty();
        }
    };
    match serde_yaml::from_str::<Value>(&contents) {
        Ok(Value::Null) => empty(),
        Ok(value) => value,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to parse knowledge document");
            empty()
        }
    }
}

fn empty() -> Value {
    Value::Object(Map::new())
}
