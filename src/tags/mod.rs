//! Speaker Tag Store
//!
//! Tag-centric bookkeeping of speaker labels and model download status.
//! Every tag owns its description, its color and the speakers it is
//! attached to, grouped by model. The per-speaker view
//! (`model -> speaker -> tags`) is derived from the tag definitions, so
//! there is a single source of truth for what gets persisted.

pub mod format;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{TesterError, TesterResult};
pub use format::{FileFormat, Snapshot};

pub const DEFAULT_COLOR: &str = "#808080";

/// A user label attached to speakers across models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDefinition {
    pub description: String,
    pub color: String,
    /// `model -> speakers`, no duplicates and no empty lists
    pub speakers: BTreeMap<String, Vec<String>>,
}

impl TagDefinition {
    pub fn new(description: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            color: color.into(),
            speakers: BTreeMap::new(),
        }
    }

    pub fn with_defaults(name: &str) -> Self {
        Self::new(format::default_description(name), DEFAULT_COLOR)
    }

    pub fn has_speaker(&self, model: &str, speaker: &str) -> bool {
        self.speakers
            .get(model)
            .map(|list| list.iter().any(|s| s == speaker))
            .unwrap_or(false)
    }

    /// Returns false if the speaker was already attached
    pub fn attach(&mut self, model: &str, speaker: &str) -> bool {
        if model.is_empty() || speaker.is_empty() {
            return false;
        }
        let list = self.speakers.entry(model.to_string()).or_default();
        if list.iter().any(|s| s == speaker) {
            return false;
        }
        list.push(speaker.to_string());
        true
    }

    /// Returns false if the speaker was not attached
    pub fn detach(&mut self, model: &str, speaker: &str) -> bool {
        let Some(list) = self.speakers.get_mut(model) else {
            return false;
        };
        let before = list.len();
        list.retain(|s| s != speaker);
        let removed = list.len() != before;
        if list.is_empty() {
            self.speakers.remove(model);
        }
        removed
    }

    pub fn speaker_count(&self) -> usize {
        self.speakers.values().map(Vec::len).sum()
    }
}

/// Debug information about the loaded store
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSummary {
    pub tags_file: PathBuf,
    pub file_exists: bool,
    pub models_count: usize,
    pub models: Vec<String>,
    pub total_speakers: usize,
    pub total_tags: usize,
    pub downloaded_models: Vec<String>,
    pub available_models: Vec<String>,
    pub tag_definitions_count: usize,
    pub available_tags: Vec<String>,
}

/// In-memory speaker tag store backed by a JSON file
#[derive(Debug, Clone)]
pub struct SpeakerTagStore {
    path: PathBuf,
    tags: BTreeMap<String, TagDefinition>,
    downloaded: BTreeSet<String>,
    available: Vec<String>,
    loaded_format: Option<FileFormat>,
}

impl SpeakerTagStore {
    /// Empty store bound to `path`, nothing is read
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tags: BTreeMap::new(),
            downloaded: BTreeSet::new(),
            available: Vec::new(),
            loaded_format: None,
        }
    }

    /// Load the store, degrading to an empty store on any error.
    ///
    /// A file that cannot be parsed is moved aside to `*.json.corrupt`
    /// so the next save does not destroy it.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let mut store = Self::new(path);
        store.reload();
        store
    }

    /// Load the store, failing on unreadable or malformed files
    pub fn try_load(path: impl Into<PathBuf>) -> TesterResult<Self> {
        let path = path.into();
        match read_file(&path)? {
            Some((format, snapshot)) => Ok(Self::from_snapshot(path, format, snapshot)),
            None => Ok(Self::new(path)),
        }
    }

    pub fn reload(&mut self) {
        let path = self.path.clone();
        *self = match read_file(&path) {
            Ok(Some((format, snapshot))) => {
                let store = Self::from_snapshot(path, format, snapshot);
                info!(
                    "🏷️ Loaded {} tags from {} (format {})",
                    store.tags.len(),
                    store.path.display(),
                    format
                );
                store
            }
            Ok(None) => {
                debug!("No speaker tag file at {}, starting empty", path.display());
                Self::new(path)
            }
            Err(e) => {
                warn!("⚠️ Error loading speaker tags from {}: {}", path.display(), e);
                if path.exists() {
                    let backup = path.with_extension("json.corrupt");
                    if let Err(e) = std::fs::rename(&path, &backup) {
                        warn!("⚠️ Could not back up corrupt tag file: {}", e);
                    }
                }
                Self::new(path)
            }
        };
    }

    fn from_snapshot(path: PathBuf, format: FileFormat, snapshot: Snapshot) -> Self {
        if !format.is_current() {
            info!("🔄 Migrating speaker tags from format {} to {}", format, format::CURRENT_VERSION);
        }
        Self {
            path,
            tags: snapshot.tags,
            downloaded: snapshot.downloaded,
            available: snapshot.available,
            loaded_format: Some(format),
        }
    }

    /// Write the store in the current format
    pub fn save(&self) -> TesterResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = format::render(&self.tags, &self.downloaded, &self.available)?;
        std::fs::write(&self.path, content)?;
        debug!("💾 Saved speaker tags to {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format of the file this store was read from, if any
    pub fn loaded_format(&self) -> Option<FileFormat> {
        self.loaded_format
    }

    // ---- speaker tagging ------------------------------------------------

    pub fn add_tag_to_speaker(&mut self, model: &str, speaker: &str, tag: &str) -> bool {
        if model.is_empty() || speaker.is_empty() || tag.is_empty() {
            return false;
        }
        self.tags
            .entry(tag.to_string())
            .or_insert_with(|| TagDefinition::with_defaults(tag))
            .attach(model, speaker);
        true
    }

    pub fn remove_tag_from_speaker(&mut self, model: &str, speaker: &str, tag: &str) -> bool {
        self.tags
            .get_mut(tag)
            .map(|def| def.detach(model, speaker))
            .unwrap_or(false)
    }

    pub fn get_speaker_tags(&self, model: &str, speaker: &str) -> BTreeSet<String> {
        self.tags
            .iter()
            .filter(|(_, def)| def.has_speaker(model, speaker))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn get_all_tags_for_model(&self, model: &str) -> BTreeSet<String> {
        self.tags
            .iter()
            .filter(|(_, def)| def.speakers.contains_key(model))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn get_speakers_with_tag(&self, model: &str, tag: &str) -> Vec<String> {
        self.tags
            .get(tag)
            .and_then(|def| def.speakers.get(model))
            .cloned()
            .unwrap_or_default()
    }

    /// Detach a speaker from every tag
    pub fn remove_speaker(&mut self, model: &str, speaker: &str) -> bool {
        let mut removed = false;
        for def in self.tags.values_mut() {
            removed |= def.detach(model, speaker);
        }
        removed
    }

    /// Detach every speaker of a model from every tag
    pub fn remove_model(&mut self, model: &str) -> bool {
        let mut removed = false;
        for def in self.tags.values_mut() {
            removed |= def.speakers.remove(model).is_some();
        }
        removed
    }

    /// Models that have at least one tagged speaker
    pub fn get_all_models(&self) -> Vec<String> {
        self.tags
            .values()
            .flat_map(|def| def.speakers.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn get_all_speakers_for_model(&self, model: &str) -> Vec<String> {
        self.speaker_set(model).into_iter().collect()
    }

    pub fn get_tagged_speakers(&self, model: &str) -> Vec<String> {
        // a speaker is only recorded while it carries a tag
        self.get_all_speakers_for_model(model)
    }

    /// Speakers of `all_speakers` without any tag, in their original order
    pub fn get_untagged_speakers(&self, model: &str, all_speakers: &[String]) -> Vec<String> {
        let tagged = self.speaker_set(model);
        all_speakers
            .iter()
            .filter(|s| !tagged.contains(*s))
            .cloned()
            .collect()
    }

    pub fn get_speaker_tag_count(&self, model: &str, speaker: &str) -> usize {
        self.get_speaker_tags(model, speaker).len()
    }

    pub fn get_model_tag_count(&self, model: &str) -> usize {
        self.get_all_tags_for_model(model).len()
    }

    fn speaker_set(&self, model: &str) -> BTreeSet<String> {
        self.tags
            .values()
            .filter_map(|def| def.speakers.get(model))
            .flatten()
            .cloned()
            .collect()
    }

    pub fn summary(&self) -> StoreSummary {
        let models = self.get_all_models();
        let total_speakers = models
            .iter()
            .map(|m| self.speaker_set(m).len())
            .sum();
        let total_tags = self.tags.values().map(TagDefinition::speaker_count).sum();

        StoreSummary {
            tags_file: self.path.clone(),
            file_exists: self.path.exists(),
            models_count: models.len(),
            models,
            total_speakers,
            total_tags,
            downloaded_models: self.get_downloaded_models(),
            available_models: self.available.clone(),
            tag_definitions_count: self.tags.len(),
            available_tags: self.get_all_tags(),
        }
    }

    // ---- model download status ------------------------------------------

    /// Returns true if the status changed
    pub fn mark_model_downloaded(&mut self, model: &str) -> bool {
        self.downloaded.insert(model.to_string())
    }

    /// Returns true if the status changed
    pub fn mark_model_not_downloaded(&mut self, model: &str) -> bool {
        self.downloaded.remove(model)
    }

    pub fn is_model_downloaded(&self, model: &str) -> bool {
        self.downloaded.contains(model)
    }

    pub fn get_downloaded_models(&self) -> Vec<String> {
        self.downloaded.iter().cloned().collect()
    }

    /// Available models not marked as downloaded, in listing order
    pub fn get_undownloaded_models(&self) -> Vec<String> {
        self.available
            .iter()
            .filter(|m| !self.downloaded.contains(*m))
            .cloned()
            .collect()
    }

    pub fn get_available_models(&self) -> &[String] {
        &self.available
    }

    pub fn update_available_models(&mut self, models: Vec<String>) {
        self.available = models;
    }

    // ---- tag definitions ---------------------------------------------------

    pub fn get_all_tags(&self) -> Vec<String> {
        self.tags.keys().cloned().collect()
    }

    pub fn get_tag_definition(&self, tag: &str) -> Option<&TagDefinition> {
        self.tags.get(tag)
    }

    /// Define a tag; an existing tag keeps its speakers
    pub fn add_tag_definition(&mut self, tag: &str, description: &str, color: &str) {
        let def = self
            .tags
            .entry(tag.to_string())
            .or_insert_with(|| TagDefinition::new("", DEFAULT_COLOR));
        def.description = description.to_string();
        def.color = color.to_string();
    }

    /// Remove a tag and all its speaker associations
    pub fn remove_tag_definition(&mut self, tag: &str) -> bool {
        self.tags.remove(tag).is_some()
    }

    pub fn update_tag_definition(
        &mut self,
        tag: &str,
        description: Option<&str>,
        color: Option<&str>,
    ) -> bool {
        let Some(def) = self.tags.get_mut(tag) else {
            return false;
        };
        if let Some(description) = description {
            def.description = description.to_string();
        }
        if let Some(color) = color {
            def.color = color.to_string();
        }
        true
    }

    pub fn get_speakers_by_tag(&self, tag: &str) -> BTreeMap<String, Vec<String>> {
        self.tags
            .get(tag)
            .map(|def| def.speakers.clone())
            .unwrap_or_default()
    }

    /// Adopt the tag definitions of an edited copy, keeping model status
    pub fn replace_tags(&mut self, source: &SpeakerTagStore) {
        self.tags = source.tags.clone();
    }

    /// `model -> speaker -> tags` for every tagged speaker
    pub fn get_all_speakers_with_tags(&self) -> BTreeMap<String, BTreeMap<String, Vec<String>>> {
        let mut result: BTreeMap<String, BTreeMap<String, Vec<String>>> = BTreeMap::new();
        for (tag, def) in &self.tags {
            for (model, speakers) in &def.speakers {
                let by_speaker = result.entry(model.clone()).or_default();
                for speaker in speakers {
                    by_speaker
                        .entry(speaker.clone())
                        .or_default()
                        .push(tag.clone());
                }
            }
        }
        result
    }
}

fn read_file(path: &Path) -> TesterResult<Option<(FileFormat, Snapshot)>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    format::parse(&value).map(Some).map_err(|e| match e {
        TesterError::TagStore(msg) => {
            TesterError::TagStore(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}
