//! On-disk shapes of the speaker tag file
//!
//! Four historical shapes are recognised and folded into the current
//! tag-centric shape (version 1.3). Saving always writes 1.3.
//!
//! ```text
//! 1.3     {"_metadata", "_models", "_tags": {tag: {description, color, speakers: {model: [speaker]}}}}
//! 1.2     {"_metadata", "_models", "_tags": {tag: {description, color}}, "_speakers": {model: {speaker: [tag]}}}
//! 1.1     {"_metadata", "_models", "speaker_tags": {model: {speaker: [tag]}}}
//! legacy  {model: {speaker: [tag]}}
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::TagDefinition;
use crate::error::{TesterError, TesterResult};

pub const CURRENT_VERSION: &str = "1.3";
const FILE_DESCRIPTION: &str =
    "TTS Tester data with tag-centric organization - one tag to many models/speakers";

/// `{model: {speaker: [tag]}}`, the per-speaker layout used before 1.3
type SpeakerMap = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// File shape detected at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    V13,
    V12,
    V11,
    Legacy,
}

impl FileFormat {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FileFormat::V13 => "1.3",
            FileFormat::V12 => "1.2",
            FileFormat::V11 => "1.1",
            FileFormat::Legacy => "legacy",
        }
    }

    pub fn is_current(&self) -> bool {
        *self == FileFormat::V13
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store contents decoded from any supported shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub tags: BTreeMap<String, TagDefinition>,
    pub downloaded: BTreeSet<String>,
    pub available: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelsSection {
    downloaded: Vec<String>,
    available: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredTag {
    description: Option<String>,
    color: Option<String>,
    speakers: BTreeMap<String, Vec<String>>,
}

#[derive(Serialize)]
struct Metadata<'a> {
    version: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct ModelsOut<'a> {
    downloaded: &'a BTreeSet<String>,
    available: &'a [String],
}

#[derive(Serialize)]
struct StoreFile<'a> {
    #[serde(rename = "_metadata")]
    metadata: Metadata<'a>,
    #[serde(rename = "_models")]
    models: ModelsOut<'a>,
    #[serde(rename = "_tags")]
    tags: &'a BTreeMap<String, TagDefinition>,
}

/// Work out which shape a parsed document has
pub fn detect(value: &Value) -> TesterResult<FileFormat> {
    let obj = value
        .as_object()
        .ok_or_else(|| TesterError::TagStore("top-level value is not an object".to_string()))?;

    if let Some(tags) = obj.get("_tags").and_then(Value::as_object) {
        let versioned = obj
            .get("_metadata")
            .and_then(|m| m.get("version"))
            .and_then(Value::as_str)
            == Some(CURRENT_VERSION);
        if versioned || tags.values().any(|t| t.get("speakers").is_some()) {
            return Ok(FileFormat::V13);
        }
    }
    if obj.contains_key("_speakers") {
        return Ok(FileFormat::V12);
    }
    if obj.contains_key("speaker_tags") {
        return Ok(FileFormat::V11);
    }
    if obj.contains_key("_tags") {
        // current shape without any tag yet
        return Ok(FileFormat::V13);
    }
    Ok(FileFormat::Legacy)
}

/// Decode a document of any supported shape into the current layout
pub fn parse(value: &Value) -> TesterResult<(FileFormat, Snapshot)> {
    let format = detect(value)?;
    let obj = value.as_object().cloned().unwrap_or_default();

    let snapshot = match format {
        FileFormat::V13 => {
            let mut snapshot = models_snapshot(&obj)?;
            for (name, stored) in stored_tags(&obj)? {
                let mut def = TagDefinition::new(
                    stored.description.unwrap_or_else(|| default_description(&name)),
                    stored.color.unwrap_or_else(|| super::DEFAULT_COLOR.to_string()),
                );
                for (model, speakers) in stored.speakers {
                    for speaker in speakers {
                        def.attach(&model, &speaker);
                    }
                }
                snapshot.tags.insert(name, def);
            }
            snapshot
        }
        FileFormat::V12 => {
            let mut snapshot = models_snapshot(&obj)?;
            for (name, stored) in stored_tags(&obj)? {
                // speakers live in "_speakers" for this version
                let def = TagDefinition::new(
                    stored.description.unwrap_or_else(|| default_description(&name)),
                    stored.color.unwrap_or_else(|| super::DEFAULT_COLOR.to_string()),
                );
                snapshot.tags.insert(name, def);
            }
            let speakers = speaker_map(obj.get("_speakers"), "_speakers")?;
            fold_speaker_map(&mut snapshot.tags, speakers);
            snapshot
        }
        FileFormat::V11 => {
            let mut snapshot = models_snapshot(&obj)?;
            let speakers = speaker_map(obj.get("speaker_tags"), "speaker_tags")?;
            fold_speaker_map(&mut snapshot.tags, speakers);
            snapshot
        }
        FileFormat::Legacy => {
            let models: Map<String, Value> = obj
                .into_iter()
                .filter(|(key, _)| !key.starts_with('_'))
                .collect();
            let speakers = speaker_map(Some(&Value::Object(models)), "model")?;

            let mut snapshot = Snapshot {
                downloaded: speakers.keys().cloned().collect(),
                available: speakers.keys().cloned().collect(),
                ..Default::default()
            };
            fold_speaker_map(&mut snapshot.tags, speakers);
            snapshot
        }
    };

    Ok((format, snapshot))
}

/// Encode the store in the current shape
pub fn render(
    tags: &BTreeMap<String, TagDefinition>,
    downloaded: &BTreeSet<String>,
    available: &[String],
) -> TesterResult<String> {
    let file = StoreFile {
        metadata: Metadata {
            version: CURRENT_VERSION,
            description: FILE_DESCRIPTION,
        },
        models: ModelsOut {
            downloaded,
            available,
        },
        tags,
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

pub fn default_description(tag: &str) -> String {
    format!("Tag: {}", tag)
}

fn models_snapshot(obj: &Map<String, Value>) -> TesterResult<Snapshot> {
    let models: ModelsSection = match obj.get("_models") {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| TesterError::TagStore(format!("invalid _models section: {}", e)))?,
        None => ModelsSection::default(),
    };

    let mut available = Vec::with_capacity(models.available.len());
    for model in models.available {
        if !available.contains(&model) {
            available.push(model);
        }
    }

    Ok(Snapshot {
        tags: BTreeMap::new(),
        downloaded: models.downloaded.into_iter().collect(),
        available,
    })
}

fn stored_tags(obj: &Map<String, Value>) -> TesterResult<BTreeMap<String, StoredTag>> {
    match obj.get("_tags") {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| TesterError::TagStore(format!("invalid _tags section: {}", e))),
        None => Ok(BTreeMap::new()),
    }
}

fn speaker_map(value: Option<&Value>, what: &str) -> TesterResult<SpeakerMap> {
    match value {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| TesterError::TagStore(format!("invalid {} section: {}", what, e))),
        None => Ok(SpeakerMap::new()),
    }
}

/// Turn `{model: {speaker: [tag]}}` into tag definitions, creating default
/// definitions for tags that were never described.
fn fold_speaker_map(tags: &mut BTreeMap<String, TagDefinition>, speakers: SpeakerMap) {
    for (model, by_speaker) in speakers {
        for (speaker, speaker_tags) in by_speaker {
            for tag in speaker_tags {
                if tag.is_empty() {
                    continue;
                }
                tags.entry(tag.clone())
                    .or_insert_with(|| TagDefinition::with_defaults(&tag))
                    .attach(&model, &speaker);
            }
        }
    }
}
