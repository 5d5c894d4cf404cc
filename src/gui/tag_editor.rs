//! Speaker tag editor
//!
//! Edits a draft copy of the tag store for one model. Nothing reaches the
//! real store until the draft is committed.

use thiserror::Error;

use super::state::{tags_label, SpeakerFilter};
use crate::tags::SpeakerTagStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorWarning {
    #[error("Please select a speaker first.")]
    NoSpeaker,
    #[error("Please enter a tag name.")]
    NoTagName,
    #[error("Please select a tag.")]
    NoTagSelected,
    #[error("Speaker '{speaker}' doesn't have tag '{tag}'")]
    TagNotFound { speaker: String, tag: String },
}

#[derive(Debug, Clone)]
pub struct TagEditor {
    model: String,
    speakers: Vec<String>,
    draft: SpeakerTagStore,
    pub search: String,
    pub filter: SpeakerFilter,
    pub selected_speaker: Option<String>,
    pub selected_current_tag: Option<String>,
    pub selected_existing_tag: Option<String>,
    pub new_tag_input: String,
    dirty: bool,
}

impl TagEditor {
    pub fn new(model: &str, speakers: Vec<String>, store: &SpeakerTagStore) -> Self {
        Self {
            model: model.to_string(),
            speakers,
            draft: store.clone(),
            search: String::new(),
            filter: SpeakerFilter::All,
            selected_speaker: None,
            selected_current_tag: None,
            selected_existing_tag: None,
            new_tag_input: String::new(),
            dirty: false,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn draft(&self) -> &SpeakerTagStore {
        &self.draft
    }

    /// Whether the draft differs from what it was opened with
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// `(speaker, tags label)` rows after search and filter
    pub fn visible_speakers(&self) -> Vec<(String, String)> {
        let needle = self.search.trim().to_lowercase();
        self.speakers
            .iter()
            .filter(|s| needle.is_empty() || s.to_lowercase().contains(&needle))
            .filter_map(|s| {
                let tags = self.draft.get_speaker_tags(&self.model, s);
                self.filter
                    .accepts(!tags.is_empty())
                    .then(|| (s.clone(), tags_label(&tags)))
            })
            .collect()
    }

    pub fn select_speaker(&mut self, speaker: String) {
        self.selected_speaker = Some(speaker);
        self.selected_current_tag = None;
    }

    /// Tags of the selected speaker, sorted
    pub fn current_tags(&self) -> Vec<String> {
        self.selected_speaker
            .as_ref()
            .map(|s| self.draft.get_speaker_tags(&self.model, s).into_iter().collect())
            .unwrap_or_default()
    }

    /// Tags used anywhere in this model, sorted
    pub fn existing_tags(&self) -> Vec<String> {
        self.draft.get_all_tags_for_model(&self.model).into_iter().collect()
    }

    pub fn add_new_tag(&mut self) -> Result<String, EditorWarning> {
        let speaker = self.selected_speaker.clone().ok_or(EditorWarning::NoSpeaker)?;
        let tag = self.new_tag_input.trim().to_string();
        if tag.is_empty() {
            return Err(EditorWarning::NoTagName);
        }
        self.draft.add_tag_to_speaker(&self.model, &speaker, &tag);
        self.new_tag_input.clear();
        self.dirty = true;
        Ok(tag)
    }

    pub fn add_existing_tag(&mut self) -> Result<String, EditorWarning> {
        let speaker = self.selected_speaker.clone().ok_or(EditorWarning::NoSpeaker)?;
        let tag = self
            .selected_existing_tag
            .clone()
            .ok_or(EditorWarning::NoTagSelected)?;
        self.draft.add_tag_to_speaker(&self.model, &speaker, &tag);
        self.dirty = true;
        Ok(tag)
    }

    pub fn remove_selected_tag(&mut self) -> Result<String, EditorWarning> {
        let speaker = self.selected_speaker.clone().ok_or(EditorWarning::NoSpeaker)?;
        let tag = self
            .selected_current_tag
            .take()
            .ok_or(EditorWarning::NoTagSelected)?;
        if !self.draft.remove_tag_from_speaker(&self.model, &speaker, &tag) {
            return Err(EditorWarning::TagNotFound { speaker, tag });
        }
        self.dirty = true;
        Ok(tag)
    }
}
