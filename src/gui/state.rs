//! State types for the tester GUI
//!
//! Enums for the pickers plus the pure helpers that decide what they show.

use std::collections::BTreeSet;
use std::fmt;

use crate::tags::SpeakerTagStore;
use crate::tts::ModelInfo;

pub const DOWNLOADED_HEADER: &str = "--- Downloaded Models ---";
pub const AVAILABLE_HEADER: &str = "--- Available Models (Not Downloaded) ---";
pub const CREATE_NEW_TAG: &str = "Create New Tag...";

/// Current tab/view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Tester,
    Tags,
    Models,
}

/// Entry of the model picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChoice {
    Header(&'static str),
    Model(String),
}

impl ModelChoice {
    pub fn model(&self) -> Option<&str> {
        match self {
            ModelChoice::Model(name) => Some(name),
            ModelChoice::Header(_) => None,
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelChoice::Header(title) => f.write_str(title),
            ModelChoice::Model(name) => f.write_str(name),
        }
    }
}

/// Entry of the quick tag picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickTagChoice {
    CreateNew,
    Existing(String),
}

impl fmt::Display for QuickTagChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuickTagChoice::CreateNew => f.write_str(CREATE_NEW_TAG),
            QuickTagChoice::Existing(tag) => f.write_str(tag),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeakerFilter {
    #[default]
    All,
    Tagged,
    Untagged,
}

impl SpeakerFilter {
    pub const ALL: [SpeakerFilter; 3] = [
        SpeakerFilter::All,
        SpeakerFilter::Tagged,
        SpeakerFilter::Untagged,
    ];

    pub fn accepts(&self, has_tags: bool) -> bool {
        match self {
            SpeakerFilter::All => true,
            SpeakerFilter::Tagged => has_tags,
            SpeakerFilter::Untagged => !has_tags,
        }
    }
}

impl fmt::Display for SpeakerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SpeakerFilter::All => "All",
            SpeakerFilter::Tagged => "Tagged",
            SpeakerFilter::Untagged => "Untagged",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Starting,
    Playing,
}

/// Model picker entries, grouped by download status under section headers
pub fn organize_models(downloaded: &[String], undownloaded: &[String]) -> Vec<ModelChoice> {
    let mut choices = Vec::with_capacity(downloaded.len() + undownloaded.len() + 2);
    if !downloaded.is_empty() {
        choices.push(ModelChoice::Header(DOWNLOADED_HEADER));
        choices.extend(downloaded.iter().cloned().map(ModelChoice::Model));
    }
    if !undownloaded.is_empty() {
        choices.push(ModelChoice::Header(AVAILABLE_HEADER));
        choices.extend(undownloaded.iter().cloned().map(ModelChoice::Model));
    }
    choices
}

/// First downloaded model, else the first available one
pub fn default_model(downloaded: &[String], available: &[String]) -> Option<String> {
    downloaded.first().or_else(|| available.first()).cloned()
}

/// Speakers for the speaker picker.
///
/// The untagged-only filter applies to multi-speaker models only.
pub fn speaker_choices(info: &ModelInfo, store: &SpeakerTagStore, untagged_only: bool) -> Vec<String> {
    let all = info.speaker_choices();
    if untagged_only && info.is_multi_speaker() {
        store.get_untagged_speakers(&info.model, &all)
    } else {
        all
    }
}

pub fn tags_label(tags: &BTreeSet<String>) -> String {
    if tags.is_empty() {
        "No tags".to_string()
    } else {
        tags.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// `dataset/model` for Coqui names, anything else unchanged
pub fn short_model_name(model: &str) -> String {
    match model.rsplitn(3, '/').collect::<Vec<_>>().as_slice() {
        [name, dataset, _] => format!("{}/{}", dataset, name),
        _ => model.to_string(),
    }
}

/// "Create New Tag..." followed by every known tag, sorted
pub fn quick_tag_options(mut tags: Vec<String>) -> Vec<QuickTagChoice> {
    tags.sort();
    std::iter::once(QuickTagChoice::CreateNew)
        .chain(tags.into_iter().map(QuickTagChoice::Existing))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_organize_models_sections() {
        let choices = organize_models(&names(&["a"]), &names(&["b", "c"]));
        assert_eq!(
            choices,
            vec![
                ModelChoice::Header(DOWNLOADED_HEADER),
                ModelChoice::Model("a".into()),
                ModelChoice::Header(AVAILABLE_HEADER),
                ModelChoice::Model("b".into()),
                ModelChoice::Model("c".into()),
            ]
        );
        assert!(choices[0].model().is_none());
        assert_eq!(choices[1].model(), Some("a"));
    }

    #[test]
    fn test_organize_models_skips_empty_sections() {
        let choices = organize_models(&[], &names(&["b"]));
        assert_eq!(choices[0], ModelChoice::Header(AVAILABLE_HEADER));
        assert!(organize_models(&[], &[]).is_empty());
    }

    #[test]
    fn test_default_model() {
        assert_eq!(default_model(&names(&["d"]), &names(&["a", "d"])), Some("d".into()));
        assert_eq!(default_model(&[], &names(&["a", "d"])), Some("a".into()));
        assert_eq!(default_model(&[], &[]), None);
    }

    #[test]
    fn test_untagged_filter_only_for_multi_speaker() {
        let mut store = SpeakerTagStore::new("unused.json");
        store.add_tag_to_speaker("m", "p1", "calm");
        store.add_tag_to_speaker("single", "single", "calm");

        let multi = ModelInfo {
            model: "m".into(),
            speakers: Some(names(&["p1", "p2"])),
            languages: None,
        };
        assert_eq!(speaker_choices(&multi, &store, true), vec!["p2"]);
        assert_eq!(speaker_choices(&multi, &store, false), vec!["p1", "p2"]);

        let single = ModelInfo {
            model: "single".into(),
            speakers: None,
            languages: None,
        };
        assert_eq!(speaker_choices(&single, &store, true), vec!["single"]);
    }

    #[test]
    fn test_labels_and_options() {
        assert_eq!(tags_label(&BTreeSet::new()), "No tags");
        let tags: BTreeSet<String> = names(&["deep", "calm"]).into_iter().collect();
        assert_eq!(tags_label(&tags), "calm, deep");

        let options = quick_tag_options(names(&["zeta", "alpha"]));
        assert_eq!(options[0].to_string(), CREATE_NEW_TAG);
        assert_eq!(options[1], QuickTagChoice::Existing("alpha".into()));
        assert_eq!(options.len(), 3);
    }

    #[test]
    fn test_speaker_filter() {
        assert!(SpeakerFilter::All.accepts(false));
        assert!(SpeakerFilter::Tagged.accepts(true));
        assert!(!SpeakerFilter::Tagged.accepts(false));
        assert!(SpeakerFilter::Untagged.accepts(false));
    }

    #[test]
    fn test_short_model_name() {
        assert_eq!(short_model_name("tts_models/en/vctk/vits"), "vctk/vits");
        assert_eq!(
            short_model_name("tts_models/multilingual/multi-dataset/xtts_v2"),
            "multi-dataset/xtts_v2"
        );
        assert_eq!(short_model_name("en_US-amy-medium"), "en_US-amy-medium");
    }
}
