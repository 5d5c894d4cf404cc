//! Message types for the tester GUI
//!
//! All events and actions that flow through the application.

use iced::widget::text_editor;

use super::state::{ModelChoice, QuickTagChoice, SpeakerFilter, Tab};
use crate::devices::Device;
use crate::tts::{EngineKind, ModelInfo, SynthesisReport};

/// Main message enum for the application
#[derive(Debug, Clone)]
pub enum Message {
    // Navigation
    TabSelected(Tab),

    // Engine and device
    EngineSelected(EngineKind),
    DevicesLoaded(Vec<Device>),
    DeviceSelected(Device),

    // Models
    RefreshModels,
    ModelsLoaded {
        request_id: u64,
        result: Result<Vec<(String, bool)>, String>,
    },
    ModelSelected(ModelChoice),
    ModelInfoLoaded {
        request_id: u64,
        model: String,
        refresh: bool,
        result: Result<ModelInfo, String>,
    },

    // Speakers, language and speed
    RefreshSpeakers,
    SpeakerSelected(String),
    UntaggedOnlyToggled(bool),
    LanguageSelected(String),
    SpeedChanged(String),

    // Input text
    TextEdited(text_editor::Action),
    ResetText,

    // Synthesis and playback
    Synthesize,
    SynthesisFinished {
        result: Result<SynthesisReport, String>,
        elapsed: f64,
    },
    TogglePlayback,
    PlaybackStarted(Result<(), String>),
    PlaybackTick,

    // Quick tagging
    QuickTagSelected(QuickTagChoice),
    NewTagNameChanged(String),
    QuickAddTag,
    QuickRemoveTag,

    // Tag editor
    OpenTagEditor,
    TagEditor(TagEditorMessage),
    DeleteTagDefinition(String),

    // Model status management
    RequestModelToggle(String),
    ConfirmModelToggle,
    CancelModelToggle,
}

#[derive(Debug, Clone)]
pub enum TagEditorMessage {
    SearchChanged(String),
    FilterChanged(SpeakerFilter),
    SpeakerClicked(String),
    CurrentTagClicked(String),
    ExistingTagClicked(String),
    NewTagChanged(String),
    AddNewTag,
    AddExistingTag,
    RemoveSelectedTag,
    Save,
    Cancel,
}
