//! Main application state for the tester GUI
//!
//! Contains the TesterApp struct and initialization logic.

use iced::widget::text_editor;
use iced::Task;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::audio::SoundEngine;
use crate::config::Config;
use crate::devices::{self, Device};
use crate::tags::SpeakerTagStore;
use crate::tts::{self, EngineKind, ModelInfo, SynthesisRequest, TtsService};

use super::log::LogBuffer;
use super::messages::Message;
use super::state::{self, ModelChoice, PlaybackState, QuickTagChoice, Tab};
use super::tag_editor::TagEditor;

/// Startup options handed over by `main`
#[derive(Debug, Clone, Default)]
pub struct AppFlags {
    pub config: Config,
    /// Overrides `config.engine`
    pub engine: Option<EngineKind>,
}

/// Main application state
pub struct TesterApp {
    pub(crate) config: Config,
    pub(crate) current_tab: Tab,
    pub(crate) engine: EngineKind,
    pub(crate) service: Arc<TtsService>,
    pub(crate) store: SpeakerTagStore,
    pub(crate) sound: Option<Arc<SoundEngine>>,
    pub(crate) log: LogBuffer,

    pub(crate) devices: Vec<Device>,
    pub(crate) device: Device,

    pub(crate) model_choices: Vec<ModelChoice>,
    pub(crate) model: Option<String>,
    pub(crate) model_info: Option<ModelInfo>,
    /// Incremented per model info request so stale replies are dropped
    pub(crate) model_request_id: u64,
    /// Same for model listings, which outlive an engine switch
    pub(crate) listing_request_id: u64,
    pub(crate) loading_models: bool,
    pub(crate) loading_model: bool,

    pub(crate) speakers: Vec<String>,
    pub(crate) speaker: Option<String>,
    pub(crate) untagged_only: bool,
    pub(crate) languages: Vec<String>,
    pub(crate) language: Option<String>,
    pub(crate) speed_input: String,

    pub(crate) text: text_editor::Content,
    pub(crate) synthesizing: bool,
    /// Set once a synthesis succeeded; enables Play
    pub(crate) last_output: Option<PathBuf>,
    pub(crate) playback: PlaybackState,

    pub(crate) quick_tag: Option<QuickTagChoice>,
    pub(crate) new_tag_input: String,
    pub(crate) tag_editor: Option<TagEditor>,
    pub(crate) pending_model_toggle: Option<String>,
}

impl TesterApp {
    pub fn new(flags: AppFlags) -> (Self, Task<Message>) {
        let config = flags.config;
        let engine = match flags.engine {
            Some(engine) => engine,
            None => config.engine_kind().unwrap_or_else(|e| {
                warn!("⚠️ {}, falling back to Coqui", e);
                EngineKind::Coqui
            }),
        };

        let store = SpeakerTagStore::load(&config.tags_file);
        let service = Arc::new(tts::create_service(engine, &config));

        let mut log = LogBuffer::default();
        let sound = match SoundEngine::new() {
            Ok(engine) => Some(Arc::new(engine)),
            Err(e) => {
                log.push(format!("❌ Audio engine unavailable: {}", e));
                None
            }
        };

        let summary = store.summary();
        info!("🚀 TTS Tester initialized ({})", engine.label());
        debug!("Speaker tag store: {:?}", summary);
        log.push(format!("📁 Speaker tags file: {}", summary.tags_file.display()));
        log.push(format!(
            "📊 {} tag definitions, {} tagged speakers across {} models",
            summary.tag_definitions_count, summary.total_speakers, summary.models_count
        ));

        let mut app = Self {
            speed_input: format!("{}", config.effective_speed()),
            text: text_editor::Content::with_text(&config.default_text),
            config,
            current_tab: Tab::Tester,
            engine,
            service,
            store,
            sound,
            log,
            devices: vec![Device::Cpu],
            device: Device::Cpu,
            model_choices: Vec::new(),
            model: None,
            model_info: None,
            model_request_id: 0,
            listing_request_id: 0,
            loading_models: false,
            loading_model: false,
            speakers: Vec::new(),
            speaker: None,
            untagged_only: false,
            languages: Vec::new(),
            language: None,
            synthesizing: false,
            last_output: None,
            playback: PlaybackState::Idle,
            quick_tag: Some(QuickTagChoice::CreateNew),
            new_tag_input: String::new(),
            tag_editor: None,
            pending_model_toggle: None,
        };
        app.refresh_model_choices();

        let tasks = Task::batch([
            app.load_models(),
            Task::perform(devices::list_devices(), Message::DevicesLoaded),
        ]);
        (app, tasks)
    }

    /// Application title
    pub fn title(&self) -> String {
        format!("TTS Tester - {}", self.engine.label())
    }

    /// Application theme
    pub fn theme(&self) -> iced::Theme {
        super::theme::dark_theme()
    }

    pub(crate) fn load_models(&mut self) -> Task<Message> {
        self.listing_request_id += 1;
        self.loading_models = true;
        self.log.push(format!("Loading {} models...", self.engine.label()));
        let request_id = self.listing_request_id;
        let service = Arc::clone(&self.service);
        Task::perform(
            async move {
                service
                    .list_available_models()
                    .await
                    .map_err(|e| e.to_string())
            },
            move |result| Message::ModelsLoaded { request_id, result },
        )
    }

    pub(crate) fn load_model_info(&mut self, model: String, refresh: bool) -> Task<Message> {
        self.model_request_id += 1;
        self.loading_model = true;
        let request_id = self.model_request_id;
        let service = Arc::clone(&self.service);
        Task::perform(
            async move {
                let result = service.load_model(&model).await.map_err(|e| e.to_string());
                (model, result)
            },
            move |(model, result)| Message::ModelInfoLoaded {
                request_id,
                model,
                refresh,
                result,
            },
        )
    }

    pub(crate) fn synthesize(&mut self, request: SynthesisRequest) -> Task<Message> {
        self.synthesizing = true;
        let service = Arc::clone(&self.service);
        Task::perform(
            async move {
                let start = Instant::now();
                let result = service
                    .synthesize_text(&request)
                    .await
                    .map_err(|e| e.to_string());
                (result, start.elapsed().as_secs_f64())
            },
            |(result, elapsed)| Message::SynthesisFinished { result, elapsed },
        )
    }

    pub(crate) fn start_playback(&mut self, path: PathBuf) -> Task<Message> {
        let Some(sound) = self.sound.clone() else {
            self.log.push("❌ Audio output unavailable");
            return Task::none();
        };
        self.playback = PlaybackState::Starting;
        Task::perform(
            async move {
                match tokio::task::spawn_blocking(move || sound.play_file(path)).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(e) => Err(e.to_string()),
                }
            },
            Message::PlaybackStarted,
        )
    }

    pub(crate) fn stop_playback(&mut self) {
        if let Some(sound) = &self.sound {
            if let Err(e) = sound.stop() {
                warn!("⚠️ Failed to stop playback: {}", e);
            }
        }
        self.playback = PlaybackState::Idle;
    }

    pub(crate) fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.config.output_path)
    }

    pub(crate) fn refresh_model_choices(&mut self) {
        self.model_choices = state::organize_models(
            &self.listed_downloaded_models(),
            &self.store.get_undownloaded_models(),
        );
    }

    /// Downloaded models the current engine listed; the download set is
    /// shared by all engines
    pub(crate) fn listed_downloaded_models(&self) -> Vec<String> {
        let available = self.store.get_available_models();
        self.store
            .get_downloaded_models()
            .into_iter()
            .filter(|m| available.contains(m))
            .collect()
    }

    pub(crate) fn selected_model_choice(&self) -> Option<ModelChoice> {
        self.model.clone().map(ModelChoice::Model)
    }

    /// Rebuild the speaker picker from the loaded model info
    pub(crate) fn update_speaker_menu(&mut self) {
        self.speakers = match &self.model_info {
            Some(info) => state::speaker_choices(info, &self.store, self.untagged_only),
            None => Vec::new(),
        };
        self.speaker = self.speakers.first().cloned();

        let tag_still_exists = match &self.quick_tag {
            Some(QuickTagChoice::Existing(tag)) => self.store.get_tag_definition(tag).is_some(),
            _ => false,
        };
        if !tag_still_exists {
            self.quick_tag = Some(QuickTagChoice::CreateNew);
        }
    }

    pub(crate) fn save_store(&mut self) {
        if let Err(e) = self.store.save() {
            self.log.push(format!("❌ Failed to save speaker tags: {}", e));
        }
    }

    /// Tags of the current speaker for the quick tagging panel
    pub(crate) fn current_speaker_tags(&self) -> String {
        match (&self.model, &self.speaker) {
            (Some(model), Some(speaker)) => {
                state::tags_label(&self.store.get_speaker_tags(model, speaker))
            }
            _ => state::tags_label(&Default::default()),
        }
    }

    /// Switch engines, dropping everything tied to the previous one
    pub(crate) fn switch_engine(&mut self, engine: EngineKind) -> Task<Message> {
        self.service.cleanup();
        self.stop_playback();
        self.engine = engine;
        self.service = Arc::new(tts::create_service(engine, &self.config));
        self.model = None;
        self.model_info = None;
        self.model_request_id += 1;
        self.loading_model = false;
        self.languages.clear();
        self.language = None;
        self.tag_editor = None;
        // the stored listing belongs to the previous engine
        self.model_choices.clear();
        self.update_speaker_menu();
        self.log.push(format!("Switched engine to {}", engine.label()));
        self.load_models()
    }
}
