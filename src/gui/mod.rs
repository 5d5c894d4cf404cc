//! GUI module using iced
//!
//! The tester window: synthesis controls, the speaker tag editor and model
//! status management.

use iced::widget::{container, row};
use iced::{Element, Length, Subscription, Task};
use std::time::Duration;
use tracing::debug;

use crate::devices::Device;
use crate::tags::{format::default_description, DEFAULT_COLOR};
use crate::tts::SynthesisRequest;

// Sub-modules
pub mod app;
pub mod log;
pub mod messages;
pub mod state;
pub mod tabs;
pub mod tag_editor;
pub mod theme;

// Re-exports for convenience
pub use app::{AppFlags, TesterApp};
pub use messages::{Message, TagEditorMessage};
pub use state::Tab;

use state::{PlaybackState, QuickTagChoice};
use tag_editor::TagEditor;

const PLAYBACK_POLL: Duration = Duration::from_millis(200);

impl TesterApp {
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TabSelected(tab) => {
                self.current_tab = tab;
            }

            Message::EngineSelected(engine) => {
                if engine != self.engine {
                    return self.switch_engine(engine);
                }
            }
            Message::DevicesLoaded(devices) => {
                let names: Vec<String> = devices.iter().map(Device::to_string).collect();
                self.log.push(format!("Devices: {}", names.join(", ")));
                self.device = devices.first().cloned().unwrap_or_default();
                self.devices = devices;
            }
            Message::DeviceSelected(device) => {
                self.device = device;
            }

            Message::RefreshModels => {
                if !self.loading_models {
                    return self.load_models();
                }
            }
            Message::ModelsLoaded { request_id, result } => {
                if request_id != self.listing_request_id {
                    debug!("Dropping stale model listing");
                    return Task::none();
                }
                self.loading_models = false;
                match result {
                    Ok(listing) => return self.apply_model_listing(listing),
                    Err(e) => self.log.push(format!("❌ Error loading models: {}", e)),
                }
            }
            Message::ModelSelected(choice) => {
                // Section headers are not selectable
                let Some(model) = choice.model().map(str::to_string) else {
                    return Task::none();
                };
                if self.model.as_deref() == Some(model.as_str()) {
                    return Task::none();
                }
                self.select_model(model.clone());
                return self.load_model_info(model, false);
            }
            Message::ModelInfoLoaded {
                request_id,
                model,
                refresh,
                result,
            } => {
                if request_id != self.model_request_id {
                    debug!("Dropping stale model info for {}", model);
                    return Task::none();
                }
                self.loading_model = false;
                match result {
                    Ok(info) => self.apply_model_info(&model, info, refresh),
                    Err(e) => self.log.push(format!("❌ Error loading model info: {}", e)),
                }
            }

            Message::RefreshSpeakers => match self.model.clone() {
                Some(model) => {
                    self.log.push("🔄 Refreshing speaker list...");
                    return self.load_model_info(model, true);
                }
                None => self
                    .log
                    .push("No model selected. Please select a model first."),
            },
            Message::SpeakerSelected(speaker) => {
                self.speaker = Some(speaker);
            }
            Message::UntaggedOnlyToggled(enabled) => {
                self.untagged_only = enabled;
                self.update_speaker_menu();
            }
            Message::LanguageSelected(language) => {
                self.language = Some(language);
            }
            Message::SpeedChanged(speed) => {
                self.speed_input = speed;
            }

            Message::TextEdited(action) => {
                self.text.perform(action);
            }
            Message::ResetText => {
                self.text = iced::widget::text_editor::Content::with_text(&self.config.default_text);
                self.log.push("🔄 Text reset to default");
            }

            Message::Synthesize => return self.start_synthesis(),
            Message::SynthesisFinished { result, elapsed } => {
                self.synthesizing = false;
                match result {
                    Ok(report) => {
                        let path = self.output_path();
                        self.log.push("✅ Synthesis completed successfully!");
                        self.log.push(format!("📁 Audio saved to: {}", path.display()));
                        self.log
                            .push(format!("📊 File size: {:.2} MB", report.file_size_mb));
                        self.log.push(format!(
                            "⏱️  TTS synthesis time: {:.2} seconds",
                            report.synthesis_time
                        ));
                        self.log.push(format!(
                            "⏱️  Total time (including setup): {:.2} seconds",
                            report.total_time
                        ));
                        self.log.push(format!(
                            "🚀 Synthesis speed: {:.2} MB/s",
                            report.speed_mb_per_s
                        ));
                        self.last_output = Some(path);
                    }
                    Err(e) => {
                        self.log.push(format!("❌ Synthesis failed: {}", e));
                        self.log.push(format!(
                            "⏱️  Time elapsed before error: {:.2} seconds",
                            elapsed
                        ));
                        self.last_output = None;
                    }
                }
            }

            Message::TogglePlayback => {
                if self.playback != PlaybackState::Idle {
                    self.stop_playback();
                    self.log.push("Playback stopped.");
                    return Task::none();
                }
                let Some(path) = self.last_output.clone() else {
                    return Task::none();
                };
                if !path.exists() {
                    self.log
                        .push(format!("Audio file not found: {}", path.display()));
                    self.last_output = None;
                    return Task::none();
                }
                self.log.push(format!("Playing audio: {}", path.display()));
                if let Some(duration) = crate::audio::audio_duration(&path) {
                    debug!("Audio length {:.2}s", duration.as_secs_f64());
                }
                return self.start_playback(path);
            }
            Message::PlaybackStarted(result) => match result {
                Ok(()) if self.playback == PlaybackState::Starting => {
                    self.playback = PlaybackState::Playing;
                }
                // Stop was pressed while the file was being queued
                Ok(()) => self.stop_playback(),
                Err(e) => {
                    self.log.push(format!("Playback failed: {}", e));
                    self.playback = PlaybackState::Idle;
                }
            },
            Message::PlaybackTick => {
                let still_playing = self
                    .sound
                    .as_ref()
                    .map(|s| s.is_playing())
                    .unwrap_or(false);
                if self.playback == PlaybackState::Playing && !still_playing {
                    self.playback = PlaybackState::Idle;
                    self.log.push("Playback finished.");
                }
            }

            Message::QuickTagSelected(choice) => {
                self.quick_tag = Some(choice);
            }
            Message::NewTagNameChanged(name) => {
                self.new_tag_input = name;
            }
            Message::QuickAddTag => self.quick_add_tag(),
            Message::QuickRemoveTag => self.quick_remove_tag(),

            Message::OpenTagEditor => {
                match (&self.model, &self.model_info) {
                    (Some(model), Some(info)) => {
                        self.tag_editor =
                            Some(TagEditor::new(model, info.speaker_choices(), &self.store));
                        self.current_tab = state::Tab::Tags;
                    }
                    _ => self
                        .log
                        .push("⚠️ No speakers available for tagging."),
                }
            }
            Message::TagEditor(msg) => self.update_tag_editor(msg),
            Message::DeleteTagDefinition(tag) => {
                if self.store.remove_tag_definition(&tag) {
                    self.save_store();
                    self.update_speaker_menu();
                    self.log.push(format!("🗑️ Removed tag '{}'", tag));
                }
            }

            Message::RequestModelToggle(model) => {
                self.pending_model_toggle = Some(model);
            }
            Message::ConfirmModelToggle => {
                if let Some(model) = self.pending_model_toggle.take() {
                    self.toggle_model_status(&model);
                }
            }
            Message::CancelModelToggle => {
                self.pending_model_toggle = None;
            }
        }
        Task::none()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        if self.playback == PlaybackState::Playing {
            iced::time::every(PLAYBACK_POLL).map(|_| Message::PlaybackTick)
        } else {
            Subscription::none()
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let sidebar = tabs::sidebar::view(self);

        let content = match self.current_tab {
            Tab::Tester => tabs::tester::view(self),
            Tab::Tags => tabs::tags::view(self),
            Tab::Models => tabs::models::view(self),
        };

        row![sidebar, container(content).width(Length::Fill).padding(20)].into()
    }

    fn apply_model_listing(&mut self, listing: Vec<(String, bool)>) -> Task<Message> {
        let names: Vec<String> = listing.iter().map(|(name, _)| name.clone()).collect();
        for (name, downloaded) in &listing {
            if *downloaded {
                self.store.mark_model_downloaded(name);
            }
        }
        self.store.update_available_models(names.clone());
        self.save_store();
        self.refresh_model_choices();

        let downloaded = self.listed_downloaded_models();
        let undownloaded = self.store.get_undownloaded_models();
        self.log
            .push(format!("📊 Downloaded models: {}", downloaded.len()));
        self.log
            .push(format!("📦 Available models: {}", undownloaded.len()));
        self.log.push(format!("📋 Total models: {}", names.len()));

        let current_is_listed = self
            .model
            .as_ref()
            .map(|m| names.contains(m))
            .unwrap_or(false);
        if current_is_listed {
            return Task::none();
        }
        match state::default_model(&downloaded, &names) {
            Some(model) => {
                self.select_model(model.clone());
                self.load_model_info(model, false)
            }
            None => Task::none(),
        }
    }

    fn select_model(&mut self, model: String) {
        self.log.push(format!("Loading model: {}", model));
        self.model = Some(model);
        self.model_info = None;
        self.languages.clear();
        self.language = None;
        self.update_speaker_menu();
    }

    fn apply_model_info(&mut self, model: &str, info: crate::tts::ModelInfo, refresh: bool) {
        if self.store.mark_model_downloaded(model) {
            self.log.push(format!("✅ Marked '{}' as downloaded", model));
            self.save_store();
            // The selection is kept, only the section grouping changes
            self.refresh_model_choices();
        }

        let prefix = if refresh { "✅ Refreshed: " } else { "" };
        match &info.speakers {
            Some(list) if !list.is_empty() => self.log.push(format!(
                "{}Loaded {} speakers for multi-speaker model.",
                prefix,
                list.len()
            )),
            Some(_) => self.log.push(
                "⚠️ Multi-speaker model detected but no speakers found (using model name as fallback).",
            ),
            None => self.log.push(format!(
                "{}Single-speaker model (using model name as speaker identifier).",
                prefix
            )),
        }

        if !refresh {
            self.languages = info.language_choices();
            self.language = self.languages.first().cloned();
            if self.languages.is_empty() {
                self.log.push("Single-language model.");
            } else {
                self.log
                    .push(format!("Loaded {} languages.", self.languages.len()));
            }
        }

        self.model_info = Some(info);
        self.update_speaker_menu();
    }

    fn start_synthesis(&mut self) -> Task<Message> {
        if self.synthesizing {
            return Task::none();
        }
        let Some(model) = self.model.clone() else {
            self.log.push("❌ No model selected");
            return Task::none();
        };
        let text = self.text.text().trim().to_string();
        if text.is_empty() {
            self.log.push("⚠️ Please enter text to synthesize.");
            return Task::none();
        }
        let speed = match self.speed_input.trim().parse::<f32>() {
            Ok(speed) if speed > 0.0 => speed,
            _ => {
                self.log
                    .push(format!("❌ Invalid speed: '{}'", self.speed_input));
                return Task::none();
            }
        };

        let multi_speaker = self
            .model_info
            .as_ref()
            .map(|i| i.is_multi_speaker())
            .unwrap_or(false);
        let speaker = self
            .speaker
            .clone()
            .filter(|s| multi_speaker && s.as_str() != model);
        let language = self.language.clone().filter(|_| !self.languages.is_empty());

        self.log.push(format!(
            "Synthesizing with model: {}, speaker: {}, language: {}, speed: {}",
            model,
            speaker.as_deref().unwrap_or("None"),
            language.as_deref().unwrap_or("None"),
            speed
        ));
        self.log.push(format!(
            "Starting synthesis at {}",
            chrono::Local::now().format("%H:%M:%S")
        ));
        self.log.push(if self.device.is_gpu() {
            "Using CUDA device for synthesis"
        } else {
            "Using CPU device for synthesis"
        });

        // Release the output file before it gets rewritten
        self.stop_playback();
        self.last_output = None;

        let request = SynthesisRequest {
            model,
            text,
            output_path: self.output_path(),
            speaker,
            language,
            speed,
            device: self.device.clone(),
        };
        self.synthesize(request)
    }

    fn quick_add_tag(&mut self) {
        let (Some(model), Some(speaker)) = (self.model.clone(), self.speaker.clone()) else {
            self.log.push("⚠️ Please select a speaker first.");
            return;
        };
        let tag = match &self.quick_tag {
            Some(QuickTagChoice::Existing(tag)) => tag.clone(),
            Some(QuickTagChoice::CreateNew) => {
                let name = self.new_tag_input.trim().to_string();
                if name.is_empty() {
                    self.log.push("⚠️ Enter a name for the new tag.");
                    return;
                }
                if self.store.get_tag_definition(&name).is_none() {
                    self.store
                        .add_tag_definition(&name, &default_description(&name), DEFAULT_COLOR);
                }
                name
            }
            None => {
                self.log.push("⚠️ Please select a tag first.");
                return;
            }
        };

        self.store.add_tag_to_speaker(&model, &speaker, &tag);
        self.save_store();
        self.new_tag_input.clear();
        self.quick_tag = Some(QuickTagChoice::Existing(tag.clone()));
        self.log
            .push(format!("Added tag '{}' to speaker '{}'", tag, speaker));
    }

    fn quick_remove_tag(&mut self) {
        let (Some(model), Some(speaker)) = (self.model.clone(), self.speaker.clone()) else {
            self.log.push("⚠️ Please select a speaker first.");
            return;
        };
        let Some(QuickTagChoice::Existing(tag)) = self.quick_tag.clone() else {
            self.log.push("⚠️ Please select a tag to remove.");
            return;
        };

        if self.store.remove_tag_from_speaker(&model, &speaker, &tag) {
            self.save_store();
            self.log
                .push(format!("Removed tag '{}' from speaker '{}'", tag, speaker));
        } else {
            self.log.push(format!(
                "⚠️ Speaker '{}' doesn't have tag '{}'",
                speaker, tag
            ));
        }
    }

    fn update_tag_editor(&mut self, msg: TagEditorMessage) {
        let Some(editor) = self.tag_editor.as_mut() else {
            return;
        };

        let outcome = match msg {
            TagEditorMessage::SearchChanged(search) => {
                editor.search = search;
                Ok(None)
            }
            TagEditorMessage::FilterChanged(filter) => {
                editor.filter = filter;
                Ok(None)
            }
            TagEditorMessage::SpeakerClicked(speaker) => {
                editor.select_speaker(speaker);
                Ok(None)
            }
            TagEditorMessage::CurrentTagClicked(tag) => {
                editor.selected_current_tag = Some(tag);
                Ok(None)
            }
            TagEditorMessage::ExistingTagClicked(tag) => {
                editor.selected_existing_tag = Some(tag);
                Ok(None)
            }
            TagEditorMessage::NewTagChanged(name) => {
                editor.new_tag_input = name;
                Ok(None)
            }
            TagEditorMessage::AddNewTag => editor.add_new_tag().map(Some),
            TagEditorMessage::AddExistingTag => editor.add_existing_tag().map(Some),
            TagEditorMessage::RemoveSelectedTag => editor.remove_selected_tag().map(Some),
            TagEditorMessage::Save => {
                if let Some(editor) = self.tag_editor.take() {
                    self.store.replace_tags(editor.draft());
                    self.save_store();
                    self.update_speaker_menu();
                    self.log
                        .push(format!("Updated speaker tags for {}", editor.model()));
                }
                self.current_tab = Tab::Tester;
                return;
            }
            TagEditorMessage::Cancel => {
                if let Some(editor) = self.tag_editor.take() {
                    if editor.is_dirty() {
                        self.log.push("Tag changes discarded.");
                    }
                }
                self.current_tab = Tab::Tester;
                return;
            }
        };

        match outcome {
            Ok(Some(tag)) => debug!("Tag editor changed '{}'", tag),
            Ok(None) => {}
            Err(warning) => self.log.push(format!("⚠️ {}", warning)),
        }
    }

    fn toggle_model_status(&mut self, model: &str) {
        if self.store.is_model_downloaded(model) {
            if self.store.mark_model_not_downloaded(model) {
                self.log
                    .push(format!("📦 Marked '{}' as not downloaded", model));
            }
        } else if self.store.mark_model_downloaded(model) {
            self.log.push(format!("✅ Marked '{}' as downloaded", model));
        }
        self.save_store();
        self.refresh_model_choices();
        self.log
            .push(format!("Updated model status for {}", model));
    }
}
