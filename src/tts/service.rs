//! Synthesis service
//!
//! Wraps a backend with the model currently loaded and times each run.

use super::{EngineKind, ModelInfo, SpeechBackend, SynthesisReport, SynthesisRequest};
use crate::error::{TesterError, TesterResult};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct TtsService {
    backend: Arc<dyn SpeechBackend>,
    model_prefixes: Vec<String>,
    current_model: Mutex<Option<String>>,
}

impl TtsService {
    pub fn new(backend: Arc<dyn SpeechBackend>, model_prefixes: Vec<String>) -> Self {
        Self {
            backend,
            model_prefixes,
            current_model: Mutex::new(None),
        }
    }

    pub fn kind(&self) -> EngineKind {
        self.backend.kind()
    }

    /// Fetch speakers and languages for `model` and make it current
    pub async fn load_model(&self, model: &str) -> TesterResult<ModelInfo> {
        info!("🔄 Loading model: {}", model);
        let info = self
            .backend
            .model_info(model)
            .await
            .map_err(|e| TesterError::Tts(format!("Failed to load model {}: {}", model, e)))?;

        *self.current_model.lock()? = Some(model.to_string());
        info!(
            "✅ Model loaded: {} ({} speakers, {} languages)",
            model,
            info.speakers.as_ref().map(Vec::len).unwrap_or(0),
            info.languages.as_ref().map(Vec::len).unwrap_or(0)
        );
        Ok(info)
    }

    pub fn current_model(&self) -> Option<String> {
        self.current_model.lock().ok().and_then(|m| m.clone())
    }

    /// Same as [`load_model`](Self::load_model) without changing the current model
    pub async fn get_model_info(&self, model: &str) -> TesterResult<ModelInfo> {
        self.backend
            .model_info(model)
            .await
            .map_err(|e| TesterError::Tts(format!("Failed to query model {}: {}", model, e)))
    }

    /// Synthesize into `request.output_path` and report timing and size
    pub async fn synthesize_text(&self, request: &SynthesisRequest) -> TesterResult<SynthesisReport> {
        let total_start = Instant::now();

        if self.current_model().is_none() {
            return Err(TesterError::Tts("No TTS model loaded".to_string()));
        }

        let output = &request.output_path;
        if output.exists() {
            debug!("Removing previous output {}", output.display());
            std::fs::remove_file(output)?;
        }
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!(
            "🚀 Synthesizing {} chars with {} on {}",
            request.text.chars().count(),
            request.model,
            request.device
        );
        let synth_start = Instant::now();
        self.backend
            .synthesize(request)
            .await
            .map_err(|e| match e.downcast::<TesterError>() {
                Ok(err) => err,
                Err(e) => TesterError::Tts(e.to_string()),
            })?;
        let synthesis_time = synth_start.elapsed().as_secs_f64();

        if !output.exists() {
            return Err(TesterError::Tts("Audio file was not created".to_string()));
        }
        let size = std::fs::metadata(output)?.len();
        let report = SynthesisReport::new(synthesis_time, total_start.elapsed().as_secs_f64(), size);

        info!(
            "⏱️ Synthesis took {:.2}s ({:.2} MB)",
            report.synthesis_time, report.file_size_mb
        );
        Ok(report)
    }

    /// Model names reported by the engine, restricted to the configured prefixes
    pub async fn list_available_models(&self) -> TesterResult<Vec<(String, bool)>> {
        let listing = self
            .backend
            .list_models()
            .await
            .map_err(|e| TesterError::Tts(format!("Failed to list models: {}", e)))?;

        let models: Vec<(String, bool)> = listing
            .into_iter()
            .filter(|m| self.matches_prefix(&m.name))
            .map(|m| (m.name, m.downloaded))
            .collect();

        if models.is_empty() {
            warn!("⚠️ No models matched the configured prefixes");
        }
        Ok(models)
    }

    fn matches_prefix(&self, model: &str) -> bool {
        self.model_prefixes.is_empty() || self.model_prefixes.iter().any(|p| model.starts_with(p))
    }

    /// Forget the loaded model
    pub fn cleanup(&self) {
        if let Ok(mut current) = self.current_model.lock() {
            if let Some(model) = current.take() {
                debug!("Unloaded model {}", model);
            }
        }
    }
}
