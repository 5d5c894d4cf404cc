//! TTS (Text-to-Speech) Module
//!
//! Provides a unified interface over the external synthesis programs the
//! tester drives, plus the service that times synthesis runs.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::{fmt, str::FromStr};
use tracing::info;

use crate::config::Config;
use crate::devices::Device;

pub mod coqui;
pub mod piper;
pub mod service;

pub use service::TtsService;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Coqui,
    Piper,
}

impl EngineKind {
    pub const ALL: [EngineKind; 2] = [EngineKind::Coqui, EngineKind::Piper];

    pub const fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Coqui => "coqui",
            EngineKind::Piper => "piper",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            EngineKind::Coqui => "Coqui TTS",
            EngineKind::Piper => "Piper",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "coqui" | "coqui tts" | "coqui_tts" => Ok(EngineKind::Coqui),
            "piper" => Ok(EngineKind::Piper),
            other => Err(format!("unknown engine '{}'", other)),
        }
    }
}

/// A model as reported by the engine's model listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelListing {
    pub name: String,
    /// The engine reports the model files as present locally
    pub downloaded: bool,
}

/// Speakers and languages offered by a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub model: String,
    /// `None` for single-speaker models
    pub speakers: Option<Vec<String>>,
    /// `None` for single-language models
    pub languages: Option<Vec<String>>,
}

impl ModelInfo {
    pub fn is_multi_speaker(&self) -> bool {
        self.speakers.is_some()
    }

    /// Speakers offered in the speaker menu.
    ///
    /// Single-speaker models, and multi-speaker models that report no
    /// speakers, use the model name as the speaker identifier so they
    /// can still be tagged.
    pub fn speaker_choices(&self) -> Vec<String> {
        match &self.speakers {
            Some(list) if !list.is_empty() => list.clone(),
            _ => vec![self.model.clone()],
        }
    }

    pub fn language_choices(&self) -> Vec<String> {
        self.languages.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub model: String,
    pub text: String,
    pub output_path: PathBuf,
    pub speaker: Option<String>,
    pub language: Option<String>,
    pub speed: f32,
    pub device: Device,
}

/// Timing and size figures of a finished synthesis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisReport {
    /// Seconds spent in the engine
    pub synthesis_time: f64,
    /// Seconds including preparation of the output file
    pub total_time: f64,
    pub file_size_mb: f64,
    pub speed_mb_per_s: f64,
}

impl SynthesisReport {
    pub fn new(synthesis_time: f64, total_time: f64, file_size_bytes: u64) -> Self {
        let file_size_mb = file_size_bytes as f64 / (1024.0 * 1024.0);
        let speed_mb_per_s = if synthesis_time > 0.0 {
            file_size_mb / synthesis_time
        } else {
            0.0
        };
        Self {
            synthesis_time,
            total_time,
            file_size_mb,
            speed_mb_per_s,
        }
    }
}

/// Trait for synthesis backends
#[async_trait]
pub trait SpeechBackend: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> EngineKind;

    /// Enumerate the models the engine knows about
    async fn list_models(&self) -> Result<Vec<ModelListing>>;

    /// Query speakers and languages, fetching the model if needed
    async fn model_info(&self, model: &str) -> Result<ModelInfo>;

    /// Synthesize `request.text` into `request.output_path`
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<()>;
}

/// Factory to create the backend for an engine
pub fn create_backend(kind: EngineKind, config: &Config) -> Arc<dyn SpeechBackend> {
    info!("🛠️ Creating TTS backend: {}", kind.label());
    match kind {
        EngineKind::Coqui => Arc::new(coqui::CoquiBackend::new(&config.coqui_binary)),
        EngineKind::Piper => Arc::new(piper::PiperBackend::new(
            &config.piper_binary,
            &config.piper_voices_dir,
        )),
    }
}

/// Build the service for an engine, applying the configured model filter
pub fn create_service(kind: EngineKind, config: &Config) -> TtsService {
    let prefixes = match kind {
        EngineKind::Coqui => config.model_prefixes.clone(),
        EngineKind::Piper => Vec::new(),
    };
    TtsService::new(create_backend(kind, config), prefixes)
}
