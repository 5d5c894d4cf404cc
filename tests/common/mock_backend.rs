//! Mock synthesis backend for testing
//!
//! Records every request and writes a small fake WAV file.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tts_tester::error::TesterError;
use tts_tester::tts::{
    EngineKind, ModelInfo, ModelListing, SpeechBackend, SynthesisRequest,
};

/// Mock backend that records synthesis requests
#[derive(Debug)]
pub struct MockBackend {
    pub models: Vec<ModelListing>,
    pub info: ModelInfo,
    /// All requests that were "synthesized"
    pub requests: Arc<Mutex<Vec<SynthesisRequest>>>,
    /// Fail the next synthesis
    pub should_fail: Arc<Mutex<bool>>,
    /// Pretend success without writing the output file
    pub skip_write: bool,
    /// Fail as if the engine binary could not be started
    pub missing_binary: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            models: vec![
                ModelListing {
                    name: "tts_models/en/vctk/vits".into(),
                    downloaded: true,
                },
                ModelListing {
                    name: "tts_models/multilingual/multi-dataset/xtts_v2".into(),
                    downloaded: false,
                },
                ModelListing {
                    name: "tts_models/de/thorsten/vits".into(),
                    downloaded: false,
                },
            ],
            info: ModelInfo {
                model: "tts_models/en/vctk/vits".into(),
                speakers: Some(vec!["p225".into(), "p226".into()]),
                languages: None,
            },
            requests: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
            skip_write: false,
            missing_binary: false,
        }
    }

    pub fn get_requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechBackend for MockBackend {
    fn kind(&self) -> EngineKind {
        EngineKind::Coqui
    }

    async fn list_models(&self) -> Result<Vec<ModelListing>> {
        Ok(self.models.clone())
    }

    async fn model_info(&self, model: &str) -> Result<ModelInfo> {
        if !self.models.iter().any(|m| m.name == model) {
            return Err(anyhow::anyhow!("Model {} not found", model));
        }
        Ok(ModelInfo {
            model: model.to_string(),
            ..self.info.clone()
        })
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<()> {
        if self.missing_binary {
            return Err(TesterError::Process("Failed to spawn tts: not found".into()).into());
        }
        if *self.should_fail.lock().unwrap() {
            return Err(anyhow::anyhow!("Mock synthesis failure"));
        }
        self.requests.lock().unwrap().push(request.clone());
        if !self.skip_write {
            // contents are never decoded
            std::fs::write(&request.output_path, vec![0u8; 1024])?;
        }
        Ok(())
    }
}
