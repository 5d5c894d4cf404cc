//! Piper TTS backend calling a local binary

use super::{EngineKind, ModelInfo, ModelListing, SpeechBackend, SynthesisRequest};
use crate::error::TesterError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct PiperBackend {
    binary: String,
    voices_dir: PathBuf,
}

impl PiperBackend {
    pub fn new(binary: &str, voices_dir: &str) -> Self {
        let voices_dir = PathBuf::from(voices_dir);
        if !voices_dir.exists() {
            warn!("⚠️ Piper voices directory not found at {}", voices_dir.display());
        }
        Self {
            binary: binary.to_string(),
            voices_dir,
        }
    }

    fn model_path(&self, model: &str) -> PathBuf {
        self.voices_dir.join(format!("{}.onnx", model))
    }

    fn config_path(&self, model: &str) -> PathBuf {
        self.voices_dir.join(format!("{}.onnx.json", model))
    }

    fn read_voice_config(&self, model: &str) -> Result<Value> {
        let path = self.config_path(model);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Piper voice config missing: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid Piper voice config: {}", path.display()))
    }
}

#[async_trait]
impl SpeechBackend for PiperBackend {
    fn kind(&self) -> EngineKind {
        EngineKind::Piper
    }

    async fn list_models(&self) -> Result<Vec<ModelListing>> {
        let mut models = Vec::new();
        if !self.voices_dir.exists() {
            return Ok(models);
        }

        let mut entries = tokio::fs::read_dir(&self.voices_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "onnx").unwrap_or(false) {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                if name.is_empty() {
                    continue;
                }
                let downloaded = self.config_path(&name).exists();
                models.push(ModelListing { name, downloaded });
            }
        }
        models.sort_by(|a, b| a.name.cmp(&b.name));

        info!("📋 Found {} Piper voices in {}", models.len(), self.voices_dir.display());
        Ok(models)
    }

    async fn model_info(&self, model: &str) -> Result<ModelInfo> {
        if !self.model_path(model).exists() {
            return Err(anyhow::anyhow!(
                "Piper model file missing: {}",
                self.model_path(model).display()
            ));
        }
        let config = self.read_voice_config(model)?;
        Ok(parse_voice_config(model, &config))
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<()> {
        info!("📢 Piper synthesizing with '{}'", request.model);

        let model_path = self.model_path(&request.model);
        if !model_path.exists() {
            return Err(anyhow::anyhow!(
                "Piper model file missing: {}",
                model_path.display()
            ));
        }

        let speaker = match &request.speaker {
            Some(speaker) => {
                let id = speaker_id(&self.read_voice_config(&request.model)?, speaker);
                if id.is_none() {
                    warn!("⚠️ Speaker '{}' not in voice config, using default", speaker);
                }
                id
            }
            None => None,
        };

        let mut child = Command::new(&self.binary)
            .args(synthesis_args(&model_path, request, speaker))
            .kill_on_drop(true)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                error!("❌ Failed to spawn {}: {}", self.binary, e);
                TesterError::Process(format!("Failed to spawn {}: {}", self.binary, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(request.text.as_bytes()).await?;
            stdin.flush().await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(TesterError::Process(format!(
                "Piper failed with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))
            .into());
        }

        debug!("✅ Piper wrote {}", request.output_path.display());
        Ok(())
    }
}

/// Extract speakers (ordered by id) and language from a `.onnx.json` voice config
pub fn parse_voice_config(model: &str, config: &Value) -> ModelInfo {
    let speakers = config
        .get("speaker_id_map")
        .and_then(Value::as_object)
        .filter(|map| !map.is_empty())
        .map(|map| {
            let mut pairs: Vec<(u64, String)> = map
                .iter()
                .map(|(name, id)| (id.as_u64().unwrap_or(u64::MAX), name.clone()))
                .collect();
            pairs.sort();
            pairs.into_iter().map(|(_, name)| name).collect::<Vec<_>>()
        });

    let languages = config
        .get("espeak")
        .and_then(|e| e.get("voice"))
        .and_then(Value::as_str)
        .map(|voice| vec![voice.to_string()]);

    ModelInfo {
        model: model.to_string(),
        speakers,
        languages,
    }
}

fn speaker_id(config: &Value, speaker: &str) -> Option<u64> {
    config
        .get("speaker_id_map")
        .and_then(|m| m.get(speaker))
        .and_then(Value::as_u64)
}

/// Command line for one synthesis run; the text goes to stdin
fn synthesis_args(model_path: &Path, request: &SynthesisRequest, speaker: Option<u64>) -> Vec<String> {
    let mut args = vec![
        "-m".to_string(),
        model_path.to_string_lossy().to_string(),
        "-f".to_string(),
        request.output_path.to_string_lossy().to_string(),
    ];
    if let Some(id) = speaker {
        args.extend(["--speaker".to_string(), id.to_string()]);
    }
    // piper stretches phonemes, so faster speech means a smaller scale
    if request.speed > 0.0 && (request.speed - 1.0).abs() > f32::EPSILON {
        args.extend([
            "--length_scale".to_string(),
            format!("{:.3}", 1.0 / request.speed),
        ]);
    }
    if request.device.is_gpu() {
        args.push("--cuda".to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::Device;
    use serde_json::json;

    #[test]
    fn test_parse_multi_speaker_config() {
        let config = json!({
            "espeak": {"voice": "en-us"},
            "speaker_id_map": {"b": 1, "a": 0, "c": 2}
        });
        let info = parse_voice_config("en_US-libritts-high", &config);
        assert_eq!(info.speakers, Some(vec!["a".into(), "b".into(), "c".into()]));
        assert_eq!(info.languages, Some(vec!["en-us".to_string()]));
        assert_eq!(speaker_id(&config, "c"), Some(2));
        assert_eq!(speaker_id(&config, "zz"), None);
    }

    #[test]
    fn test_parse_single_speaker_config() {
        let config = json!({"speaker_id_map": {}, "audio": {"quality": "high"}});
        let info = parse_voice_config("en_GB-cori-high", &config);
        assert!(!info.is_multi_speaker());
        assert!(info.languages.is_none());
    }

    #[tokio::test]
    async fn test_list_models_marks_configured_voices() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.onnx"), b"").unwrap();
        std::fs::write(dir.path().join("a.onnx.json"), b"{}").unwrap();
        std::fs::write(dir.path().join("b.onnx"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let backend = PiperBackend::new("piper", &dir.path().to_string_lossy());
        let models = backend.list_models().await.unwrap();
        assert_eq!(
            models,
            vec![
                ModelListing { name: "a".into(), downloaded: true },
                ModelListing { name: "b".into(), downloaded: false },
            ]
        );
    }

    #[tokio::test]
    async fn test_model_info_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let backend = PiperBackend::new("piper", &dir.path().to_string_lossy());
        assert!(backend.model_info("nope").await.is_err());
    }

    fn request(speed: f32, device: Device) -> SynthesisRequest {
        SynthesisRequest {
            model: "en_US-amy-medium".into(),
            text: "hello".into(),
            output_path: PathBuf::from("/tmp/out.wav"),
            speaker: None,
            language: None,
            speed,
            device,
        }
    }

    #[test]
    fn test_synthesis_args_length_scale() {
        let model = Path::new("/voices/en_US-amy-medium.onnx");

        let args = synthesis_args(model, &request(1.0, Device::Cpu), None);
        assert_eq!(
            args,
            vec!["-m", "/voices/en_US-amy-medium.onnx", "-f", "/tmp/out.wav"]
        );

        let args = synthesis_args(model, &request(2.0, Device::Cpu), Some(3));
        assert_eq!(
            &args[4..],
            &["--speaker", "3", "--length_scale", "0.500"]
        );

        let args = synthesis_args(model, &request(0.8, Device::Cpu), None);
        assert_eq!(&args[4..], &["--length_scale", "1.250"]);
    }

    #[test]
    fn test_synthesis_args_cuda_and_bad_speed() {
        let gpu = Device::Cuda {
            index: 0,
            name: "RTX".into(),
        };
        let args = synthesis_args(Path::new("m.onnx"), &request(0.0, gpu), None);
        assert_eq!(&args[4..], &["--cuda"]);
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_process_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.onnx"), b"").unwrap();
        let backend = PiperBackend::new(
            "/nonexistent/piper-binary",
            &dir.path().to_string_lossy(),
        );
        let mut req = request(1.0, Device::Cpu);
        req.model = "a".into();

        let err = backend.synthesize(&req).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TesterError>(),
            Some(TesterError::Process(_))
        ));
    }
}
