use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{TesterError, TesterResult};
use crate::tts::EngineKind;

/// Text placed in the input box on startup and by "Reset to Default"
pub const DEFAULT_TEXT: &str = "The quick brown fox jumps over the lazy dog, yet every now and then, peculiar voices echo through the canyon. Hyperbolic statements and subtle sarcasm make linguistics uniquely complex. She sells sea shells by the seashore, while he thoroughly thought through the theory of thermodynamics. Does the artificial speaker articulate acronyms like NASA, AI, and GPU naturally? Consider how rhythm, emphasis, and intonation change with punctuation \u{2014} like commas, ellipses... or dashes. Ultimately, the true test is whether it sounds convincingly human.";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Engines
    pub engine: String,
    pub coqui_binary: String,
    pub piper_binary: String,
    pub piper_voices_dir: String,
    pub model_prefixes: Vec<String>,

    // Files
    pub tags_file: String,
    pub output_path: String,

    // Synthesis
    pub default_text: String,
    pub speed: f32,

    // Meta
    pub log_level: String,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: "coqui".to_string(),
            coqui_binary: "tts".to_string(),
            piper_binary: "piper".to_string(),
            piper_voices_dir: dirs::data_dir()
                .unwrap_or_default()
                .join("piper/voices")
                .to_string_lossy()
                .to_string(),
            model_prefixes: vec![
                "tts_models/en/".to_string(),
                "tts_models/multilingual/".to_string(),
            ],
            tags_file: data_dir()
                .join("speaker_tags.json")
                .to_string_lossy()
                .to_string(),
            output_path: data_dir()
                .join("tts_test.wav")
                .to_string_lossy()
                .to_string(),
            default_text: DEFAULT_TEXT.to_string(),
            speed: 1.0,
            log_level: "info".to_string(),
            window_width: 760.0,
            window_height: 860.0,
        }
    }
}

impl Config {
    /// Load config from the default location, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load config from an explicit path with graceful degradation
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                let backup_path = path.with_extension("json.corrupt");
                let _ = std::fs::rename(path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The configured engine
    pub fn engine_kind(&self) -> TesterResult<EngineKind> {
        self.engine
            .parse()
            .map_err(|e: String| TesterError::Config(format!("engine: {}", e)))
    }

    /// Speed as entered by the user, clamped to something the engines accept
    pub fn effective_speed(&self) -> f32 {
        if self.speed.is_finite() && self.speed > 0.0 {
            self.speed
        } else {
            1.0
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tts-tester")
        .join("config.json")
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tts-tester")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine, "coqui");
        assert_eq!(config.coqui_binary, "tts");
        assert_eq!(config.speed, 1.0);
        assert_eq!(config.model_prefixes.len(), 2);
        assert!(config.tags_file.ends_with("speaker_tags.json"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str(r#"{"engine": "piper"}"#).unwrap();
        assert_eq!(config.engine, "piper");
        assert_eq!(config.piper_binary, "piper");
        assert_eq!(config.default_text, DEFAULT_TEXT);
    }

    #[test]
    fn test_corrupt_config_is_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not valid json").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.engine, "coqui");
        assert!(!path.exists());
        assert!(dir.path().join("config.json.corrupt").exists());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.json");
        let mut config = Config::default();
        config.speed = 1.25;
        config.save_to(&path).unwrap();

        let restored = Config::load_from(&path).unwrap();
        assert_eq!(restored.speed, 1.25);
    }

    #[test]
    fn test_engine_kind() {
        let mut config = Config::default();
        assert_eq!(config.engine_kind().unwrap(), EngineKind::Coqui);
        config.engine = "Piper".into();
        assert_eq!(config.engine_kind().unwrap(), EngineKind::Piper);

        config.engine = "espeak".into();
        let err = config.engine_kind().unwrap_err();
        assert!(matches!(err, TesterError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: engine: unknown engine 'espeak'"
        );
    }

    #[test]
    fn test_effective_speed() {
        let mut config = Config::default();
        config.speed = 0.0;
        assert_eq!(config.effective_speed(), 1.0);
        config.speed = f32::NAN;
        assert_eq!(config.effective_speed(), 1.0);
        config.speed = 1.5;
        assert_eq!(config.effective_speed(), 1.5);
    }
}
