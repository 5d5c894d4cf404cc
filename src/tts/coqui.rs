//! Coqui TTS backend calling the `tts` command line tool

use super::{EngineKind, ModelInfo, ModelListing, SpeechBackend, SynthesisRequest};
use crate::error::TesterError;
use anyhow::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info, warn};

lazy_static! {
    /// ` 12: tts_models/en/vctk/vits [already downloaded]`
    static ref MODEL_LINE: Regex =
        Regex::new(r"^\s*\d+:\s+(\S+)(\s+\[already downloaded\])?\s*$").expect("valid regex");
    /// quoted key of a printed Python dict: `'p225': 0`
    static ref DICT_KEY: Regex =
        Regex::new(r#"(?:'([^']*)'|"([^"]*)")\s*:"#).expect("valid regex");
    /// any quoted string, for `dict_keys([...])` / list output
    static ref QUOTED: Regex = Regex::new(r#"'([^']*)'|"([^"]*)""#).expect("valid regex");
}

#[derive(Debug, Clone)]
pub struct CoquiBackend {
    binary: String,
}

impl CoquiBackend {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        debug!("Running {} {:?}", self.binary, args);
        Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TesterError::Process(format!("Failed to spawn {}: {}", self.binary, e)).into())
    }

    /// List speakers or languages; `Ok(None)` when the model has no manager for them
    async fn list_ids(&self, model: &str, flag: &str, manager: &str) -> Result<Option<Vec<String>>> {
        let output = self.run(&["--model_name", model, flag]).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            return Ok(Some(parse_id_listing(&stdout)));
        }

        // Single-speaker / single-language models have no manager to print
        if is_missing_manager(&stderr, manager) {
            debug!("{} has no {}", model, manager);
            return Ok(None);
        }

        Err(exit_error(&self.binary, flag, &output).into())
    }
}

#[async_trait]
impl SpeechBackend for CoquiBackend {
    fn kind(&self) -> EngineKind {
        EngineKind::Coqui
    }

    async fn list_models(&self) -> Result<Vec<ModelListing>> {
        let output = self.run(&["--list_models"]).await?;
        if !output.status.success() {
            return Err(exit_error(&self.binary, "--list_models", &output).into());
        }
        let models = parse_model_listing(&String::from_utf8_lossy(&output.stdout));
        info!("📋 Coqui reports {} models", models.len());
        Ok(models)
    }

    async fn model_info(&self, model: &str) -> Result<ModelInfo> {
        // The first query downloads the model if needed
        let speakers = self
            .list_ids(model, "--list_speaker_idxs", "speaker_manager")
            .await?;
        let languages = self
            .list_ids(model, "--list_language_idxs", "language_manager")
            .await?
            .filter(|l| !l.is_empty());

        Ok(ModelInfo {
            model: model.to_string(),
            speakers,
            languages,
        })
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<()> {
        let output_path = request.output_path.to_string_lossy().to_string();
        let mut args: Vec<&str> = vec![
            "--model_name",
            request.model.as_str(),
            "--text",
            request.text.as_str(),
            "--out_path",
            output_path.as_str(),
        ];
        if let Some(speaker) = &request.speaker {
            args.extend(["--speaker_idx", speaker.as_str()]);
        }
        if let Some(language) = &request.language {
            args.extend(["--language_idx", language.as_str()]);
        }
        if request.device.is_gpu() {
            args.extend(["--use_cuda", "true"]);
        }
        if (request.speed - 1.0).abs() > f32::EPSILON {
            warn!(
                "⚠️ The tts command line has no speed control, ignoring speed {}",
                request.speed
            );
        }

        let output = self.run(&args).await?;
        if !output.status.success() {
            return Err(exit_error(&self.binary, "synthesis", &output).into());
        }
        Ok(())
    }
}

/// Parse `tts --list_models` output
pub fn parse_model_listing(stdout: &str) -> Vec<ModelListing> {
    stdout
        .lines()
        .filter_map(|line| MODEL_LINE.captures(line))
        .map(|caps| ModelListing {
            name: caps[1].to_string(),
            downloaded: caps.get(2).is_some(),
        })
        .collect()
}

/// Parse the speaker/language id dump that follows the header line.
///
/// The tool prints a Python dict (`{'p225': 0, ...}`) or, for some models,
/// a plain list of names.
pub fn parse_id_listing(stdout: &str) -> Vec<String> {
    let body = stdout
        .lines()
        .filter(|line| !line.trim_start().starts_with('>'))
        .collect::<Vec<_>>()
        .join("\n");

    let from = |re: &Regex| -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for caps in re.captures_iter(&body) {
            let id = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            if !id.is_empty() && !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    };

    let keys = from(&DICT_KEY);
    if !keys.is_empty() {
        return keys;
    }
    from(&QUOTED)
}

fn is_missing_manager(stderr: &str, manager: &str) -> bool {
    stderr.contains("'NoneType' object") || stderr.contains(&format!("no attribute '{}'", manager))
}

fn exit_error(binary: &str, what: &str, output: &Output) -> TesterError {
    TesterError::Process(format!(
        "{} {} failed with status {}: {}",
        binary,
        what,
        output.status,
        last_line(&String::from_utf8_lossy(&output.stderr))
    ))
}

fn last_line(text: &str) -> String {
    text.lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("no output")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_listing() {
        let stdout = "\n Name format: type/language/dataset/model\n \
 1: tts_models/multilingual/multi-dataset/xtts_v2 [already downloaded]\n \
 2: tts_models/en/ljspeech/vits\n\n Name format: type/language/dataset/model\n \
 1: vocoder_models/en/ljspeech/hifigan_v2\n";
        let models = parse_model_listing(stdout);
        assert_eq!(models.len(), 3);
        assert_eq!(models[0].name, "tts_models/multilingual/multi-dataset/xtts_v2");
        assert!(models[0].downloaded);
        assert_eq!(models[1].name, "tts_models/en/ljspeech/vits");
        assert!(!models[1].downloaded);
    }

    #[test]
    fn test_parse_speaker_dict() {
        let stdout = " > Available speaker ids: (Set --speaker_idx flag to one of these values to use the multi-speaker model.\n\
{'p225': 0, 'p226': 1, \"O'Brien\": 2}\n";
        assert_eq!(parse_id_listing(stdout), vec!["p225", "p226", "O'Brien"]);
    }

    #[test]
    fn test_parse_dict_keys_listing() {
        let stdout = " > Available language ids:\ndict_keys(['en', 'es', 'fr'])\n";
        assert_eq!(parse_id_listing(stdout), vec!["en", "es", "fr"]);
    }

    #[test]
    fn test_parse_empty_listing() {
        assert!(parse_id_listing(" > Available speaker ids:\n{}\n").is_empty());
    }

    #[test]
    fn test_missing_manager_detection() {
        let stderr = "AttributeError: 'NoneType' object has no attribute 'name_to_id'";
        assert!(is_missing_manager(stderr, "speaker_manager"));
        assert!(!is_missing_manager("ConnectionError: timed out", "speaker_manager"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_process_error() {
        let backend = CoquiBackend::new("/nonexistent/tts-cli");
        let err = backend.list_models().await.unwrap_err();
        match err.downcast_ref::<TesterError>() {
            Some(TesterError::Process(msg)) => assert!(msg.contains("/nonexistent/tts-cli")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
