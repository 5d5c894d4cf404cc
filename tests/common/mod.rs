pub mod mock_backend;

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory holding a tags file and the synthesis output
pub struct TestContext {
    pub temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            temp_dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn tags_path(&self) -> PathBuf {
        self.temp_dir.path().join("speaker_tags.json")
    }

    pub fn output_path(&self) -> PathBuf {
        self.temp_dir.path().join("out").join("tts_test.wav")
    }

    /// Write `content` as the tags file and return its path
    pub fn write_tags(&self, content: &str) -> PathBuf {
        let path = self.tags_path();
        std::fs::write(&path, content).expect("Failed to write tags file");
        path
    }

    pub fn read_json(path: &Path) -> serde_json::Value {
        let content = std::fs::read_to_string(path).expect("Failed to read file");
        serde_json::from_str(&content).expect("File is not valid JSON")
    }
}
