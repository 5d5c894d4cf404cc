//! In-window log pane

use iced::Color;
use tracing::{error, info};

use super::theme;

const MAX_ENTRIES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Success,
    Error,
    Timing,
    Info,
    Plain,
}

impl LogKind {
    /// Classify a line by its leading marker
    pub fn classify(line: &str) -> Self {
        if line.starts_with('✅') {
            LogKind::Success
        } else if line.starts_with('❌') {
            LogKind::Error
        } else if line.starts_with('⏱') {
            LogKind::Timing
        } else if ['📁', '📊', '🚀'].iter().any(|c| line.starts_with(*c)) {
            LogKind::Info
        } else {
            LogKind::Plain
        }
    }

    pub fn color(&self) -> Option<Color> {
        let c = theme::colors();
        match self {
            LogKind::Success => Some(c.success),
            LogKind::Error => Some(c.error),
            LogKind::Timing => Some(c.timing),
            LogKind::Info => Some(c.info),
            LogKind::Plain => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub time: String,
    pub text: String,
    pub kind: LogKind,
}

#[derive(Debug, Default)]
pub struct LogBuffer {
    entries: Vec<LogEntry>,
}

impl LogBuffer {
    pub fn push(&mut self, text: impl Into<String>) {
        let text = text.into();
        let kind = LogKind::classify(&text);
        match kind {
            LogKind::Error => error!("{}", text),
            _ => info!("{}", text),
        }

        self.entries.push(LogEntry {
            time: chrono::Local::now().format("%H:%M:%S").to_string(),
            text,
            kind,
        });
        if self.entries.len() > MAX_ENTRIES {
            let excess = self.entries.len() - MAX_ENTRIES;
            self.entries.drain(..excess);
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(LogKind::classify("✅ Synthesis completed"), LogKind::Success);
        assert_eq!(LogKind::classify("❌ Synthesis failed"), LogKind::Error);
        assert_eq!(LogKind::classify("⏱️  TTS synthesis time: 1.00 seconds"), LogKind::Timing);
        assert_eq!(LogKind::classify("📁 Audio saved"), LogKind::Info);
        assert_eq!(LogKind::classify("🚀 Synthesis speed"), LogKind::Info);
        assert_eq!(LogKind::classify("Playback finished."), LogKind::Plain);
        assert!(LogKind::Plain.color().is_none());
    }

    #[test]
    fn test_buffer_is_capped() {
        let mut log = LogBuffer::default();
        for i in 0..(MAX_ENTRIES + 10) {
            log.push(format!("line {}", i));
        }
        assert_eq!(log.entries().len(), MAX_ENTRIES);
        assert_eq!(log.entries()[0].text, "line 10");
    }
}
