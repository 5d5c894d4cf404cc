//! Sound engine for playing synthesized files
//!
//! rodio's output stream is not `Send`, so a dedicated audio thread owns it
//! and receives commands over a channel. The current sink is shared so the
//! GUI can poll whether playback is still running.

use rodio::{Decoder, OutputStream, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::{TesterError, TesterResult};

/// Commands sent to the audio thread
enum AudioCommand {
    Play(PathBuf, mpsc::Sender<anyhow::Result<()>>),
    Stop,
}

type SharedSink = Arc<Mutex<Option<Arc<Sink>>>>;

/// Thread-safe handle to the sound engine
#[derive(Clone)]
pub struct SoundEngine {
    sender: mpsc::Sender<AudioCommand>,
    current: SharedSink,
}

impl std::fmt::Debug for SoundEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundEngine")
            .field("playing", &self.is_playing())
            .finish()
    }
}

impl SoundEngine {
    pub fn new() -> TesterResult<Self> {
        let (sender, receiver) = mpsc::channel::<AudioCommand>();
        let current: SharedSink = Arc::new(Mutex::new(None));

        let shared = Arc::clone(&current);
        thread::Builder::new()
            .name("audio".to_string())
            .spawn(move || Self::audio_thread(receiver, shared))
            .map_err(|e| TesterError::Audio(format!("Failed to start audio thread: {}", e)))?;

        Ok(Self { sender, current })
    }

    fn audio_thread(receiver: mpsc::Receiver<AudioCommand>, current: SharedSink) {
        // Output is opened lazily so a missing sound card only fails playback
        let mut output: Option<(OutputStream, rodio::OutputStreamHandle)> = None;

        info!("🔊 Audio thread started");

        while let Ok(cmd) = receiver.recv() {
            match cmd {
                AudioCommand::Play(path, resp) => {
                    Self::stop_current(&current);
                    if output.is_none() {
                        match OutputStream::try_default() {
                            Ok(stream) => output = Some(stream),
                            Err(e) => {
                                warn!("🔇 Failed to initialize audio output: {}", e);
                                let _ = resp.send(Err(anyhow::anyhow!(
                                    "Failed to initialize audio output: {}",
                                    e
                                )));
                                continue;
                            }
                        }
                    }
                    let result = match &output {
                        Some((_, handle)) => Self::start_sink(handle, &path),
                        None => Err(anyhow::anyhow!("Audio output unavailable")),
                    };
                    let result = result.and_then(|sink| {
                        let mut guard = current
                            .lock()
                            .map_err(|e| anyhow::anyhow!("Audio state poisoned: {}", e))?;
                        *guard = Some(sink);
                        Ok(())
                    });
                    if let Err(e) = &result {
                        error!("❌ Audio playback failed for {:?}: {}", path, e);
                    }
                    let _ = resp.send(result);
                }
                AudioCommand::Stop => {
                    info!("🛑 Stopping playback");
                    Self::stop_current(&current);
                }
            }
        }

        info!("🔇 Audio thread stopped");
    }

    fn start_sink(handle: &rodio::OutputStreamHandle, path: &Path) -> anyhow::Result<Arc<Sink>> {
        if !path.exists() {
            anyhow::bail!("Audio file not found: {:?}", path);
        }
        let file = File::open(path)?;
        let source = Decoder::new(BufReader::new(file))?;
        let sink = Sink::try_new(handle)?;
        sink.append(source);
        info!("🔊 Playing: {:?}", path.file_name().unwrap_or_default());
        Ok(Arc::new(sink))
    }

    fn stop_current(current: &SharedSink) {
        if let Ok(mut guard) = current.lock() {
            if let Some(sink) = guard.take() {
                sink.stop();
                debug!("Previous playback stopped");
            }
        }
    }

    /// Start playing a file, replacing anything already playing.
    ///
    /// Returns once the file has been decoded and queued.
    pub fn play_file<P: Into<PathBuf>>(&self, path: P) -> TesterResult<()> {
        let (tx, rx) = mpsc::channel();
        self.sender
            .send(AudioCommand::Play(path.into(), tx))
            .map_err(|_| disconnected())?;
        rx.recv()
            .map_err(|_| disconnected())?
            .map_err(|e| TesterError::Audio(e.to_string()))
    }

    pub fn stop(&self) -> TesterResult<()> {
        self.sender
            .send(AudioCommand::Stop)
            .map_err(|_| disconnected())
    }

    pub fn is_playing(&self) -> bool {
        self.current
            .lock()
            .map(|guard| guard.as_ref().map(|s| !s.empty()).unwrap_or(false))
            .unwrap_or(false)
    }
}

fn disconnected() -> TesterError {
    TesterError::Audio("Audio thread disconnected".to_string())
}

/// Length of an audio file, if the decoder can tell
pub fn audio_duration(path: &Path) -> Option<Duration> {
    let file = File::open(path).ok()?;
    Decoder::new(BufReader::new(file)).ok()?.total_duration()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_of_missing_file() {
        assert!(audio_duration(Path::new("/nonexistent/file.wav")).is_none());
    }

    #[test]
    fn test_duration_of_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"definitely not audio").unwrap();
        assert!(audio_duration(&path).is_none());
    }

    #[test]
    fn test_missing_file_is_an_audio_error() {
        let engine = SoundEngine::new().unwrap();
        // fails at output setup on machines without sound, else at the file
        let err = engine.play_file("/nonexistent/file.wav").unwrap_err();
        assert!(matches!(err, TesterError::Audio(_)));
        assert!(!engine.is_playing());
        engine.stop().unwrap();
    }
}
