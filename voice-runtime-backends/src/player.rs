use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use voice_runtime_core::VoiceError;

use crate::process::{find_program, run_until_stopped, StopSignal};

/// Command-line players, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerKind {
    Mpg123,
    Ffplay,
    /// `play` from the sox package.
    SoxPlay,
}

impl PlayerKind {
    pub const ALL: [PlayerKind; 3] = [PlayerKind::Mpg123, PlayerKind::Ffplay, PlayerKind::SoxPlay];

    pub fn program(&self) -> &'static str {
        match self {
            Self::Mpg123 => "mpg123",
            Self::Ffplay => "ffplay",
            Self::SoxPlay => "play",
        }
    }

    fn args(&self, file: &Path) -> Vec<OsString> {
        let flags: &[&str] = match self {
            Self::Mpg123 => &["-q"],
            Self::Ffplay => &["-nodisp", "-autoexit", "-loglevel", "quiet"],
            Self::SoxPlay => &["-q"],
        };
        let mut args: Vec<OsString> = flags.iter().map(OsString::from).collect();
        args.push(file.as_os_str().to_owned());
        args
    }
}

/// Plays synthesized audio files through an external player, with an
/// optional sox tempo stage.
///
/// Temporary files are removed when playback ends, whatever the outcome.
///
/// Callers take a [`generation`](Self::generation) before preparing audio and
/// pass it to the play methods. Audio prepared before the last
/// [`stop`](Self::stop) is dropped instead of played.
pub struct AudioPlayer {
    player: Option<(PlayerKind, PathBuf)>,
    sox: Option<PathBuf>,
    stop: StopSignal,
}

impl AudioPlayer {
    /// Find the first installed player and sox in `PATH`.
    pub fn detect() -> Self {
        let player = PlayerKind::ALL
            .iter()
            .find_map(|kind| find_program(kind.program()).map(|path| (*kind, path)));
        let sox = find_program("sox");
        let detected = Self::with_programs(player, sox);
        log::info!("Audio player: {}", detected.describe());
        detected
    }

    pub fn with_programs(player: Option<(PlayerKind, PathBuf)>, sox: Option<PathBuf>) -> Self {
        Self {
            player,
            sox,
            stop: StopSignal::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.player.is_some()
    }

    pub fn describe(&self) -> String {
        match (&self.player, &self.sox) {
            (Some((kind, _)), Some(_)) => format!("{} (tempo via sox)", kind.program()),
            (Some((kind, _)), None) => kind.program().to_string(),
            (None, _) => "none".to_string(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.stop.generation()
    }

    /// Write `audio` to a temporary `.{extension}` file and play it.
    pub async fn play_bytes(
        &self,
        generation: u64,
        audio: &[u8],
        extension: &str,
        rate: f32,
    ) -> Result<(), VoiceError> {
        if self.stop.is_stopped_since(generation) {
            log::debug!("Dropping audio prepared before stop");
            return Ok(());
        }
        let file = temp_file(extension)?;
        tokio::fs::write(file.path(), audio)
            .await
            .map_err(|e| VoiceError::StorageError(format!("failed to write temp audio: {}", e)))?;
        self.play_file(generation, file.path(), rate).await
    }

    /// Play `path` at `rate` (1.0 = unchanged).
    pub async fn play_file(&self, generation: u64, path: &Path, rate: f32) -> Result<(), VoiceError> {
        let (kind, program) = self
            .player
            .as_ref()
            .ok_or_else(|| VoiceError::ServiceUnavailable("no audio player installed".into()))?;

        let adjusted = self.apply_tempo(generation, path, rate).await;
        let target = adjusted.as_ref().map(|f| f.path()).unwrap_or(path);
        run_until_stopped(program, kind.args(target), &self.stop, generation).await
    }

    /// Best effort: `None` means play the original file.
    async fn apply_tempo(&self, generation: u64, path: &Path, rate: f32) -> Option<NamedTempFile> {
        if (rate - 1.0).abs() < 0.01 {
            return None;
        }
        let sox = self.sox.as_ref()?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("wav");
        let output = match temp_file(extension) {
            Ok(output) => output,
            Err(e) => {
                log::warn!("Tempo stage skipped: {}", e);
                return None;
            }
        };

        let args: Vec<OsString> = vec![
            path.as_os_str().to_owned(),
            output.path().as_os_str().to_owned(),
            OsString::from("tempo"),
            OsString::from(format!("{:.2}", rate)),
        ];
        match run_until_stopped(sox, args, &self.stop, generation).await {
            Ok(()) => Some(output),
            Err(e) => {
                log::warn!("Tempo change failed, playing at normal speed: {}", e);
                None
            }
        }
    }

    /// Interrupt whatever is playing and drop audio still being prepared.
    pub fn stop(&self) {
        self.stop.stop();
    }
}

fn temp_file(extension: &str) -> Result<NamedTempFile, VoiceError> {
    tempfile::Builder::new()
        .prefix("voz_")
        .suffix(&format!(".{}", extension))
        .tempfile()
        .map_err(|e| VoiceError::StorageError(format!("failed to create temp file: {}", e)))
}
