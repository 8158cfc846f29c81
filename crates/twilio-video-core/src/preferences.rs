use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::options::ConnectionOptions;

const FILE_NAME: &str = "preferences.json";

/// Join preferences chosen by the host app, persisted between launches.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Preferences {
    #[serde(default = "default_true")]
    pub enable_audio_on_join: bool,
    #[serde(default = "default_true")]
    pub enable_video_on_join: bool,
    #[serde(default)]
    pub enable_h264_codec: bool,
    #[serde(default = "default_true")]
    pub speaker_on_join: bool,
    #[serde(default)]
    pub stats_interval_ms: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            enable_audio_on_join: true,
            enable_video_on_join: true,
            enable_h264_codec: false,
            speaker_on_join: true,
            stats_interval_ms: None,
        }
    }
}

impl Preferences {
    /// Connect options with every stored preference spelled out.
    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            enable_audio: Some(self.enable_audio_on_join),
            enable_video: Some(self.enable_video_on_join),
            enable_h264_codec: Some(self.enable_h264_codec),
            ..Default::default()
        }
    }
}

pub struct PreferencesStore {
    preferences: Mutex<Preferences>,
    file_path: PathBuf,
}

impl PreferencesStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let file_path = data_dir.as_ref().join(FILE_NAME);
        let preferences = Self::load(&file_path);
        Self {
            preferences: Mutex::new(preferences),
            file_path,
        }
    }

    pub fn get(&self) -> Preferences {
        self.lock().clone()
    }

    pub fn set_enable_audio_on_join(&self, enabled: bool) {
        self.update(|p| p.enable_audio_on_join = enabled);
    }

    pub fn set_enable_video_on_join(&self, enabled: bool) {
        self.update(|p| p.enable_video_on_join = enabled);
    }

    pub fn set_enable_h264_codec(&self, enabled: bool) {
        self.update(|p| p.enable_h264_codec = enabled);
    }

    pub fn set_speaker_on_join(&self, speaker: bool) {
        self.update(|p| p.speaker_on_join = speaker);
    }

    /// A zero interval clears the setting; periodic stats need a period.
    pub fn set_stats_interval_ms(&self, interval_ms: Option<u64>) {
        let interval_ms = interval_ms.filter(|ms| *ms > 0);
        self.update(|p| p.stats_interval_ms = interval_ms);
    }

    fn lock(&self) -> MutexGuard<'_, Preferences> {
        self.preferences.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, apply: impl FnOnce(&mut Preferences)) {
        let snapshot = {
            let mut prefs = self.lock();
            apply(&mut prefs);
            prefs.clone()
        };
        self.save(&snapshot);
    }

    fn save(&self, preferences: &Preferences) {
        if let Some(parent) = self.file_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let result = serde_json::to_string_pretty(preferences)
            .map_err(std::io::Error::other)
            .and_then(|json| std::fs::write(&self.file_path, json));
        if let Err(e) = result {
            tracing::warn!(path = %self.file_path.display(), "failed to save preferences: {e}");
        }
    }

    fn load(path: &Path) -> Preferences {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), "ignoring unreadable preferences: {e}");
                Preferences::default()
            }),
            Err(_) => Preferences::default(),
        }
    }
}
