use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub format: FormatConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Input, state and output files. Every name is resolved against `work_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// XML export written by the station automation system.
    #[serde(default = "default_feed")]
    pub feed: PathBuf,
    /// Two-line file holding the last rendered artist and title.
    #[serde(default = "default_current_song")]
    pub current_song: PathBuf,
    /// Append-only play log, four lines per play.
    #[serde(default = "default_recent_songs")]
    pub recent_songs: PathBuf,
    #[serde(default = "default_now_playing_template")]
    pub now_playing_template: PathBuf,
    #[serde(default = "default_now_playing_output")]
    pub now_playing_output: PathBuf,
    #[serde(default = "default_latest_five_template")]
    pub latest_five_template: PathBuf,
    #[serde(default = "default_latest_five_output")]
    pub latest_five_output: PathBuf,
}

/// chrono format strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatConfig {
    #[serde(default = "default_current_time_format")]
    pub current_time: String,
    #[serde(default = "default_date_stamp_format")]
    pub date_stamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Number of entries in the latest-songs fragment.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            feed: default_feed(),
            current_song: default_current_song(),
            recent_songs: default_recent_songs(),
            now_playing_template: default_now_playing_template(),
            now_playing_output: default_now_playing_output(),
            latest_five_template: default_latest_five_template(),
            latest_five_output: default_latest_five_output(),
        }
    }
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            current_time: default_current_time_format(),
            date_stamp: default_date_stamp_format(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
        }
    }
}

impl PathsConfig {
    pub fn resolve(&self, file: &Path) -> PathBuf {
        self.work_dir.join(file)
    }

    pub fn feed_path(&self) -> PathBuf {
        self.resolve(&self.feed)
    }

    pub fn current_song_path(&self) -> PathBuf {
        self.resolve(&self.current_song)
    }

    pub fn recent_songs_path(&self) -> PathBuf {
        self.resolve(&self.recent_songs)
    }
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_feed() -> PathBuf {
    PathBuf::from("now_playing.xml")
}

fn default_current_song() -> PathBuf {
    PathBuf::from("current-song.txt")
}

fn default_recent_songs() -> PathBuf {
    PathBuf::from("recent-songs.txt")
}

fn default_now_playing_template() -> PathBuf {
    PathBuf::from("now_playing.moustache")
}

fn default_now_playing_output() -> PathBuf {
    PathBuf::from("now_playing.html")
}

fn default_latest_five_template() -> PathBuf {
    PathBuf::from("latest_five.moustache")
}

fn default_latest_five_output() -> PathBuf {
    PathBuf::from("latest_five.html")
}

fn default_current_time_format() -> String {
    "%-l:%M %p".to_string()
}

fn default_date_stamp_format() -> String {
    "%Y %m %d".to_string()
}

fn default_window_size() -> usize {
    5
}

impl Config {
    /// Load from the platform config dir, writing defaults there on first run.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
