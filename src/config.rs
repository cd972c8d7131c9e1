//! アプリケーション設定管理モジュール
//!
//! XDGディレクトリを使用した設定ファイルの永続化と管理を提供します。

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::broadcaster::DEFAULT_EVENT_BUFFER;
use crate::LivetapError;

/// 監視セッション設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// 生存確認の周期（ミリ秒）
    pub liveness_interval_ms: u64,
    /// 統計リセットの周期（秒）
    pub stats_reset_interval_secs: u64,
    /// 通知チャネルのバッファサイズ
    pub event_buffer: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            liveness_interval_ms: 1000,
            stats_reset_interval_secs: 3600,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl MonitorConfig {
    pub fn liveness_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_interval_ms)
    }

    pub fn stats_reset_interval(&self) -> Duration {
        Duration::from_secs(self.stats_reset_interval_secs)
    }

    /// 値の妥当性を検証
    pub fn validate(&self) -> Result<(), LivetapError> {
        if self.liveness_interval_ms == 0 {
            return Err(LivetapError::config(
                "monitor.liveness_interval_ms must be greater than zero",
            ));
        }
        if self.stats_reset_interval_secs == 0 {
            return Err(LivetapError::config(
                "monitor.stats_reset_interval_secs must be greater than zero",
            ));
        }
        if self.event_buffer == 0 {
            return Err(LivetapError::config(
                "monitor.event_buffer must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// 再生コネクタ設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// イベント間隔（ミリ秒）
    pub event_interval_ms: u64,
    /// 末尾まで再生したら先頭から繰り返す
    pub loop_playback: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            event_interval_ms: 200,
            loop_playback: false,
        }
    }
}

impl ReplayConfig {
    pub fn event_interval(&self) -> Duration {
        Duration::from_millis(self.event_interval_ms)
    }

    /// 値の妥当性を検証
    pub fn validate(&self) -> Result<(), LivetapError> {
        if self.event_interval_ms == 0 {
            return Err(LivetapError::config(
                "replay.event_interval_ms must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// ログ設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// カスタムログディレクトリ（Noneの場合はXDGデフォルト使用）
    pub log_dir: Option<PathBuf>,
    /// ログレベル (trace/debug/info/warn/error)
    pub log_level: String,
    /// ファイル出力有効化
    pub enable_file_logging: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            log_level: "info".to_string(),
            enable_file_logging: false,
        }
    }
}

/// アプリケーション設定
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub replay: ReplayConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), LivetapError> {
        self.monitor.validate()?;
        self.replay.validate()
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "sifyfy", "livetap")
}

/// XDGデータディレクトリ配下のログディレクトリ
pub fn default_log_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// 設定管理マネージャー
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// XDG設定ディレクトリの設定ファイルを使う設定マネージャーを作成
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        // 設定ディレクトリを作成（存在しない場合）
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        Ok(Self { config_path })
    }

    /// 設定ファイルのパスを指定して作成
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// XDGディレクトリに基づく設定ファイルパスを取得
    fn get_config_path() -> Result<PathBuf> {
        let project_dirs = project_dirs().context("Failed to get project directories")?;

        let config_file = project_dirs.config_dir().join("config.toml");

        debug!("Config file path: {}", config_file.display());

        Ok(config_file)
    }

    /// 設定を読み込み
    pub fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!(
                "Config file not found, using default settings: {}",
                self.config_path.display()
            );
            return Ok(AppConfig::default());
        }

        let config_content = fs::read_to_string(&self.config_path).with_context(|| {
            format!("Failed to read config file: {}", self.config_path.display())
        })?;

        let config: AppConfig = toml::from_str(&config_content).with_context(|| {
            format!(
                "Failed to parse config file: {}",
                self.config_path.display()
            )
        })?;

        config.validate().with_context(|| {
            format!("Invalid config file: {}", self.config_path.display())
        })?;

        info!(
            "✅ Configuration loaded from: {}",
            self.config_path.display()
        );

        Ok(config)
    }

    /// 設定を保存
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        let config_content =
            toml::to_string_pretty(config).context("Failed to serialize config")?;

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(&self.config_path, config_content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;

        info!("💾 Configuration saved to: {}", self.config_path.display());

        Ok(())
    }

    /// 設定ファイルパスを取得
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 設定ファイルが存在するかチェック
    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }
}
