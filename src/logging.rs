//! ログ初期化
//!
//! 標準エラーへのコンパクト出力と、有効時は日次ローテーションのファイル出力。
//! `RUST_LOG`が設定されていれば設定ファイルのレベルより優先する。

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{default_log_dir, LogConfig};
use crate::{LivetapError, LivetapResult};

const LOG_FILE_PREFIX: &str = "livetap.log";

/// ログ出力を維持するガード
///
/// ドロップ時に未書き込みのログをフラッシュする。プロセス終了まで保持すること。
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// ファイル出力先（ファイル出力無効時は`None`）
    pub fn log_dir(&self) -> Option<&PathBuf> {
        self.log_dir.as_ref()
    }
}

fn build_filter(level: &str) -> LivetapResult<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| LivetapError::logging(format!("invalid log level '{}': {}", level, e)))
}

/// ログシステムを初期化
pub fn init_logging(config: &LogConfig) -> LivetapResult<LoggingGuard> {
    let env_filter = build_filter(&config.log_level)?;

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let (file_layer, file_guard, log_dir) = if config.enable_file_logging {
        let log_dir = config.log_dir.clone().unwrap_or_else(default_log_dir);
        std::fs::create_dir_all(&log_dir)?;

        let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        let layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true);

        (Some(layer), Some(guard), Some(log_dir))
    } else {
        (None, None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LivetapError::logging(e.to_string()))?;

    tracing::info!(
        level = %config.log_level,
        file_logging = config.enable_file_logging,
        log_dir = ?log_dir,
        "📝 Logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_dir,
    })
}

/// テスト用のログ初期化（重複初期化は無視）
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let result = build_filter("livetap=verbose");
        assert!(matches!(result, Err(LivetapError::Logging(_))));
    }

    #[test]
    fn test_valid_level_is_accepted() {
        assert!(build_filter("debug").is_ok());
        assert!(build_filter("livetap=trace,warn").is_ok());
    }

    #[test]
    fn test_init_test_logging_is_idempotent() {
        init_test_logging();
        init_test_logging();
        tracing::info!("still alive");
    }
}
