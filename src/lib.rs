pub mod config;
pub mod connector;
pub mod core;
pub mod io;
pub mod logging;
pub mod models;
pub mod utils;

use thiserror::Error;

// Re-export the main types for convenience
pub use config::{AppConfig, ConfigManager, LogConfig, MonitorConfig, ReplayConfig};
pub use connector::{
    ConnectorError, ConnectorFactory, EventSink, LiveSourceConnector, ReplayConnectorFactory,
};
pub use core::{
    Classification, EventClassifier, MonitorPhase, SessionBroadcaster, SessionEvent,
    SessionManager, SessionStats, StatisticsAggregator,
};
pub use io::NdjsonError;
pub use models::{
    BroadcastState, ConnectionState, EnrichedEvent, MessageKind, Priority, RawEvent,
};
pub use utils::extract_session_id;

/// クレート全体のエラー型
#[derive(Error, Debug)]
pub enum LivetapError {
    /// 設定エラー
    #[error("Configuration error: {0}")]
    Config(String),

    /// 不正なイベントペイロード
    #[error("Malformed event: {reason}")]
    MalformedEvent { reason: String },

    /// コネクタエラー
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    /// NDJSON読み込みエラー
    #[error(transparent)]
    Ndjson(#[from] NdjsonError),

    /// ログ初期化エラー
    #[error("Logging error: {0}")]
    Logging(String),

    /// I/Oエラー
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LivetapError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn malformed_event(reason: impl Into<String>) -> Self {
        Self::MalformedEvent {
            reason: reason.into(),
        }
    }

    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging(message.into())
    }
}

pub type LivetapResult<T> = Result<T, LivetapError>;
