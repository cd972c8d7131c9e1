//! ライブソースコネクタとの境界
//!
//! コネクタはネットワークI/Oやプロトコル解析を担う外部コンポーネント。
//! コアはコネクタを生成して開始・停止するだけで、コネクタからは
//! [`EventSink`]経由で生イベント・エラー・接続状態変化を受け取る。

pub mod replay;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::models::RawEvent;

pub use replay::{ReplayConnector, ReplayConnectorFactory};

/// コネクタ操作のエラー
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// コネクタの生成に失敗
    #[error("Failed to create connector for '{target}': {reason}")]
    Create { target: String, reason: String },

    /// コネクタの開始に失敗
    #[error("Failed to start connector: {0}")]
    Start(String),

    /// コネクタの停止に失敗
    #[error("Failed to stop connector: {0}")]
    Stop(String),

    /// 非同期ランタイムが利用できない
    #[error("No async runtime available: {0}")]
    Runtime(String),
}

impl ConnectorError {
    pub fn create(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Create {
            target: target.into(),
            reason: reason.into(),
        }
    }
}

/// コネクタからのコールバック受け口
pub trait ConnectorCallbacks: Send + Sync {
    fn on_raw_event(&self, raw: RawEvent);
    fn on_error(&self, message: String);
    fn on_connectivity_change(&self, connected: bool);
}

/// コネクタに渡すコールバックハンドル
///
/// 複製して任意のスレッド・タスクから呼び出せる。
#[derive(Clone)]
pub struct EventSink {
    callbacks: Arc<dyn ConnectorCallbacks>,
}

impl EventSink {
    pub fn new(callbacks: Arc<dyn ConnectorCallbacks>) -> Self {
        Self { callbacks }
    }

    /// 生イベントを通知
    pub fn emit_event(&self, raw: RawEvent) {
        self.callbacks.on_raw_event(raw);
    }

    /// JSON値を生イベントとして通知
    ///
    /// オブジェクトでない値はエラー通知に変換され、後続のイベント処理は継続する。
    pub fn emit_json(&self, value: Value) {
        match RawEvent::try_from(value) {
            Ok(raw) => self.callbacks.on_raw_event(raw),
            Err(e) => {
                tracing::warn!("⚠️ Dropping malformed event: {}", e);
                self.callbacks.on_error(e.to_string());
            }
        }
    }

    pub fn emit_error(&self, message: impl Into<String>) {
        self.callbacks.on_error(message.into());
    }

    pub fn emit_connectivity(&self, connected: bool) {
        self.callbacks.on_connectivity_change(connected);
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}

/// ライブソースコネクタ
///
/// `start`/`stop`はどちらも冪等で、呼び出し元をブロックしないこと。
/// 長時間の処理はコネクタ自身の実行コンテキストで行う。
pub trait LiveSourceConnector: Send {
    fn start(&mut self) -> Result<(), ConnectorError>;
    fn stop(&mut self) -> Result<(), ConnectorError>;

    fn name(&self) -> &str {
        "connector"
    }
}

/// コネクタのファクトリー
pub trait ConnectorFactory: Send + Sync {
    /// 監視対象とコールバックを受け取ってコネクタを生成する
    fn create(
        &self,
        target: &str,
        sink: EventSink,
    ) -> Result<Box<dyn LiveSourceConnector>, ConnectorError>;
}
