//! セッション通知のブロードキャスト
//!
//! 分類済みイベント・状態遷移・エラー・統計スナップショットを
//! 購読者へプッシュ型で配信する。送信は非ブロッキング。

use tokio::sync::broadcast;

use crate::core::statistics::SessionStats;
use crate::models::{BroadcastState, ConnectionState, EnrichedEvent};

/// 既定のバッファサイズ
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// セッション通知
#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// 分類済みメッセージを受信した
    MessageReceived(EnrichedEvent),

    /// 接続状態が変更された
    ConnectionStateChanged(ConnectionState),

    /// 配信状態が変更された
    BroadcastStateChanged(BroadcastState),

    /// エラーが発生した
    ErrorOccurred(String),

    /// 統計情報が更新された
    StatisticsUpdated(SessionStats),
}

/// セッション通知のブロードキャスター
///
/// tokio::sync::broadcastを使用して、複数のサブスクライバーに
/// 通知を非同期で配信する。
#[derive(Debug, Clone)]
pub struct SessionBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionBroadcaster {
    /// 既定バッファサイズで作成
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_BUFFER)
    }

    /// バッファサイズを指定して作成
    ///
    /// 遅いサブスクライバーは`capacity`件を超えると古い通知を取りこぼす（lagged）。
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// 新しいサブスクリプションを作成
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// 通知をブロードキャスト
    ///
    /// サブスクライバーがいない場合は破棄される。
    pub fn broadcast(&self, event: SessionEvent) {
        // 受信者がいない場合のエラーは無視する
        let _ = self.sender.send(event);
    }

    /// 現在のサブスクライバー数を取得
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SessionBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
