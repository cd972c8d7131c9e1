//! セッション統計の集計
//!
//! 種別ごとのカウンタ・セッション開始時刻・最終受信時刻を保持し、
//! 生存確認ごとに稼働時間を再計算する。
//! 通知はセッションマネージャーが戻り値のスナップショットを使って行う。

use serde::{Deserialize, Serialize};

use crate::models::{now_timestamp, MessageKind};

/// セッション統計のスナップショット
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_messages: u64,
    pub chat_messages: u64,
    pub gift_messages: u64,
    pub like_messages: u64,
    pub enter_messages: u64,
    pub follow_messages: u64,
    /// セッション開始時刻（UNIXエポック秒）
    pub session_start_time: Option<f64>,
    /// 最終メッセージ受信時刻（UNIXエポック秒）
    pub last_message_time: Option<f64>,
    /// 稼働秒数（生存確認ごとに再計算）
    pub running_seconds: f64,
}

impl SessionStats {
    /// 種別ごとのカウンタを取得
    ///
    /// 個別カウンタを持たない種別は`None`（総数にのみ計上される）。
    pub fn count_for(&self, kind: MessageKind) -> Option<u64> {
        match kind {
            MessageKind::Chat => Some(self.chat_messages),
            MessageKind::Gift => Some(self.gift_messages),
            MessageKind::Like => Some(self.like_messages),
            MessageKind::Enter => Some(self.enter_messages),
            MessageKind::Follow => Some(self.follow_messages),
            _ => None,
        }
    }
}

/// 統計アグリゲーター
///
/// セッションマネージャーが排他的に所有し、ロック下で同期的に操作される。
#[derive(Debug, Default)]
pub struct StatisticsAggregator {
    stats: SessionStats,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新しいセッションを開始（全項目をクリアし開始時刻を設定）
    pub fn begin_session(&mut self, now: f64) -> SessionStats {
        self.reset(false);
        self.stats.session_start_time = Some(now);
        self.snapshot()
    }

    /// カウンタをゼロに戻す
    ///
    /// `preserve_start_time`がtrueなら開始時刻を保持し、falseならクリアする。
    pub fn reset(&mut self, preserve_start_time: bool) -> SessionStats {
        let session_start_time = if preserve_start_time {
            self.stats.session_start_time
        } else {
            None
        };

        self.stats = SessionStats {
            session_start_time,
            ..SessionStats::default()
        };

        tracing::debug!(preserve_start_time, "📊 Statistics reset");
        self.snapshot()
    }

    /// イベントを1件計上
    pub fn record_event(&mut self, kind: MessageKind) {
        self.record_event_at(kind, now_timestamp());
    }

    pub fn record_event_at(&mut self, kind: MessageKind, now: f64) {
        let stats = &mut self.stats;
        stats.total_messages += 1;
        stats.last_message_time = Some(now);

        match kind {
            MessageKind::Chat => stats.chat_messages += 1,
            MessageKind::Gift => stats.gift_messages += 1,
            MessageKind::Like => stats.like_messages += 1,
            MessageKind::Enter => stats.enter_messages += 1,
            MessageKind::Follow => stats.follow_messages += 1,
            _ => {}
        }
    }

    /// 稼働時間を再計算
    pub fn tick(&mut self, now: f64) -> SessionStats {
        if let Some(start) = self.stats.session_start_time {
            self.stats.running_seconds = (now - start).max(0.0);
        }
        self.snapshot()
    }

    /// 読み取り専用のコピーを返す
    pub fn snapshot(&self) -> SessionStats {
        self.stats.clone()
    }
}
