//! イベント分類・付加情報付与
//!
//! 生イベントの種別を判定して種別ごとのハンドラーへ振り分け、
//! 優先度・タイムスタンプ・処理済みフラグを付けて統計に計上する。
//! 分類は全域関数で、不正なペイロードはUNKNOWN/LOWに縮退する。

use crate::core::statistics::StatisticsAggregator;
use crate::models::{
    default_priority, now_timestamp, BroadcastState, EnrichedEvent, MessageKind, RawEvent,
};

/// 付加情報として上書きされるフィールド
const RESERVED_FIELDS: [&str; 4] = ["priority", "timestamp", "processed", "unknown"];

/// ハンドラーの判定結果
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct HandlerOutcome {
    unknown: bool,
    broadcast_state: Option<BroadcastState>,
}

type Handler = fn(&RawEvent) -> HandlerOutcome;

/// 分類結果
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub event: EnrichedEvent,
    /// 配信状態が現在値から変わる場合のみ`Some`
    pub broadcast_change: Option<BroadcastState>,
}

/// イベント分類器
///
/// 状態を持たない。統計はセッションマネージャーから呼び出しの間だけ借用する。
#[derive(Debug, Clone, Copy, Default)]
pub struct EventClassifier;

impl EventClassifier {
    pub fn new() -> Self {
        Self
    }

    /// 生イベントを分類し、統計に計上する
    pub fn classify(
        &self,
        raw: RawEvent,
        stats: &mut StatisticsAggregator,
        current_broadcast: BroadcastState,
    ) -> Classification {
        self.classify_at(raw, stats, current_broadcast, now_timestamp())
    }

    pub fn classify_at(
        &self,
        raw: RawEvent,
        stats: &mut StatisticsAggregator,
        current_broadcast: BroadcastState,
        now: f64,
    ) -> Classification {
        let kind = raw.kind();
        let handler = handler_for(kind).unwrap_or(handle_unknown);
        let outcome = handler(&raw);

        let broadcast_change = outcome
            .broadcast_state
            .filter(|state| *state != current_broadcast);

        let mut fields = raw.into_fields();
        for key in RESERVED_FIELDS {
            fields.remove(key);
        }

        let event = EnrichedEvent {
            kind,
            fields,
            priority: default_priority(kind),
            timestamp: now,
            processed: true,
            unknown: outcome.unknown,
        };

        stats.record_event_at(kind, now);

        tracing::trace!(
            kind = %kind,
            priority = %event.priority,
            unknown = event.unknown,
            "🏷️ Event classified"
        );

        Classification {
            event,
            broadcast_change,
        }
    }
}

/// 種別→ハンドラーの固定マッピング
fn handler_for(kind: MessageKind) -> Option<Handler> {
    match kind {
        MessageKind::Chat
        | MessageKind::Gift
        | MessageKind::Like
        | MessageKind::Enter
        | MessageKind::Follow
        | MessageKind::Stats
        | MessageKind::Fansclub
        | MessageKind::Emoji
        | MessageKind::Ranking => Some(handle_standard),
        MessageKind::LiveStatus => Some(handle_live_status),
        MessageKind::Unknown
        | MessageKind::RoomUserSeq
        | MessageKind::Social
        | MessageKind::Control
        | MessageKind::System => None,
    }
}

fn handle_standard(_raw: &RawEvent) -> HandlerOutcome {
    HandlerOutcome::default()
}

fn handle_live_status(raw: &RawEvent) -> HandlerOutcome {
    HandlerOutcome {
        unknown: false,
        broadcast_state: Some(raw.broadcast_status()),
    }
}

fn handle_unknown(_raw: &RawEvent) -> HandlerOutcome {
    HandlerOutcome {
        unknown: true,
        broadcast_state: None,
    }
}
