// ユーティリティ関数

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use crate::models::{
    broadcast_state_display_name, connection_state_display_name, display_name, BroadcastState,
    ConnectionState, EnrichedEvent,
};

/// スキーム・ホスト部とクエリ・フラグメントを除いたパス部分
fn target_path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.\-]*://[^/?#]*)?(?P<path>[^?#]*)")
            .expect("target path pattern is a valid regex")
    })
}

/// 監視対象アドレスからセッションIDを抽出
///
/// パスを`/`で区切り、最初の数字のみのセグメントを返す。見つからなければ`None`。
pub fn extract_session_id(target: &str) -> Option<String> {
    let path = target_path_pattern()
        .captures(target.trim())
        .and_then(|captures| captures.name("path"))
        .map(|m| m.as_str())?;

    path.split('/')
        .find(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

/// 時刻フォーマット（UNIXエポック秒 → HH:MM:SS）
pub fn format_timestamp(timestamp: f64) -> String {
    chrono::DateTime::from_timestamp_micros((timestamp * 1_000_000.0) as i64)
        .map(|time| time.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

/// 稼働秒数を HH:MM:SS に整形
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// 分類済みメッセージのデバッグダンプ
pub fn dump_event(event: &EnrichedEvent, context: &str) {
    debug!(
        context = context,
        kind = %event.kind,
        display_name = display_name(event.kind),
        priority = %event.priority,
        timestamp = %format_timestamp(event.timestamp),
        unknown = event.unknown,
        field_count = event.fields.len(),
        "📨 Event processed"
    );
}

/// 接続状態の変更をログ
pub fn log_connection_state_change(old_state: ConnectionState, new_state: ConnectionState) {
    info!(
        old_state = connection_state_display_name(old_state),
        new_state = connection_state_display_name(new_state),
        "🔄 Connection state changed"
    );
}

/// 配信状態の変更をログ
pub fn log_broadcast_state_change(old_state: BroadcastState, new_state: BroadcastState) {
    info!(
        old_state = broadcast_state_display_name(old_state),
        new_state = broadcast_state_display_name(new_state),
        "📺 Broadcast state changed"
    );
}
