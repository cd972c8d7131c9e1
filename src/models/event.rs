//! 受信イベントと付加情報付きイベント

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::message_types::{BroadcastState, MessageKind, Priority};
use crate::LivetapError;

/// 種別フィールド名
pub const KIND_FIELD: &str = "kind";
/// 旧形式の種別フィールド名
pub const LEGACY_KIND_FIELD: &str = "type";
/// LIVE_STATUSイベントの配信状態フィールド名
pub const STATUS_FIELD: &str = "status";

/// 現在時刻（UNIXエポック秒）
pub fn now_timestamp() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// コネクタから届く生イベント
///
/// フィールド名→値の不透明なマップ。最低限`kind`を持つことが期待されるが、
/// 欠落・不正な場合はUNKNOWNとして扱われる。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawEvent(Map<String, Value>);

impl RawEvent {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// 種別コードを設定した生イベントを作成
    pub fn with_kind(kind: MessageKind) -> Self {
        Self::new().field(KIND_FIELD, kind.code())
    }

    /// フィールドを追加（ビルダー形式）
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// イベント種別を判定
    ///
    /// `kind`（なければ`type`）を整数コードまたは種別名として解釈する。
    pub fn kind(&self) -> MessageKind {
        self.get(KIND_FIELD)
            .or_else(|| self.get(LEGACY_KIND_FIELD))
            .map(kind_from_value)
            .unwrap_or(MessageKind::Unknown)
    }

    /// LIVE_STATUSペイロードの配信状態を取得
    pub fn broadcast_status(&self) -> BroadcastState {
        match self.get(STATUS_FIELD) {
            Some(Value::Number(number)) => integral_code(number)
                .map(BroadcastState::from_code)
                .unwrap_or(BroadcastState::Unknown),
            Some(Value::String(name)) => {
                BroadcastState::from_name(name).unwrap_or(BroadcastState::Unknown)
            }
            _ => BroadcastState::Unknown,
        }
    }
}

/// 整数コードとして解釈（`1.0`のような整数値の浮動小数点も受け付ける）
fn integral_code(number: &Number) -> Option<i64> {
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|value| value.fract() == 0.0 && value.abs() <= i64::MAX as f64)
            .map(|value| value as i64)
    })
}

fn kind_from_value(value: &Value) -> MessageKind {
    match value {
        Value::Number(number) => integral_code(number)
            .map(MessageKind::from_code)
            .unwrap_or(MessageKind::Unknown),
        Value::String(name) => MessageKind::from_name(name).unwrap_or(MessageKind::Unknown),
        _ => MessageKind::Unknown,
    }
}

impl From<Map<String, Value>> for RawEvent {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for RawEvent {
    type Error = LivetapError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(LivetapError::malformed_event(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 分類済みイベント
///
/// 元のフィールドに優先度・タイムスタンプ・処理済みフラグを付加したもの。
/// シリアライズ時は元のフィールドと同じ階層に展開される。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedEvent {
    #[serde(skip)]
    pub kind: MessageKind,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub priority: Priority,
    /// UNIXエポック秒
    pub timestamp: f64,
    pub processed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unknown: bool,
}

impl EnrichedEvent {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_from_code_and_name() {
        assert_eq!(RawEvent::with_kind(MessageKind::Gift).kind(), MessageKind::Gift);
        assert_eq!(
            RawEvent::new().field("kind", "follow").kind(),
            MessageKind::Follow
        );
        assert_eq!(RawEvent::new().field("type", 3).kind(), MessageKind::Like);
    }

    #[test]
    fn test_integral_float_codes_are_accepted() {
        assert_eq!(RawEvent::new().field("kind", 1.0).kind(), MessageKind::Chat);
        assert_eq!(
            RawEvent::try_from(json!({"kind": 8.0, "status": 2.0}))
                .unwrap()
                .broadcast_status(),
            BroadcastState::Live
        );
        assert_eq!(RawEvent::new().field("kind", 2.5).kind(), MessageKind::Unknown);
        assert_eq!(RawEvent::new().field("kind", 1e300).kind(), MessageKind::Unknown);
    }

    #[test]
    fn test_kind_field_takes_precedence_over_legacy() {
        let raw = RawEvent::new().field("kind", 1).field("type", 2);
        assert_eq!(raw.kind(), MessageKind::Chat);
    }

    #[test]
    fn test_missing_or_invalid_kind_is_unknown() {
        assert_eq!(RawEvent::new().kind(), MessageKind::Unknown);
        assert_eq!(RawEvent::new().field("kind", 42).kind(), MessageKind::Unknown);
        assert_eq!(RawEvent::new().field("kind", 1.5).kind(), MessageKind::Unknown);
        assert_eq!(
            RawEvent::new().field("kind", json!(["CHAT"])).kind(),
            MessageKind::Unknown
        );
        assert_eq!(
            RawEvent::new().field("kind", "superchat").kind(),
            MessageKind::Unknown
        );
    }

    #[test]
    fn test_broadcast_status() {
        let live = RawEvent::with_kind(MessageKind::LiveStatus).field("status", 2);
        assert_eq!(live.broadcast_status(), BroadcastState::Live);

        let named = RawEvent::with_kind(MessageKind::LiveStatus).field("status", "end");
        assert_eq!(named.broadcast_status(), BroadcastState::End);

        let invalid = RawEvent::with_kind(MessageKind::LiveStatus).field("status", 77);
        assert_eq!(invalid.broadcast_status(), BroadcastState::Unknown);

        let missing = RawEvent::with_kind(MessageKind::LiveStatus);
        assert_eq!(missing.broadcast_status(), BroadcastState::Unknown);
    }

    #[test]
    fn test_try_from_value() {
        let raw = RawEvent::try_from(json!({"kind": 1, "content": "hi"})).unwrap();
        assert_eq!(raw.kind(), MessageKind::Chat);
        assert_eq!(raw.get("content"), Some(&json!("hi")));

        let err = RawEvent::try_from(json!([1, 2, 3])).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_enriched_event_serializes_flat() {
        let event = EnrichedEvent {
            kind: MessageKind::Chat,
            fields: RawEvent::with_kind(MessageKind::Chat)
                .field("content", "hello")
                .into_fields(),
            priority: Priority::Normal,
            timestamp: 1.5,
            processed: true,
            unknown: false,
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["content"], "hello");
        assert_eq!(value["priority"], "NORMAL");
        assert_eq!(value["processed"], true);
        assert!(value.get("unknown").is_none());
    }
}
