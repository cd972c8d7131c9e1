//! メッセージ分類の定義
//!
//! 配信イベントの種別・優先度・接続状態・配信状態の列挙と、
//! 種別ごとの表示名／既定優先度／表示色の静的テーブルを提供する。
//! テーブルはすべて全域関数で、未登録の値にはフォールバックを返す。

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// RGB表示色
pub type Rgb = (u8, u8, u8);

/// メッセージ種別
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    #[default]
    #[display("UNKNOWN")]
    Unknown = 0,
    #[display("CHAT")]
    Chat = 1,
    #[display("GIFT")]
    Gift = 2,
    #[display("LIKE")]
    Like = 3,
    #[display("ENTER")]
    Enter = 4,
    #[display("FOLLOW")]
    Follow = 5,
    #[display("STATS")]
    Stats = 6,
    #[display("FANSCLUB")]
    Fansclub = 7,
    #[display("LIVE_STATUS")]
    LiveStatus = 8,
    #[display("EMOJI")]
    Emoji = 9,
    #[display("RANKING")]
    Ranking = 10,
    #[display("ROOM_USER_SEQ")]
    RoomUserSeq = 11,
    #[display("SOCIAL")]
    Social = 12,
    #[display("CONTROL")]
    Control = 13,
    #[display("SYSTEM")]
    System = 14,
}

impl MessageKind {
    /// コード順の全種別
    pub const ALL: [MessageKind; 15] = [
        MessageKind::Unknown,
        MessageKind::Chat,
        MessageKind::Gift,
        MessageKind::Like,
        MessageKind::Enter,
        MessageKind::Follow,
        MessageKind::Stats,
        MessageKind::Fansclub,
        MessageKind::LiveStatus,
        MessageKind::Emoji,
        MessageKind::Ranking,
        MessageKind::RoomUserSeq,
        MessageKind::Social,
        MessageKind::Control,
        MessageKind::System,
    ];

    /// 整数コード
    pub fn code(self) -> i64 {
        self as i64
    }

    /// 整数コードから変換（範囲外はUnknown）
    pub fn from_code(code: i64) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.code() == code)
            .unwrap_or(MessageKind::Unknown)
    }

    /// 種別名から変換（`CHAT` / `chat` / `live_status` など）
    ///
    /// 認識できない名前は`None`。
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.to_string() == normalized)
    }
}

/// メッセージ優先度（LOW < NORMAL < HIGH < CRITICAL）
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Display,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    #[default]
    #[display("LOW")]
    Low = 1,
    #[display("NORMAL")]
    Normal = 2,
    #[display("HIGH")]
    High = 3,
    #[display("CRITICAL")]
    Critical = 4,
}

impl Priority {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Priority::Low),
            2 => Some(Priority::Normal),
            3 => Some(Priority::High),
            4 => Some(Priority::Critical),
            _ => None,
        }
    }
}

/// ローカル接続状態
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    #[default]
    #[display("DISCONNECTED")]
    Disconnected = 0,
    #[display("CONNECTING")]
    Connecting = 1,
    #[display("CONNECTED")]
    Connected = 2,
    #[display("RECONNECTING")]
    Reconnecting = 3,
    #[display("ERROR")]
    Error = 4,
}

impl ConnectionState {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ConnectionState::Disconnected),
            1 => Some(ConnectionState::Connecting),
            2 => Some(ConnectionState::Connected),
            3 => Some(ConnectionState::Reconnecting),
            4 => Some(ConnectionState::Error),
            _ => None,
        }
    }
}

/// リモート配信のライフサイクル状態
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BroadcastState {
    #[default]
    #[display("UNKNOWN")]
    Unknown = 0,
    #[display("OFFLINE")]
    Offline = 1,
    #[display("LIVE")]
    Live = 2,
    #[display("PAUSE")]
    Pause = 3,
    #[display("END")]
    End = 4,
    #[display("REPLAY")]
    Replay = 5,
}

impl BroadcastState {
    const ALL: [BroadcastState; 6] = [
        BroadcastState::Unknown,
        BroadcastState::Offline,
        BroadcastState::Live,
        BroadcastState::Pause,
        BroadcastState::End,
        BroadcastState::Replay,
    ];

    pub fn code(self) -> i64 {
        self as i64
    }

    /// 整数コードから変換（不正な値はUnknownに落とす）
    pub fn from_code(code: i64) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|state| state.code() == code)
            .unwrap_or(BroadcastState::Unknown)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|state| state.to_string() == normalized)
    }
}

/// 種別ごとの表示名
const MESSAGE_DISPLAY_NAMES: &[(MessageKind, &str)] = &[
    (MessageKind::Unknown, "Unknown"),
    (MessageKind::Chat, "Chat"),
    (MessageKind::Gift, "Gift"),
    (MessageKind::Like, "Like"),
    (MessageKind::Enter, "Enter"),
    (MessageKind::Follow, "Follow"),
    (MessageKind::Stats, "Stats"),
    (MessageKind::Fansclub, "Fans Club"),
    (MessageKind::LiveStatus, "Live Status"),
    (MessageKind::Emoji, "Emoji"),
    (MessageKind::Ranking, "Ranking"),
    (MessageKind::RoomUserSeq, "Room User Sequence"),
    (MessageKind::Social, "Social"),
    (MessageKind::Control, "Control"),
    (MessageKind::System, "System"),
];

/// 種別ごとの既定優先度
const MESSAGE_PRIORITIES: &[(MessageKind, Priority)] = &[
    (MessageKind::Unknown, Priority::Low),
    (MessageKind::Chat, Priority::Normal),
    (MessageKind::Gift, Priority::High),
    (MessageKind::Like, Priority::Low),
    (MessageKind::Enter, Priority::Normal),
    (MessageKind::Follow, Priority::High),
    (MessageKind::Stats, Priority::Low),
    (MessageKind::Fansclub, Priority::Normal),
    (MessageKind::LiveStatus, Priority::Critical),
    (MessageKind::Emoji, Priority::Normal),
    (MessageKind::Ranking, Priority::Low),
    (MessageKind::RoomUserSeq, Priority::Low),
    (MessageKind::Social, Priority::Normal),
    (MessageKind::Control, Priority::Critical),
    (MessageKind::System, Priority::High),
];

/// 種別ごとの表示色
const MESSAGE_COLORS: &[(MessageKind, Rgb)] = &[
    (MessageKind::Unknown, (128, 128, 128)),
    (MessageKind::Chat, (0, 0, 0)),
    (MessageKind::Gift, (255, 0, 0)),
    (MessageKind::Like, (255, 192, 203)),
    (MessageKind::Enter, (0, 128, 0)),
    (MessageKind::Follow, (255, 165, 0)),
    (MessageKind::Stats, (128, 128, 128)),
    (MessageKind::Fansclub, (138, 43, 226)),
    (MessageKind::LiveStatus, (255, 0, 0)),
    (MessageKind::Emoji, (255, 255, 0)),
    (MessageKind::Ranking, (0, 0, 255)),
    (MessageKind::RoomUserSeq, (128, 128, 128)),
    (MessageKind::Social, (0, 191, 255)),
    (MessageKind::Control, (255, 0, 0)),
    (MessageKind::System, (255, 140, 0)),
];

const CONNECTION_DISPLAY_NAMES: &[(ConnectionState, &str)] = &[
    (ConnectionState::Disconnected, "Disconnected"),
    (ConnectionState::Connecting, "Connecting"),
    (ConnectionState::Connected, "Connected"),
    (ConnectionState::Reconnecting, "Reconnecting"),
    (ConnectionState::Error, "Connection Error"),
];

const BROADCAST_DISPLAY_NAMES: &[(BroadcastState, &str)] = &[
    (BroadcastState::Unknown, "Unknown"),
    (BroadcastState::Offline, "Offline"),
    (BroadcastState::Live, "Live"),
    (BroadcastState::Pause, "Paused"),
    (BroadcastState::End, "Ended"),
    (BroadcastState::Replay, "Replay"),
];

const UNKNOWN_LABEL: &str = "Unknown";
const FALLBACK_COLOR: Rgb = (0, 0, 0);

fn lookup<K: PartialEq + Copy, V: Copy>(table: &[(K, V)], key: K) -> Option<V> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, value)| *value)
}

/// 種別の表示名を取得
pub fn display_name(kind: MessageKind) -> &'static str {
    lookup(MESSAGE_DISPLAY_NAMES, kind).unwrap_or(UNKNOWN_LABEL)
}

/// 種別の既定優先度を取得（未登録はLOW）
pub fn default_priority(kind: MessageKind) -> Priority {
    lookup(MESSAGE_PRIORITIES, kind).unwrap_or(Priority::Low)
}

/// 種別の表示色を取得（未登録は黒）
pub fn display_color(kind: MessageKind) -> Rgb {
    lookup(MESSAGE_COLORS, kind).unwrap_or(FALLBACK_COLOR)
}

pub fn connection_state_display_name(state: ConnectionState) -> &'static str {
    lookup(CONNECTION_DISPLAY_NAMES, state).unwrap_or(UNKNOWN_LABEL)
}

pub fn broadcast_state_display_name(state: BroadcastState) -> &'static str {
    lookup(BROADCAST_DISPLAY_NAMES, state).unwrap_or(UNKNOWN_LABEL)
}
