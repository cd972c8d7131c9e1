//! データモデル
//!
//! メッセージ分類テーブルとイベントレコード。

pub mod event;
pub mod message_types;

pub use event::{now_timestamp, EnrichedEvent, RawEvent};
pub use message_types::{
    broadcast_state_display_name, connection_state_display_name, default_priority,
    display_color, display_name, BroadcastState, ConnectionState, MessageKind, Priority, Rgb,
};
