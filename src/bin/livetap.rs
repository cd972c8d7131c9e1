use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use livetap::{
    io::parse_ndjson_file,
    models::{broadcast_state_display_name, connection_state_display_name, display_name},
    utils::{format_duration, format_timestamp},
    ConfigManager, ConnectionState, ReplayConnectorFactory, SessionEvent, SessionManager,
    SessionStats,
};
use tokio::sync::broadcast::error::RecvError;

/// ライブ配信イベントのモニター
#[derive(Parser, Debug)]
#[command(name = "livetap", version, about = "Live stream event monitor")]
struct Args {
    /// 監視対象のアドレス
    #[arg(short, long)]
    target: String,

    /// 再生するNDJSONファイル
    #[arg(short, long)]
    replay: PathBuf,

    /// 設定ファイル（省略時はXDG設定ディレクトリ）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// ログレベル（設定ファイルより優先）
    #[arg(long)]
    log_level: Option<String>,

    /// 監視時間（秒）
    #[arg(short, long)]
    duration: Option<u64>,

    /// 末尾まで再生したら先頭から繰り返す
    #[arg(long = "loop")]
    loop_playback: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config_manager = match &args.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let mut config = config_manager.load_config()?;

    if let Some(level) = &args.log_level {
        config.log.log_level = level.clone();
    }
    if args.loop_playback {
        config.replay.loop_playback = true;
    }

    // tokio-consoleの初期化（プロファイリング用）
    #[cfg(feature = "debug-tokio")]
    console_subscriber::init();

    #[cfg(not(feature = "debug-tokio"))]
    let _logging_guard = livetap::logging::init_logging(&config.log)?;

    tracing::info!("🎬 Starting livetap - Live Stream Event Monitor");

    let recorded = parse_ndjson_file(&args.replay)
        .with_context(|| format!("Invalid replay file: {}", args.replay.display()))?;
    tracing::info!(
        path = %args.replay.display(),
        events = recorded.len(),
        "📂 Replay file loaded"
    );

    let factory = ReplayConnectorFactory::new(&args.replay, config.replay.clone());
    let manager = SessionManager::new(Arc::new(factory), config.monitor.clone());
    let mut events = manager.subscribe();

    if !manager.start_monitoring(&args.target) {
        anyhow::bail!("Failed to start monitoring {}", args.target);
    }

    let stop_on_disconnect = !config.replay.loop_playback;

    let deadline = async {
        match args.duration {
            Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                }
                tracing::info!("🛑 終了シグナルを受信しました");
                break;
            }
            _ = &mut deadline => {
                tracing::info!("⏰ Monitoring duration elapsed");
                break;
            }
            received = events.recv() => {
                if handle_notification(received, &manager, stop_on_disconnect) {
                    break;
                }
            }
        }
    }

    let final_stats = manager.statistics();
    manager.stop_monitoring();
    report_summary(&final_stats);

    tracing::info!("👋 livetap shutting down");
    Ok(())
}

/// 通知を1件処理し、監視を終了すべきなら`true`を返す
///
/// 取りこぼし（lagged）の後は切断通知を失っている可能性があるため、
/// 現在の接続状態を直接確認する。
fn handle_notification(
    received: Result<SessionEvent, RecvError>,
    manager: &SessionManager,
    stop_on_disconnect: bool,
) -> bool {
    let finished = match received {
        Ok(event) => {
            report_event(&event);
            matches!(
                event,
                SessionEvent::ConnectionStateChanged(ConnectionState::Disconnected)
            )
        }
        Err(RecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "⚠️ Notification receiver lagged");
            manager.connection_state() == ConnectionState::Disconnected
        }
        Err(RecvError::Closed) => return true,
    };

    if finished && stop_on_disconnect {
        tracing::info!("🏁 Replay finished");
        return true;
    }
    false
}

fn report_event(event: &SessionEvent) {
    match event {
        SessionEvent::MessageReceived(message) => {
            let fields = serde_json::to_string(&message.fields).unwrap_or_default();
            tracing::info!(
                kind = display_name(message.kind),
                priority = %message.priority,
                time = %format_timestamp(message.timestamp),
                unknown = message.unknown,
                "📨 {}",
                fields
            );
        }
        SessionEvent::ConnectionStateChanged(state) => {
            tracing::info!("🔌 Connection: {}", connection_state_display_name(*state));
        }
        SessionEvent::BroadcastStateChanged(state) => {
            tracing::info!("📺 Broadcast: {}", broadcast_state_display_name(*state));
        }
        SessionEvent::ErrorOccurred(message) => {
            tracing::warn!("❌ {}", message);
        }
        SessionEvent::StatisticsUpdated(stats) => {
            tracing::debug!(
                total = stats.total_messages,
                running = %format_duration(stats.running_seconds),
                "📊 Statistics updated"
            );
        }
    }
}

fn report_summary(stats: &SessionStats) {
    tracing::info!(
        total = stats.total_messages,
        chat = stats.chat_messages,
        gift = stats.gift_messages,
        like = stats.like_messages,
        enter = stats.enter_messages,
        follow = stats.follow_messages,
        running = %format_duration(stats.running_seconds),
        "📊 Session summary"
    );
}
