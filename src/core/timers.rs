//! セッション用の周期タイマー
//!
//! 生存確認（既定1秒）と統計リセット（既定1時間）の2本をtokioタスクで回す。
//! キャンセルはoneshotで通知し、タスク自体もabortする。

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// 周期タイマー
///
/// ドロップ時にキャンセルされる。
#[derive(Debug)]
pub struct PeriodicTimer {
    name: &'static str,
    cancel_sender: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTimer {
    /// タイマーを開始
    ///
    /// 最初の発火は`period`経過後。`handler`が`false`を返すとタイマーは終了する。
    pub fn spawn<F>(runtime: &Handle, name: &'static str, period: Duration, mut handler: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (cancel_sender, mut cancel_receiver) = oneshot::channel::<()>();

        let task = async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut cancel_receiver => {
                        tracing::debug!("⏱️ [TIMER] {} cancelled", name);
                        break;
                    }
                    _ = interval.tick() => {
                        if !handler() {
                            tracing::debug!("⏱️ [TIMER] {} finished", name);
                            break;
                        }
                    }
                }
            }
        };

        tracing::debug!("⏱️ [TIMER] Started {} (every {:?})", name, period);

        Self {
            name,
            cancel_sender: Some(cancel_sender),
            handle: Some(runtime.spawn(task)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// タイマーを停止
    pub fn cancel(&mut self) {
        if let Some(sender) = self.cancel_sender.take() {
            let _ = sender.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_none()
    }
}

impl Drop for PeriodicTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// 1セッション分のタイマー一式
#[derive(Debug)]
pub struct SessionTimers {
    pub liveness: PeriodicTimer,
    pub stats_reset: PeriodicTimer,
}

impl SessionTimers {
    pub fn cancel_all(&mut self) {
        self.liveness.cancel();
        self.stats_reset.cancel();
    }
}
