//! 記録済みNDJSONファイルを再生するコネクタ
//!
//! 1行1イベントのファイルを一定間隔で読み出し、ライブソースと同じ
//! コールバックで配信する。再生は専用のtokioタスクで行う。

use std::path::{Path, PathBuf};

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::{ConnectorError, ConnectorFactory, EventSink, LiveSourceConnector};
use crate::config::ReplayConfig;
use crate::io::parse_ndjson_lines;

/// 再生コネクタ
#[derive(Debug)]
pub struct ReplayConnector {
    target: String,
    path: PathBuf,
    config: ReplayConfig,
    sink: EventSink,
    runtime: Handle,
    shutdown_sender: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ReplayConnector {
    pub fn new(
        target: impl Into<String>,
        path: impl Into<PathBuf>,
        config: ReplayConfig,
        sink: EventSink,
        runtime: Handle,
    ) -> Self {
        Self {
            target: target.into(),
            path: path.into(),
            config,
            sink,
            runtime,
            shutdown_sender: None,
            task: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    async fn run(
        path: PathBuf,
        config: ReplayConfig,
        sink: EventSink,
        mut shutdown_receiver: oneshot::Receiver<()>,
    ) {
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                sink.emit_error(format!(
                    "Failed to read replay file '{}': {}",
                    path.display(),
                    e
                ));
                return;
            }
        };

        let lines: Vec<_> = parse_ndjson_lines(&content).collect();
        let interval = config.event_interval();

        tracing::info!(
            path = %path.display(),
            lines = lines.len(),
            "▶️ [REPLAY] Replay started"
        );
        sink.emit_connectivity(true);

        let mut round = 0u64;
        loop {
            round += 1;
            for line in &lines {
                tokio::select! {
                    _ = &mut shutdown_receiver => {
                        tracing::info!("🛑 [REPLAY] Shutdown signal received");
                        return;
                    }
                    _ = tokio::time::sleep(interval) => {}
                }

                match line {
                    Ok(value) => sink.emit_json(value.clone()),
                    Err(e) => sink.emit_error(e.to_string()),
                }
            }

            if !config.loop_playback || lines.is_empty() {
                break;
            }
            tracing::debug!("🔁 [REPLAY] Restarting playback (round {})", round + 1);
        }

        tracing::info!("⏹️ [REPLAY] Replay finished after {} round(s)", round);
        sink.emit_connectivity(false);
    }
}

impl LiveSourceConnector for ReplayConnector {
    fn start(&mut self) -> Result<(), ConnectorError> {
        if self.is_running() {
            return Ok(());
        }

        if !self.path.is_file() {
            return Err(ConnectorError::Start(format!(
                "replay file not found: {}",
                self.path.display()
            )));
        }

        let (shutdown_sender, shutdown_receiver) = oneshot::channel();
        let task = self.runtime.spawn(Self::run(
            self.path.clone(),
            self.config.clone(),
            self.sink.clone(),
            shutdown_receiver,
        ));

        self.shutdown_sender = Some(shutdown_sender);
        self.task = Some(task);

        tracing::debug!(target_url = %self.target, "🔌 [REPLAY] Connector started");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ConnectorError> {
        if let Some(sender) = self.shutdown_sender.take() {
            let _ = sender.send(());
        }
        if self.task.take().is_some() {
            tracing::debug!(target_url = %self.target, "🔌 [REPLAY] Connector stopped");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "replay"
    }
}

impl Drop for ReplayConnector {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// 再生コネクタのファクトリー
#[derive(Debug, Clone)]
pub struct ReplayConnectorFactory {
    path: PathBuf,
    config: ReplayConfig,
}

impl ReplayConnectorFactory {
    pub fn new(path: impl Into<PathBuf>, config: ReplayConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }
}

impl ConnectorFactory for ReplayConnectorFactory {
    fn create(
        &self,
        target: &str,
        sink: EventSink,
    ) -> Result<Box<dyn LiveSourceConnector>, ConnectorError> {
        let runtime =
            Handle::try_current().map_err(|e| ConnectorError::Runtime(e.to_string()))?;

        if !self.path.is_file() {
            return Err(ConnectorError::create(
                target,
                format!("replay file not found: {}", self.path.display()),
            ));
        }

        Ok(Box::new(ReplayConnector::new(
            target,
            self.path.clone(),
            self.config.clone(),
            sink,
            runtime,
        )))
    }
}
