//! 監視セッション管理
//!
//! コネクタのライフサイクル、接続状態・配信状態、生存確認タイマーと
//! 統計リセットタイマーを所有し、分類済みイベントと状態遷移を購読者へ再配信する。
//!
//! 状態はすべて1つのミューテックスの下で変更される。セッションごとに世代番号を
//! 振り、コールバックとタイマーは自分の世代が現行でなければ何もしない。
//! これにより`stop_monitoring`が返った後は、古いセッションの遅延コールバックや
//! タイマー発火が状態を変更することはない。

use std::sync::{Arc, Weak};

use derive_more::Display;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::connector::{
    ConnectorCallbacks, ConnectorError, ConnectorFactory, EventSink, LiveSourceConnector,
};
use crate::core::broadcaster::{SessionBroadcaster, SessionEvent};
use crate::core::classifier::{Classification, EventClassifier};
use crate::core::statistics::{SessionStats, StatisticsAggregator};
use crate::core::timers::{PeriodicTimer, SessionTimers};
use crate::models::{now_timestamp, BroadcastState, ConnectionState, RawEvent};
use crate::utils;

/// 監視ライフサイクル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum MonitorPhase {
    #[default]
    Idle,
    Starting,
    Active,
    Stopping,
}

/// セッションが排他的に所有する状態
struct SessionInner {
    phase: MonitorPhase,
    generation: u64,
    connection_state: ConnectionState,
    broadcast_state: BroadcastState,
    stats: StatisticsAggregator,
    target: Option<String>,
    session_id: Option<String>,
    connector: Option<Box<dyn LiveSourceConnector>>,
    timers: Option<SessionTimers>,
}

impl SessionInner {
    fn new() -> Self {
        Self {
            phase: MonitorPhase::Idle,
            generation: 0,
            connection_state: ConnectionState::Disconnected,
            broadcast_state: BroadcastState::Unknown,
            stats: StatisticsAggregator::new(),
            target: None,
            session_id: None,
            connector: None,
            timers: None,
        }
    }

    /// コネクタからのコールバックを受け付けるか
    fn accepts(&self, generation: u64) -> bool {
        self.generation == generation
            && matches!(self.phase, MonitorPhase::Starting | MonitorPhase::Active)
    }

    /// タイマー発火を受け付けるか
    fn is_active(&self, generation: u64) -> bool {
        self.generation == generation && self.phase == MonitorPhase::Active
    }

    /// 接続状態を更新（変化した場合のみ通知）
    fn set_connection_state(&mut self, state: ConnectionState, broadcaster: &SessionBroadcaster) {
        if self.connection_state != state {
            utils::log_connection_state_change(self.connection_state, state);
            self.connection_state = state;
            broadcaster.broadcast(SessionEvent::ConnectionStateChanged(state));
        }
    }

    /// 配信状態を更新（変化した場合のみ通知）
    fn set_broadcast_state(&mut self, state: BroadcastState, broadcaster: &SessionBroadcaster) {
        if self.broadcast_state != state {
            utils::log_broadcast_state_change(self.broadcast_state, state);
            self.broadcast_state = state;
            broadcaster.broadcast(SessionEvent::BroadcastStateChanged(state));
        }
    }
}

struct SessionShared {
    state: Mutex<SessionInner>,
    broadcaster: SessionBroadcaster,
    classifier: EventClassifier,
}

impl SessionShared {
    fn report_error(&self, message: String) {
        warn!("❌ {}", message);
        self.broadcaster.broadcast(SessionEvent::ErrorOccurred(message));
    }

    fn handle_raw_event(&self, generation: u64, raw: RawEvent) {
        let mut inner = self.state.lock();
        if !inner.accepts(generation) {
            debug!(generation, "🗑️ Discarding event from superseded session");
            return;
        }

        let current = inner.broadcast_state;
        let Classification {
            event,
            broadcast_change,
        } = self.classifier.classify(raw, &mut inner.stats, current);

        if let Some(state) = broadcast_change {
            inner.set_broadcast_state(state, &self.broadcaster);
        }

        utils::dump_event(&event, "session");
        self.broadcaster
            .broadcast(SessionEvent::MessageReceived(event));
        self.broadcaster
            .broadcast(SessionEvent::StatisticsUpdated(inner.stats.snapshot()));
    }

    fn handle_error(&self, generation: u64, message: String) {
        let inner = self.state.lock();
        if !inner.accepts(generation) {
            debug!(generation, "🗑️ Discarding error from superseded session: {}", message);
            return;
        }
        self.report_error(message);
    }

    fn handle_connectivity(&self, generation: u64, connected: bool) {
        let mut inner = self.state.lock();
        if !inner.accepts(generation) {
            debug!(generation, connected, "🗑️ Discarding connectivity change from superseded session");
            return;
        }

        let state = if connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };
        inner.set_connection_state(state, &self.broadcaster);
    }

    /// 生存確認：稼働時間を更新して統計を通知
    fn liveness_tick(&self, generation: u64) -> bool {
        let mut inner = self.state.lock();
        if !inner.is_active(generation) {
            return false;
        }

        let snapshot = inner.stats.tick(now_timestamp());
        self.broadcaster
            .broadcast(SessionEvent::StatisticsUpdated(snapshot));
        true
    }

    /// 定期統計リセット（開始時刻は保持）
    fn reset_statistics(&self, generation: u64) -> bool {
        let mut inner = self.state.lock();
        if !inner.is_active(generation) {
            return false;
        }

        let snapshot = inner.stats.reset(true);
        info!("🔄 Periodic statistics reset");
        self.broadcaster
            .broadcast(SessionEvent::StatisticsUpdated(snapshot));
        true
    }
}

/// コネクタに渡すコールバック（世代番号付き）
struct SessionCallbacks {
    shared: Weak<SessionShared>,
    generation: u64,
}

impl ConnectorCallbacks for SessionCallbacks {
    fn on_raw_event(&self, raw: RawEvent) {
        if let Some(shared) = self.shared.upgrade() {
            shared.handle_raw_event(self.generation, raw);
        }
    }

    fn on_error(&self, message: String) {
        if let Some(shared) = self.shared.upgrade() {
            shared.handle_error(self.generation, message);
        }
    }

    fn on_connectivity_change(&self, connected: bool) {
        if let Some(shared) = self.shared.upgrade() {
            shared.handle_connectivity(self.generation, connected);
        }
    }
}

/// セッションマネージャー
///
/// 同時に監視できる対象は1つ。`start_monitoring`/`stop_monitoring`はエラーを
/// 返さず、失敗はすべてエラー通知として購読者に届く。
pub struct SessionManager {
    shared: Arc<SessionShared>,
    factory: Arc<dyn ConnectorFactory>,
    config: MonitorConfig,
}

impl SessionManager {
    pub fn new(factory: Arc<dyn ConnectorFactory>, config: MonitorConfig) -> Self {
        let broadcaster = SessionBroadcaster::with_capacity(config.event_buffer);
        Self {
            shared: Arc::new(SessionShared {
                state: Mutex::new(SessionInner::new()),
                broadcaster,
                classifier: EventClassifier::new(),
            }),
            factory,
            config,
        }
    }

    /// 既定設定で作成
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: ConnectorFactory + 'static,
    {
        Self::new(Arc::new(factory), MonitorConfig::default())
    }

    /// 通知を購読
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.broadcaster.subscribe()
    }

    /// 監視を開始
    ///
    /// 監視中なら先に停止してから開始し直す。セッションIDが抽出できない対象でも
    /// 監視は開始する。失敗時はエラー通知を送って`false`を返し、タイマーや
    /// コネクタは残さない。tokioランタイム上で呼び出すこと。
    pub fn start_monitoring(&self, target: &str) -> bool {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                self.shared.report_error(format!(
                    "Failed to start monitoring: {}",
                    ConnectorError::Runtime(e.to_string())
                ));
                return false;
            }
        };

        if self.phase() == MonitorPhase::Active {
            info!("🔁 Restarting monitoring for new target");
            self.stop_monitoring();
        }

        let generation = {
            let mut inner = self.shared.state.lock();
            inner.generation += 1;
            inner.phase = MonitorPhase::Starting;
            inner.target = Some(target.to_string());
            inner.session_id = utils::extract_session_id(target);

            if inner.session_id.is_none() {
                warn!(target_url = %target, "⚠️ No numeric session id in target, monitoring anyway");
            }

            let snapshot = inner.stats.begin_session(now_timestamp());
            self.shared
                .broadcaster
                .broadcast(SessionEvent::StatisticsUpdated(snapshot));
            inner.set_connection_state(ConnectionState::Connecting, &self.shared.broadcaster);
            inner.generation
        };

        info!(
            target_url = %target,
            generation,
            "▶️ Starting live monitoring"
        );

        let sink = EventSink::new(Arc::new(SessionCallbacks {
            shared: Arc::downgrade(&self.shared),
            generation,
        }));

        let mut connector = match self.factory.create(target, sink) {
            Ok(connector) => connector,
            Err(e) => {
                self.abort_start(generation, &e);
                return false;
            }
        };

        if let Err(e) = connector.start() {
            if let Err(stop_error) = connector.stop() {
                debug!("Connector cleanup after failed start: {}", stop_error);
            }
            self.abort_start(generation, &e);
            return false;
        }

        let mut inner = self.shared.state.lock();
        if inner.generation != generation {
            drop(inner);
            warn!(generation, "⚠️ Start superseded while connecting, releasing connector");
            if let Err(e) = connector.stop() {
                debug!("Connector cleanup after superseded start: {}", e);
            }
            return false;
        }

        inner.timers = Some(self.spawn_timers(&runtime, generation));
        info!(
            connector = connector.name(),
            session_id = ?inner.session_id,
            "✅ Live monitoring started"
        );
        inner.connector = Some(connector);
        inner.phase = MonitorPhase::Active;
        true
    }

    /// 開始失敗時の後始末
    fn abort_start(&self, generation: u64, error: &ConnectorError) {
        {
            let mut inner = self.shared.state.lock();
            if inner.generation == generation {
                // 失敗したコネクタからの遅延コールバックを無効化
                inner.generation += 1;
                inner.phase = MonitorPhase::Idle;
                inner.target = None;
                inner.session_id = None;
                inner.stats = StatisticsAggregator::new();
                inner.set_connection_state(ConnectionState::Error, &self.shared.broadcaster);
            }
        }
        self.shared
            .report_error(format!("Failed to start monitoring: {}", error));
    }

    fn spawn_timers(&self, runtime: &Handle, generation: u64) -> SessionTimers {
        let liveness = {
            let shared = Arc::downgrade(&self.shared);
            PeriodicTimer::spawn(
                runtime,
                "liveness",
                self.config.liveness_interval(),
                move || {
                    shared
                        .upgrade()
                        .is_some_and(|shared| shared.liveness_tick(generation))
                },
            )
        };

        let stats_reset = {
            let shared = Arc::downgrade(&self.shared);
            PeriodicTimer::spawn(
                runtime,
                "stats-reset",
                self.config.stats_reset_interval(),
                move || {
                    shared
                        .upgrade()
                        .is_some_and(|shared| shared.reset_statistics(generation))
                },
            )
        };

        SessionTimers {
            liveness,
            stats_reset,
        }
    }

    /// 監視を停止
    ///
    /// 冪等。返った時点で古いセッションのタイマーやコールバックは状態を変更しない。
    pub fn stop_monitoring(&self) {
        let (generation, previous_phase, connector, timers) = {
            let mut inner = self.shared.state.lock();
            inner.generation += 1;

            let previous_phase = inner.phase;
            if previous_phase != MonitorPhase::Idle {
                inner.phase = MonitorPhase::Stopping;
            }

            let mut timers = inner.timers.take();
            if let Some(timers) = timers.as_mut() {
                timers.cancel_all();
            }
            let connector = inner.connector.take();

            inner.stats = StatisticsAggregator::new();
            inner.set_connection_state(ConnectionState::Disconnected, &self.shared.broadcaster);
            inner.set_broadcast_state(BroadcastState::Unknown, &self.shared.broadcaster);

            (inner.generation, previous_phase, connector, timers)
        };
        drop(timers);

        // コネクタの停止はロック外で行う（停止中のコールバックは世代不一致で破棄される）
        if let Some(mut connector) = connector {
            if let Err(e) = connector.stop() {
                self.shared
                    .report_error(format!("Failed to stop monitoring: {}", e));
            }
        }

        {
            let mut inner = self.shared.state.lock();
            if inner.generation == generation && inner.phase == MonitorPhase::Stopping {
                inner.phase = MonitorPhase::Idle;
            }
        }

        if previous_phase != MonitorPhase::Idle {
            info!("⏹️ Live monitoring stopped");
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.shared.state.lock().connection_state
    }

    pub fn broadcast_state(&self) -> BroadcastState {
        self.shared.state.lock().broadcast_state
    }

    pub fn phase(&self) -> MonitorPhase {
        self.shared.state.lock().phase
    }

    /// 監視中かどうか
    pub fn is_running(&self) -> bool {
        self.phase() == MonitorPhase::Active
    }

    /// 最後に監視を開始した対象から抽出したセッションID
    pub fn session_id(&self) -> Option<String> {
        self.shared.state.lock().session_id.clone()
    }

    /// 最後に監視を開始した対象（開始に失敗した場合は`None`）
    pub fn target(&self) -> Option<String> {
        self.shared.state.lock().target.clone()
    }

    /// 統計のスナップショット
    pub fn statistics(&self) -> SessionStats {
        self.shared.state.lock().stats.snapshot()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if self.phase() != MonitorPhase::Idle {
            self.stop_monitoring();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageKind;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct MockState {
        sinks: parking_lot::Mutex<Vec<EventSink>>,
        fail_create: AtomicBool,
        fail_start: AtomicBool,
        fail_stop: AtomicBool,
        starts: AtomicUsize,
        stops: AtomicUsize,
    }

    struct MockConnector {
        state: Arc<MockState>,
    }

    impl LiveSourceConnector for MockConnector {
        fn start(&mut self) -> Result<(), ConnectorError> {
            self.state.starts.fetch_add(1, Ordering::SeqCst);
            if self.state.fail_start.load(Ordering::SeqCst) {
                return Err(ConnectorError::Start("refused".to_string()));
            }
            Ok(())
        }

        fn stop(&mut self) -> Result<(), ConnectorError> {
            self.state.stops.fetch_add(1, Ordering::SeqCst);
            if self.state.fail_stop.load(Ordering::SeqCst) {
                return Err(ConnectorError::Stop("stuck".to_string()));
            }
            Ok(())
        }
    }

    struct MockFactory {
        state: Arc<MockState>,
    }

    impl ConnectorFactory for MockFactory {
        fn create(
            &self,
            target: &str,
            sink: EventSink,
        ) -> Result<Box<dyn LiveSourceConnector>, ConnectorError> {
            if self.state.fail_create.load(Ordering::SeqCst) {
                return Err(ConnectorError::create(target, "unreachable"));
            }
            self.state.sinks.lock().push(sink);
            Ok(Box::new(MockConnector {
                state: Arc::clone(&self.state),
            }))
        }
    }

    fn manager_with(config: MonitorConfig) -> (SessionManager, Arc<MockState>) {
        let state = Arc::new(MockState::default());
        let factory = MockFactory {
            state: Arc::clone(&state),
        };
        (SessionManager::new(Arc::new(factory), config), state)
    }

    fn manager() -> (SessionManager, Arc<MockState>) {
        manager_with(MonitorConfig::default())
    }

    fn last_sink(state: &MockState) -> EventSink {
        state.sinks.lock().last().cloned().expect("no connector created")
    }

    fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_sets_connecting_and_session_id() {
        let (manager, state) = manager();
        let mut rx = manager.subscribe();

        assert!(manager.start_monitoring("https://live.example.com/123456789"));
        assert!(manager.is_running());
        assert_eq!(manager.session_id(), Some("123456789".to_string()));
        assert_eq!(manager.connection_state(), ConnectionState::Connecting);
        assert_eq!(state.starts.load(Ordering::SeqCst), 1);

        let stats = manager.statistics();
        assert!(stats.session_start_time.is_some());
        assert_eq!(stats.total_messages, 0);

        let events = drain(&mut rx);
        assert!(matches!(events[0], SessionEvent::StatisticsUpdated(_)));
        assert!(matches!(
            events[1],
            SessionEvent::ConnectionStateChanged(ConnectionState::Connecting)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_without_numeric_segment_still_proceeds() {
        let (manager, _state) = manager();

        assert!(manager.start_monitoring("https://live.example.com/room"));
        assert!(manager.is_running());
        assert_eq!(manager.session_id(), None);
        assert_eq!(
            manager.target(),
            Some("https://live.example.com/room".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_are_classified_and_republished() {
        let (manager, state) = manager();
        manager.start_monitoring("https://live.example.com/1");
        let mut rx = manager.subscribe();
        let sink = last_sink(&state);

        for kind in [
            MessageKind::Chat,
            MessageKind::Gift,
            MessageKind::Like,
            MessageKind::Like,
        ] {
            sink.emit_event(RawEvent::with_kind(kind));
        }

        let stats = manager.statistics();
        assert_eq!(stats.total_messages, 4);
        assert_eq!(stats.chat_messages, 1);
        assert_eq!(stats.gift_messages, 1);
        assert_eq!(stats.like_messages, 2);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 8);
        for pair in events.chunks(2) {
            assert!(matches!(pair[0], SessionEvent::MessageReceived(_)));
            assert!(matches!(pair[1], SessionEvent::StatisticsUpdated(_)));
        }
        match &events[7] {
            SessionEvent::StatisticsUpdated(stats) => assert_eq!(stats.total_messages, 4),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_connectivity_is_suppressed() {
        let (manager, state) = manager();
        manager.start_monitoring("https://live.example.com/1");
        let mut rx = manager.subscribe();
        let sink = last_sink(&state);

        sink.emit_connectivity(true);
        sink.emit_connectivity(true);

        let changes: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|event| matches!(event, SessionEvent::ConnectionStateChanged(_)))
            .collect();
        assert_eq!(changes.len(), 1);
        assert_eq!(manager.connection_state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_status_updates_broadcast_state() {
        let (manager, state) = manager();
        manager.start_monitoring("https://live.example.com/1");
        let mut rx = manager.subscribe();
        let sink = last_sink(&state);

        sink.emit_event(RawEvent::with_kind(MessageKind::LiveStatus).field("status", 2));
        assert_eq!(manager.broadcast_state(), BroadcastState::Live);

        let changes: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::BroadcastStateChanged(state) => Some(state),
                _ => None,
            })
            .collect();
        assert_eq!(changes, vec![BroadcastState::Live]);

        sink.emit_event(RawEvent::with_kind(MessageKind::LiveStatus).field("status", 999));
        assert_eq!(manager.broadcast_state(), BroadcastState::Unknown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connector_error_is_forwarded_without_state_change() {
        let (manager, state) = manager();
        manager.start_monitoring("https://live.example.com/1");
        let mut rx = manager.subscribe();

        last_sink(&state).emit_error("socket reset");

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], SessionEvent::ErrorOccurred(message) if message == "socket reset"));
        assert_eq!(manager.connection_state(), ConnectionState::Connecting);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let (manager, state) = manager();
        let mut rx = manager.subscribe();

        manager.stop_monitoring();
        assert_eq!(manager.connection_state(), ConnectionState::Disconnected);

        manager.start_monitoring("https://live.example.com/1");
        manager.stop_monitoring();
        assert_eq!(manager.connection_state(), ConnectionState::Disconnected);
        manager.stop_monitoring();
        assert_eq!(manager.connection_state(), ConnectionState::Disconnected);
        assert_eq!(manager.phase(), MonitorPhase::Idle);
        assert_eq!(state.stops.load(Ordering::SeqCst), 1);

        let errors = drain(&mut rx)
            .into_iter()
            .filter(|event| matches!(event, SessionEvent::ErrorOccurred(_)))
            .count();
        assert_eq!(errors, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_resets_states_and_discards_stats() {
        let (manager, state) = manager();
        manager.start_monitoring("https://live.example.com/1");
        let sink = last_sink(&state);
        sink.emit_connectivity(true);
        sink.emit_event(RawEvent::with_kind(MessageKind::LiveStatus).field("status", 2));

        manager.stop_monitoring();

        assert!(!manager.is_running());
        assert_eq!(manager.connection_state(), ConnectionState::Disconnected);
        assert_eq!(manager.broadcast_state(), BroadcastState::Unknown);
        assert_eq!(manager.statistics(), SessionStats::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_callbacks_after_stop_are_discarded() {
        let (manager, state) = manager();
        manager.start_monitoring("https://live.example.com/1");
        let sink = last_sink(&state);
        manager.stop_monitoring();
        let mut rx = manager.subscribe();

        sink.emit_connectivity(true);
        sink.emit_event(RawEvent::with_kind(MessageKind::Chat));
        sink.emit_error("late");

        assert!(drain(&mut rx).is_empty());
        assert_eq!(manager.connection_state(), ConnectionState::Disconnected);
        assert_eq!(manager.statistics().total_messages, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_failure_is_reported_and_state_still_resets() {
        let (manager, state) = manager();
        manager.start_monitoring("https://live.example.com/1");
        state.fail_stop.store(true, Ordering::SeqCst);
        let mut rx = manager.subscribe();

        manager.stop_monitoring();

        assert_eq!(manager.connection_state(), ConnectionState::Disconnected);
        assert_eq!(manager.phase(), MonitorPhase::Idle);
        let errors: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::ErrorOccurred(message) => Some(message),
                _ => None,
            })
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Failed to stop monitoring"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_failure_returns_false_without_timers() {
        let (manager, state) = manager();
        state.fail_create.store(true, Ordering::SeqCst);
        let mut rx = manager.subscribe();

        assert!(!manager.start_monitoring("https://live.example.com/1"));
        assert!(!manager.is_running());
        assert_eq!(manager.phase(), MonitorPhase::Idle);
        assert_eq!(manager.connection_state(), ConnectionState::Error);
        assert_eq!(manager.target(), None);
        assert_eq!(manager.session_id(), None);

        let events = drain(&mut rx);
        assert!(events.iter().any(|event| matches!(
            event,
            SessionEvent::ErrorOccurred(message) if message.contains("Failed to start monitoring")
        )));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_failure_releases_connector() {
        let (manager, state) = manager();
        state.fail_start.store(true, Ordering::SeqCst);

        assert!(!manager.start_monitoring("https://live.example.com/1"));
        assert_eq!(state.stops.load(Ordering::SeqCst), 1);

        // 失敗したコネクタからのコールバックは無視される
        last_sink(&state).emit_connectivity(true);
        assert_eq!(manager.connection_state(), ConnectionState::Error);
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let (manager, state) = manager();
        let mut rx = manager.subscribe();

        assert!(!manager.start_monitoring("https://live.example.com/1"));
        assert_eq!(state.starts.load(Ordering::SeqCst), 0);
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [SessionEvent::ErrorOccurred(_)]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_stops_previous_connector() {
        let (manager, state) = manager();
        manager.start_monitoring("https://live.example.com/1");
        let first_sink = last_sink(&state);

        assert!(manager.start_monitoring("https://live.example.com/2"));
        assert_eq!(state.stops.load(Ordering::SeqCst), 1);
        assert_eq!(state.starts.load(Ordering::SeqCst), 2);
        assert_eq!(manager.session_id(), Some("2".to_string()));

        first_sink.emit_event(RawEvent::with_kind(MessageKind::Chat));
        assert_eq!(manager.statistics().total_messages, 0);

        last_sink(&state).emit_event(RawEvent::with_kind(MessageKind::Chat));
        assert_eq!(manager.statistics().total_messages, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_liveness_timer_emits_snapshots() {
        let (manager, _state) = manager();
        manager.start_monitoring("https://live.example.com/1");
        let mut rx = manager.subscribe();

        tokio::time::sleep(Duration::from_millis(3500)).await;

        let snapshots = drain(&mut rx)
            .into_iter()
            .filter(|event| matches!(event, SessionEvent::StatisticsUpdated(_)))
            .count();
        assert_eq!(snapshots, 3);

        manager.stop_monitoring();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_reset_preserves_start_time() {
        let config = MonitorConfig {
            liveness_interval_ms: 60_000,
            stats_reset_interval_secs: 10,
            ..MonitorConfig::default()
        };
        let (manager, state) = manager_with(config);
        manager.start_monitoring("https://live.example.com/1");
        let start_time = manager.statistics().session_start_time;

        last_sink(&state).emit_event(RawEvent::with_kind(MessageKind::Gift));
        assert_eq!(manager.statistics().total_messages, 1);

        tokio::time::sleep(Duration::from_millis(10_500)).await;

        let stats = manager.statistics();
        assert_eq!(stats.total_messages, 0);
        assert_eq!(stats.gift_messages, 0);
        assert_eq!(stats.last_message_time, None);
        assert_eq!(stats.session_start_time, start_time);
    }
}
