pub mod broadcaster;
pub mod classifier;
pub mod session;
pub mod statistics;
pub mod timers;

pub use broadcaster::{SessionBroadcaster, SessionEvent, DEFAULT_EVENT_BUFFER};
pub use classifier::{Classification, EventClassifier};
pub use session::{MonitorPhase, SessionManager};
pub use statistics::{SessionStats, StatisticsAggregator};
pub use timers::{PeriodicTimer, SessionTimers};
