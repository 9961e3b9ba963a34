pub use crate::config::{ClockProConfig, ClockProConfigBuilder};
pub use crate::error::{ConfigError, InvariantError};
pub use crate::page::{
    ObjectId, OwnerLock, PageFlags, PageHost, PageId, PageIdentity, QueueTag, RefSample,
};
pub use crate::policy::clock_pro::ClockPro;
pub use crate::sim::SimHost;

#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::ClockProMetricsSnapshot;
#[cfg(feature = "metrics")]
pub use crate::metrics::traits::MetricsSnapshotProvider;
#[cfg(feature = "concurrency")]
pub use crate::sync::SharedClockPro;
