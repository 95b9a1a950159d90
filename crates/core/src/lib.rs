pub mod acquisition;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod metrics;
pub mod normalize;
pub mod peer;
pub mod poll;
pub mod queue;
pub mod testing;

pub use acquisition::{AcquisitionError, AcquisitionResult, AcquisitionService, AcquisitionTarget};
pub use backend::{BackendError, BackendKind};
pub use config::{
    load_config, load_config_from_str, validate_config, AcquisitionConfig, BackendConfig, Config,
    ConfigError, QueueWatchConfig, SanitizedConfig,
};
pub use queue::{
    detect_finished_queue_items, FinishedQueueItem, QueueDiff, QueueExitOutcome, QueueRecord,
};
