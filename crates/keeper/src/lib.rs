pub mod config;
pub mod keeper;
pub mod tracker;

pub use config::{create_example_config, OwnerConfig, ScoutConfig, YieldSourceKind};
pub use keeper::{Keeper, PassReport};
pub use tracker::{CycleState, OwnerSnapshot, PositionTracker, RefreshOutcome, TrackerSettings};
