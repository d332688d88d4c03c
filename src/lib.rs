//! Retrospective battery-savings simulator.
//!
//! Replays a historical usage series against a time-of-use tariff with and
//! without a battery driven by a dispatch strategy, and reports the savings.

pub mod battery;
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
/// CSV import and export modules.
pub mod io;
pub mod pricing;
pub mod profile;
pub mod series;
pub mod summary;

pub use battery::{Battery, BatterySpec};
pub use control::{Control, ControlAlgorithm, DecisionContext};
pub use engine::{Engine, IntervalRecord, NetMetering, RunOptions};
pub use error::SimError;
pub use pricing::{FlatRate, PricePolicy, RateRule, TouSchedule};
pub use series::{Sample, TimeSeries};
pub use summary::Summary;
