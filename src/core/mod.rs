// Core calculation exports
pub mod calendar;
pub mod checker;
pub mod history;
pub mod targets;
pub mod tube_feed;
pub mod weight_change;

pub use calendar::{months_after, months_before};
pub use checker::{IntervalOutcome, WeightCheckResult, WeightChecker, STANDARD_INTERVALS};
pub use history::{WeightHistory, WeightHistoryQuery};
pub use targets::{nutrition_targets, round1, LB_PER_KG};
pub use tube_feed::{calculate_delivery, TubeFeedError};
pub use weight_change::{compute_interval_change, IntervalChange, IntervalNote, WeightChangeError};
