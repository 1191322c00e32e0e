//! Nutri Track - clinical nutrition tracking service
//!
//! This library holds the interval weight change calculator behind the
//! service's patient weight checks, along with the daily nutrition target
//! and tube feed delivery calculations and the HTTP and persistence layers
//! built around them.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    compute_interval_change, IntervalChange, IntervalNote, WeightChangeError, WeightChecker, WeightHistory,
    WeightHistoryQuery,
};
pub use models::{WeightCheck, WeightRecord};
