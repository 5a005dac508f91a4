pub mod api;
pub mod chat;
pub mod commands;
pub mod configuration;
pub mod diff;
pub mod domain;
pub mod error;
pub mod notifier;
pub mod pipeline;
pub mod portal;
pub mod schedule;
pub mod startup;
pub mod store;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use configuration::*;
pub use diff::{ChangeSet, Snapshot, compute_changes};
pub use pipeline::{CycleOutcome, run_cycle};
pub use schedule::{Scheduler, SchedulerHandle, jittered_interval};
pub use startup::{AppState, Application};
pub use store::{ConfigStore, Record};
