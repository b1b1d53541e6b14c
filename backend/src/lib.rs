//! Srs -- Spaced repetition interval scheduling for study items

extern crate chrono;
extern crate serde_yaml as yaml;

mod settings;
mod config;
mod items;
mod scheduler;
mod queue;

pub use config::{parse_config, ParsingError, ParsingErrorLine};
pub use items::{Grade, Item, Part, GRADES, PARTS};
pub use queue::Queue;
pub use scheduler::{next_interval, IntervalScheduler, ScheduleError};
pub use settings::{ConfigStore, SrsConfig, BRACKETS};

/// A point in time, in Unix seconds.
pub type Time = i64;
/// A span of time, in seconds.
pub type Interval = i64;

/// Get current time.
pub fn now() -> Time {
    chrono::Utc::now().timestamp()
}
