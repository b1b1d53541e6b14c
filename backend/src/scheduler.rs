//! Scheduling of study items.

use std::{error, fmt};

use tracing::{debug, trace};

use crate::items::{Grade, Item, GRADES};
use crate::settings::{ConfigStore, SrsConfig, BRACKETS};
use crate::{Interval, Time};

/// The shortest interval any item can get.
const MIN_INTERVAL: Interval = 30;
/// The shortest interval a reviewed item graded hard can get.
const MIN_HARD_INTERVAL: Interval = 300;
/// The longest interval a failed item can get (a week).
const MAX_WRONG_INTERVAL: Interval = 604800;
/// The longest interval any item can get (about ten years).
const MAX_INTERVAL: Interval = 315569260;
/// Items with a perfect record and fewer reviews than this graduate faster.
const ACCELERATION_REVIEWS: u32 = 5;
/// Items with more reviews than this and a poor record are slowed down.
const DECELERATION_REVIEWS: u32 = 8;

/// An error preventing an interval from being computed.
#[derive(Clone, PartialEq, Debug)]
pub enum ScheduleError {
    /// The score is not one of 1-4.
    InvalidGrade(i64),
    /// The settings of the item's part are missing or unusable.
    InvalidConfig(String),
    /// The item was scheduled for no later than it was last reviewed, or the scheduled interval
    /// cannot be represented.
    DegenerateSchedule {
        /// The time of the previous review.
        last: Time,
        /// The scheduled time.
        next: Time,
    },
}

impl error::Error for ScheduleError {}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScheduleError::InvalidGrade(score) => write!(f, "invalid grade {} (must be 1-4)", score),
            ScheduleError::InvalidConfig(reason) => write!(f, "invalid configuration: {}", reason),
            ScheduleError::DegenerateSchedule { last, next } =>
                write!(f, "item scheduled for {} but last reviewed at {}", next, last),
        }
    }
}

/// The interval of a new item, before randomization.
fn initial_interval(config: &SrsConfig, grade: Grade) -> f64 {
    let right = config.initial_right_interval as f64;
    match grade {
        Grade::Wrong => config.initial_wrong_interval as f64,
        Grade::Hard => right / 5.0,
        Grade::Right => right,
        Grade::Easy => right * 4.0,
    }
}

/// Find the ease factor for an item of current interval `interval`.
fn ease_factor(config: &SrsConfig, grade: Grade, interval: Interval) -> Result<f64, ScheduleError> {
    let factors = if grade == Grade::Wrong { &config.wrong_factors } else { &config.right_factors };
    let bracket = BRACKETS.iter().rposition(|&threshold| interval > threshold).unwrap_or(0);
    trace!(interval, bracket, "selected ease bracket");

    factors.get(bracket).cloned().ok_or_else(|| ScheduleError::InvalidConfig(format!(
        "{} factors has no entry for bracket {}",
        if grade == Grade::Wrong { "wrong" } else { "right" },
        bracket,
    )))
}

/// Multiply by a random value in [0.925, 1.075) and round.
fn randomize<F: FnMut() -> f64>(interval: f64, rand: &mut F) -> f64 {
    (interval * (0.925 + rand() * 0.15)).round()
}

/// Clamp a randomized interval to the range allowed for `grade`.
fn bound_interval(interval: f64, grade: Grade, repeat: bool) -> Interval {
    let (min, max) = match grade {
        Grade::Wrong => (MIN_INTERVAL, MAX_WRONG_INTERVAL),
        Grade::Hard if repeat => (MIN_HARD_INTERVAL, MAX_INTERVAL),
        _ => (MIN_INTERVAL, MAX_INTERVAL),
    };

    // NaN only arises from a broken random source; treat it as the shortest interval.
    if interval.is_nan() {
        min
    } else {
        interval.max(min as f64).min(max as f64) as Interval
    }
}

/// Calculate the next interval of `item` after a review graded `grade` at time `now`.
///
/// `rand` must yield uniformly distributed values in [0, 1). The item and settings are only read;
/// the caller persists the returned interval (see `Item::reviewed`).
pub fn next_interval<F>(item: &Item, grade: Grade, config: &SrsConfig, now: Time, mut rand: F)
    -> Result<Interval, ScheduleError>
    where F: FnMut() -> f64
{
    config.validate()?;

    let last = match item.last {
        Some(last) => last,
        None => {
            let interval = bound_interval(randomize(initial_interval(config, grade), &mut rand), grade, false);
            debug!(item = %item.id, %grade, interval, "scheduled new item");
            return Ok(interval);
        },
    };

    let scheduled = match item.next.checked_sub(last) {
        Some(scheduled) if scheduled > 0 => scheduled,
        _ => return Err(ScheduleError::DegenerateSchedule { last, next: item.next }),
    };
    let actual = now.saturating_sub(last);
    let ratio = actual as f64 / scheduled as f64;
    let mut factor = ease_factor(config, grade, item.interval)?;
    debug!(item = %item.id, actual, scheduled, ratio, factor, "computing interval");

    // Stretch the factor's distance from 1 by how late (or early) the review was.
    if grade == Grade::Right || grade == Grade::Easy {
        factor = (factor - 1.0) * ratio + 1.0;
    }

    // Accelerate new items that are already known.
    if item.successes == item.reviews && item.reviews < ACCELERATION_REVIEWS {
        factor *= 1.5;
    }

    // Decelerate items that are hard to remember.
    if item.reviews > DECELERATION_REVIEWS {
        let pct_right = item.successes as f64 / item.reviews as f64;
        if pct_right < 0.5 {
            factor *= pct_right.powf(0.7);
        }
    }

    let interval = bound_interval(randomize(actual as f64 * factor, &mut rand), grade, true);
    debug!(item = %item.id, %grade, factor, interval, "scheduled item");
    Ok(interval)
}

/// The interval scheduler.
///
/// This couples the settings of every part with the interval calculation.
#[derive(Clone, Debug, Default)]
pub struct IntervalScheduler {
    configs: ConfigStore,
}

impl IntervalScheduler {
    /// Create a scheduler using the settings in `configs`.
    pub fn new(configs: ConfigStore) -> IntervalScheduler {
        IntervalScheduler { configs }
    }

    /// Get the settings of every part.
    pub fn configs(&self) -> &ConfigStore {
        &self.configs
    }

    /// Calculate the next interval of `item` after a review graded `grade`.
    pub fn next_interval<F>(&self, item: &Item, grade: Grade, now: Time, rand: F) -> Result<Interval, ScheduleError>
        where F: FnMut() -> f64
    {
        next_interval(item, grade, self.configs.get(item.part)?, now, rand)
    }

    /// Calculate the next interval of `item` from a raw score (1-4).
    pub fn next_interval_for_score<F>(&self, item: &Item, score: i64, now: Time, rand: F)
        -> Result<Interval, ScheduleError>
        where F: FnMut() -> f64
    {
        self.next_interval(item, Grade::from_score(score)?, now, rand)
    }

    /// Get the possible next intervals of `item`, ordered after grade.
    ///
    /// These are supposed to be shown to the user before they grade the item.
    pub fn preview<F>(&self, item: &Item, now: Time, mut rand: F) -> Result<[Interval; GRADES], ScheduleError>
        where F: FnMut() -> f64
    {
        let mut intervals = [0; GRADES];
        for (interval, &grade) in intervals.iter_mut().zip(Grade::ALL.iter()) {
            *interval = self.next_interval(item, grade, now, &mut rand)?;
        }

        Ok(intervals)
    }
}
