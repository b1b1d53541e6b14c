//! Study items and their review grades.

use std::convert::TryFrom;
use std::{fmt, str};

use serde::{Serialize, Deserialize};

use crate::scheduler::ScheduleError;
use crate::{Interval, Time};

/// The number of grades.
pub const GRADES: usize = 4;
/// The number of parts.
pub const PARTS: usize = 4;

/// The user-specified grade of the review of a single item.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Grade {
    /// Wrong; the item will be shown again soon.
    Wrong = 1,
    /// Barely right.
    Hard = 2,
    /// Right.
    Right = 3,
    /// Right, and too easy.
    Easy = 4,
}

impl Grade {
    /// All grades, in order of their score.
    pub const ALL: [Grade; GRADES] = [Grade::Wrong, Grade::Hard, Grade::Right, Grade::Easy];

    /// Convert a raw score (1-4) into a grade.
    pub fn from_score(score: i64) -> Result<Grade, ScheduleError> {
        match score {
            1 => Ok(Grade::Wrong),
            2 => Ok(Grade::Hard),
            3 => Ok(Grade::Right),
            4 => Ok(Grade::Easy),
            _ => Err(ScheduleError::InvalidGrade(score)),
        }
    }

    /// The raw score of this grade.
    pub fn score(self) -> i64 {
        self as i64
    }

    /// Does this grade count as a successful review?
    pub fn is_success(self) -> bool {
        self != Grade::Wrong
    }
}

impl TryFrom<i64> for Grade {
    type Error = ScheduleError;

    fn try_from(score: i64) -> Result<Grade, ScheduleError> {
        Grade::from_score(score)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Wrong => write!(f, "wrong"),
            Grade::Hard => write!(f, "hard"),
            Grade::Right => write!(f, "right"),
            Grade::Easy => write!(f, "easy"),
        }
    }
}

/// The part of a vocabulary word that an item drills.
///
/// Each part is configured separately.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Part {
    /// Writing the character.
    Rune,
    /// Recalling the tone.
    Tone,
    /// Recalling the definition.
    Defn,
    /// Recalling the reading.
    Rdng,
}

impl Part {
    /// All parts.
    pub const ALL: [Part; PARTS] = [Part::Rune, Part::Tone, Part::Defn, Part::Rdng];

    /// The name of the part, as used in item IDs and settings files.
    pub fn as_str(self) -> &'static str {
        match self {
            Part::Rune => "rune",
            Part::Tone => "tone",
            Part::Defn => "defn",
            Part::Rdng => "rdng",
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl str::FromStr for Part {
    type Err = ();

    fn from_str(s: &str) -> Result<Part, ()> {
        Part::ALL.iter().cloned().find(|part| part.as_str() == s).ok_or(())
    }
}

/// The review state of a study item.
///
/// This is what the item store hands to the scheduler. The scheduler only reads it; the caller
/// persists the result of `Item::reviewed`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Item {
    /// The identifier of the item.
    pub id: String,
    /// The part the item drills.
    pub part: Part,
    /// The time of the previous review, if any.
    #[serde(default)]
    pub last: Option<Time>,
    /// The time the item is scheduled to be reviewed.
    ///
    /// Only meaningful if `last` is present.
    #[serde(default)]
    pub next: Time,
    /// The current interval.
    #[serde(default)]
    pub interval: Interval,
    /// The number of completed reviews.
    #[serde(default)]
    pub reviews: u32,
    /// The number of reviews graded as a success.
    #[serde(default)]
    pub successes: u32,
    /// The number of failed reviews in a row.
    #[serde(default)]
    pub consecutive_wrong: u32,
}

impl Item {
    /// Create a new, never reviewed item.
    pub fn new(id: impl Into<String>, part: Part) -> Item {
        Item {
            id: id.into(),
            part,
            last: None,
            next: 0,
            interval: 0,
            reviews: 0,
            successes: 0,
            consecutive_wrong: 0,
        }
    }

    /// Has the item never been reviewed?
    ///
    /// This goes by the time of the last review, which is what the scheduler uses, not the
    /// review count.
    pub fn is_new(&self) -> bool {
        self.last.is_none()
    }

    /// Does the user keep failing this item?
    pub fn is_leech(&self) -> bool {
        self.consecutive_wrong >= 2
    }

    /// Is the item due for review at `now`?
    pub fn is_due(&self, now: Time) -> bool {
        self.last.is_none() || self.next <= now
    }

    /// How far the item is into its scheduled interval.
    ///
    /// 1 means exactly on schedule, values above 1 mean overdue. Items that were never reviewed,
    /// or whose schedule is degenerate, are infinitely ready.
    pub fn readiness(&self, now: Time) -> f64 {
        match self.last {
            Some(last) if self.next > last =>
                now.saturating_sub(last) as f64 / self.next.saturating_sub(last) as f64,
            _ => f64::INFINITY,
        }
    }

    /// The item after a review at `now` with grade `grade`, rescheduled `interval` seconds out.
    pub fn reviewed(&self, grade: Grade, now: Time, interval: Interval) -> Item {
        let success = grade.is_success();
        Item {
            id: self.id.clone(),
            part: self.part,
            last: Some(now),
            next: now.saturating_add(interval),
            interval,
            reviews: self.reviews + 1,
            successes: self.successes + success as u32,
            consecutive_wrong: if success { 0 } else { self.consecutive_wrong + 1 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_scores() {
        for (n, grade) in Grade::ALL.iter().enumerate() {
            assert_eq!(Grade::from_score(n as i64 + 1).unwrap(), *grade);
            assert_eq!(grade.score(), n as i64 + 1);
        }
        assert_eq!(Grade::from_score(0), Err(ScheduleError::InvalidGrade(0)));
        assert_eq!(Grade::try_from(5), Err(ScheduleError::InvalidGrade(5)));
    }

    #[test]
    fn part_names() {
        assert_eq!("rdng".parse::<Part>(), Ok(Part::Rdng));
        assert!("stroke".parse::<Part>().is_err());
        assert_eq!(Part::Defn.to_string(), "defn");
    }

    #[test]
    fn reviewed_bookkeeping() {
        let item = Item::new("zh-猫-0-rune", Part::Rune);
        let item = item.reviewed(Grade::Wrong, 1000, 600);
        assert_eq!(item.last, Some(1000));
        assert_eq!(item.next, 1600);
        assert_eq!(item.interval, 600);
        assert_eq!((item.reviews, item.successes, item.consecutive_wrong), (1, 0, 1));
        assert!(!item.is_leech());

        let item = item.reviewed(Grade::Wrong, 1600, 600);
        assert!(item.is_leech());

        let item = item.reviewed(Grade::Hard, 2200, 3000);
        assert_eq!((item.reviews, item.successes, item.consecutive_wrong), (3, 1, 0));
        assert!(!item.is_new());
    }

    #[test]
    fn new_by_last_review() {
        let mut item = Item::new("a", Part::Rune);
        assert!(item.is_new());
        // A review time without any counted reviews still makes a repeat item.
        item.last = Some(100);
        item.next = 200;
        assert!(!item.is_new());
    }

    #[test]
    fn extreme_times() {
        let item = Item::new("a", Part::Rune).reviewed(Grade::Easy, i64::MAX - 10, 600);
        assert_eq!(item.next, i64::MAX);

        let item = Item { last: Some(i64::MIN), next: i64::MAX, ..Item::new("b", Part::Tone) };
        assert!(item.readiness(i64::MAX).is_finite());
    }

    #[test]
    fn readiness() {
        let mut item = Item::new("a", Part::Tone);
        assert!(item.readiness(0).is_infinite());
        assert!(item.is_due(0));

        item.last = Some(100);
        item.next = 200;
        assert_eq!(item.readiness(150), 0.5);
        assert_eq!(item.readiness(300), 2.0);
        assert!(!item.is_due(199));
        assert!(item.is_due(200));

        item.next = 100;
        assert!(item.readiness(150).is_infinite());
    }

    #[test]
    fn deserialize_defaults() {
        let item: Item = yaml::from_str("id: b\npart: defn\n").unwrap();
        assert_eq!(item, Item::new("b", Part::Defn));
    }
}
