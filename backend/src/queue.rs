//! The review queue.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::items::{Grade, Item};
use crate::{Interval, Time};

/// A snapshot of study items, as handed over by the item store.
///
/// The queue never writes anything back; reviews are only recorded in memory.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Queue {
    /// The items.
    items: Vec<Item>,
}

impl Queue {
    /// Create a queue of `items`.
    pub fn new(items: Vec<Item>) -> Queue {
        Queue { items }
    }

    /// Load from YAML-formatted text.
    pub fn parse(input: &str) -> Result<Queue, yaml::Error> {
        yaml::from_str(input)
    }

    /// Serialize to YAML-formatted text.
    ///
    /// This is the inverse to `parse`.
    pub fn serialize(&self) -> Result<String, yaml::Error> {
        yaml::to_string(self)
    }

    /// Get the item with ID `id`.
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Get all the items.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// The number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Are there no items at all?
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The number of items due at `now`.
    pub fn due_count(&self, now: Time) -> usize {
        self.items.iter().filter(|item| item.is_due(now)).count()
    }

    /// Pick the due item that is most overdue relative to its schedule.
    ///
    /// Ties go to the smallest ID, so the choice is deterministic.
    pub fn next_due(&self, now: Time) -> Option<&Item> {
        self.next_due_skipping(now, &HashSet::new())
    }

    /// Pick the most overdue item like `next_due`, leaving out the items with IDs in `skipped`.
    pub fn next_due_skipping(&self, now: Time, skipped: &HashSet<String>) -> Option<&Item> {
        self.items
            .iter()
            .filter(|item| item.is_due(now) && !skipped.contains(&item.id))
            .min_by(|a, b| b.readiness(now)
                .partial_cmp(&a.readiness(now))
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id)))
    }

    /// Record a review of the item with ID `id`.
    ///
    /// Returns the updated item, or `None` if no such item exists.
    pub fn record(&mut self, id: &str, grade: Grade, now: Time, interval: Interval) -> Option<&Item> {
        let item = self.items.iter_mut().find(|item| item.id == id)?;
        *item = item.reviewed(grade, now, interval);
        debug!(item = %item.id, %grade, next = item.next, "recorded review");
        Some(&*item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::Part;

    fn queue() -> Queue {
        Queue::parse("
items:
  - id: a
    part: rune
    last: 1000
    next: 2000
    interval: 1000
    reviews: 3
    successes: 2
  - id: b
    part: tone
    last: 1000
    next: 1500
    interval: 500
    reviews: 1
    successes: 1
  - id: c
    part: defn
    last: 1000
    next: 9000
    interval: 8000
    reviews: 1
    successes: 1
").unwrap()
    }

    #[test]
    fn due() {
        let queue = queue();
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.due_count(1200), 0);
        assert_eq!(queue.due_count(1500), 1);
        assert_eq!(queue.due_count(2000), 2);
        assert!(queue.next_due(1200).is_none());
        // `b` is at four times its interval, `a` at two.
        assert_eq!(queue.next_due(3000).unwrap().id, "b");
    }

    #[test]
    fn new_items_first() {
        let mut queue = queue();
        queue.items.push(Item::new("z", Part::Rdng));
        assert_eq!(queue.next_due(3000).unwrap().id, "z");
        assert_eq!(queue.due_count(0), 1);
    }

    #[test]
    fn skipping() {
        let queue = queue();
        let mut skipped = HashSet::new();
        skipped.insert("b".to_string());
        assert_eq!(queue.next_due_skipping(3000, &skipped).unwrap().id, "a");
        skipped.insert("a".to_string());
        assert!(queue.next_due_skipping(3000, &skipped).is_none());
        // Skipping does not change the due count.
        assert_eq!(queue.due_count(3000), 2);
    }

    #[test]
    fn record() {
        let mut queue = queue();
        let item = queue.record("b", Grade::Right, 3000, 6000).unwrap();
        assert_eq!(item.next, 9000);
        assert_eq!(item.reviews, 2);
        assert_eq!(queue.next_due(3000).unwrap().id, "a");
        assert!(queue.record("nope", Grade::Wrong, 3000, 30).is_none());
    }

    #[test]
    fn serialize() {
        let queue = queue();
        let reparsed = Queue::parse(&queue.serialize().unwrap()).unwrap();
        assert_eq!(reparsed.items(), queue.items());
        assert_eq!(reparsed.get("c").unwrap().part, Part::Defn);
    }
}
