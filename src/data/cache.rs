use chrono::NaiveDate;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::data::types::{GameDetail, GamePk, ScheduleSnapshot};

/// Last fetched snapshots, each entry replaced wholesale on insert.
pub struct FeedCache {
    schedules: DashMap<NaiveDate, Cached<ScheduleSnapshot>>,
    details: DashMap<GamePk, Cached<GameDetail>>,
    schedule_ttl: Duration,
    detail_ttl: Duration,
}

struct Cached<T> {
    value: T,
    stored_at: Instant,
}

impl<T> Cached<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }
}

impl FeedCache {
    pub fn new(schedule_ttl: Duration, detail_ttl: Duration) -> Self {
        Self {
            schedules: DashMap::new(),
            details: DashMap::new(),
            schedule_ttl,
            detail_ttl,
        }
    }

    pub fn insert_schedule(&self, snapshot: ScheduleSnapshot) {
        self.schedules.insert(snapshot.date, Cached::new(snapshot));
    }

    /// Get a day's schedule if not expired (evict on read)
    pub fn schedule(&self, date: NaiveDate) -> Option<ScheduleSnapshot> {
        get_fresh(&self.schedules, &date, self.schedule_ttl)
    }

    pub fn insert_detail(&self, detail: GameDetail) {
        self.details.insert(detail.game_pk, Cached::new(detail));
    }

    pub fn detail(&self, game_pk: GamePk) -> Option<GameDetail> {
        get_fresh(&self.details, &game_pk, self.detail_ttl)
    }

    pub fn len(&self) -> usize {
        self.schedules.len() + self.details.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty() && self.details.is_empty()
    }
}

fn get_fresh<K, T>(map: &DashMap<K, Cached<T>>, key: &K, ttl: Duration) -> Option<T>
where
    K: Eq + std::hash::Hash,
    T: Clone,
{
    let entry = map.get(key)?;
    if entry.stored_at.elapsed() > ttl {
        drop(entry); // Drop the read lock
        map.remove(key);
        None
    } else {
        Some(entry.value.clone())
    }
}
