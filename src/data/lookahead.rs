use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::data::cache::FeedCache;
use crate::data::stats_api::StatsSource;
use crate::data::types::ScheduleSnapshot;

/// Fetches today's schedule and, on a day without games, walks forward one day at a
/// time until it finds a day with games or the window runs out.
pub struct ScheduleProbe<S: StatsSource> {
    source: Arc<S>,
    cache: Arc<FeedCache>,
    lookahead_days: u32,
}

impl<S: StatsSource> ScheduleProbe<S> {
    pub fn new(source: Arc<S>, cache: Arc<FeedCache>, lookahead_days: u32) -> Self {
        Self {
            source,
            cache,
            lookahead_days,
        }
    }

    pub async fn fetch(&self, today: NaiveDate) -> Result<ScheduleSnapshot> {
        let mut snapshot = self.source.schedule(today).await?;
        if !snapshot.games.is_empty() {
            return Ok(snapshot);
        }

        for offset in 1..=self.lookahead_days {
            let date = today + Duration::days(i64::from(offset));

            // Future days change slowly, so they come from the cache when possible
            let day = match self.cache.schedule(date) {
                Some(day) => day,
                None => {
                    let day = self.source.schedule(date).await?;
                    self.cache.insert_schedule(day.clone());
                    day
                }
            };

            if !day.games.is_empty() {
                debug!(%today, next = %date, games = day.games.len(), "Found next game day");
                snapshot.upcoming = day.games;
                break;
            }
        }

        Ok(snapshot)
    }
}
