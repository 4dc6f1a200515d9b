use chrono::{DateTime, Duration, Utc};

use crate::data::types::{AbstractState, GameSummary, ScheduleSnapshot};
use crate::selection::types::{FavoriteSet, SelectionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyConfig {
    /// Days after an empty day that still count as "in season".
    pub lookahead_days: u32,
    pub recent_limit: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            lookahead_days: 7,
            recent_limit: 5,
        }
    }
}

/// Decide what the viewer should show for the latest schedule.
///
/// Priority:
/// 1. empty day with nothing inside the lookahead window: off-season
/// 2. live games involving a favorite
/// 3. the non-favorite game the user picked, while it is still live
/// 4. next relevant preview game, else the most recent finals of the day
pub fn decide(
    snapshot: &ScheduleSnapshot,
    favorites: &FavoriteSet,
    previous: &SelectionState,
    now: DateTime<Utc>,
    config: &PolicyConfig,
) -> SelectionState {
    if snapshot.games.is_empty() {
        // +1 so a late game on the last calendar day of the window still counts
        let window_end = now + Duration::days(i64::from(config.lookahead_days) + 1);
        let upcoming: Vec<&GameSummary> = snapshot
            .upcoming
            .iter()
            .filter(|g| g.start_time <= window_end)
            .collect();

        if upcoming.is_empty() {
            return SelectionState::OffSeason;
        }
        return next_or_recent(upcoming, &[], favorites, config);
    }

    if !favorites.is_empty() {
        let favorite_live: Vec<GameSummary> = snapshot
            .games
            .iter()
            .filter(|g| g.is_live() && favorites.involves(g))
            .cloned()
            .collect();

        if !favorite_live.is_empty() {
            return SelectionState::live(favorite_live);
        }
    }

    if let Some(watched) = manually_watched(previous, favorites) {
        if let Some(game) = snapshot.game(watched.game_pk).filter(|g| g.is_live()) {
            return SelectionState::live(vec![game.clone()]);
        }
    }

    next_or_recent(snapshot.games.iter().collect(), &snapshot.games, favorites, config)
}

/// `decide` always starts the live list at index 0. Keep the cursor on the game that
/// was on screen when it is still part of the new list.
pub fn retain_cursor(previous: &SelectionState, next: SelectionState) -> SelectionState {
    match (previous.current_game_pk(), next) {
        (Some(shown), SelectionState::ShowingLive { games, .. }) => {
            let current = games.iter().position(|g| g.game_pk == shown).unwrap_or(0);
            SelectionState::ShowingLive { games, current }
        }
        (_, next) => next,
    }
}

/// A single live game with no favorite involved can only come from the user picking it.
fn manually_watched<'a>(
    previous: &'a SelectionState,
    favorites: &FavoriteSet,
) -> Option<&'a GameSummary> {
    match previous {
        SelectionState::ShowingLive { games, .. } if games.len() == 1 => {
            let game = &games[0];
            (!favorites.involves(game)).then_some(game)
        }
        _ => None,
    }
}

fn next_or_recent(
    candidates: Vec<&GameSummary>,
    all_games: &[GameSummary],
    favorites: &FavoriteSet,
    config: &PolicyConfig,
) -> SelectionState {
    let mut previews: Vec<&GameSummary> = candidates
        .into_iter()
        .filter(|g| g.state == AbstractState::Preview)
        .filter(|g| favorites.is_empty() || favorites.involves(g))
        .collect();
    // Stable: equal start times keep schedule order
    previews.sort_by_key(|g| g.start_time);

    if let Some(next) = previews.first() {
        return SelectionState::ShowingNext((*next).clone());
    }

    let mut finals: Vec<&GameSummary> = all_games
        .iter()
        .filter(|g| g.state == AbstractState::Final)
        .collect();
    finals.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    finals.truncate(config.recent_limit);

    SelectionState::ShowingRecent(finals.into_iter().cloned().collect())
}
