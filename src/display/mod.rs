//! Plain-text rendering of the viewer screen.

pub mod play;
pub mod scoreboard;
pub mod summary;

use std::fmt::Display;

use chrono::FixedOffset;

use crate::data::types::{GameDetail, Record, ScheduleSnapshot, Team};
use crate::selection::types::{FavoriteSet, SelectionState};
use crate::viewer::access::AccessLevel;
use crate::viewer::tooltip::RunnerCard;

pub const PLACEHOLDER: &str = "-";

pub fn or_placeholder<T: Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn record_text(record: Option<&Record>) -> String {
    record
        .map(|r| format!("{}-{}", r.wins, r.losses))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Everything the renderer needs for one frame.
pub struct Screen<'a> {
    pub selection: &'a SelectionState,
    pub schedule: Option<&'a ScheduleSnapshot>,
    pub detail: Option<&'a GameDetail>,
    pub tooltip: Option<&'a RunnerCard>,
    pub favorites: &'a FavoriteSet,
    pub teams: &'a [Team],
    pub access: AccessLevel,
    pub offset: FixedOffset,
}

pub fn render(screen: &Screen) -> String {
    let mut out = String::new();
    out.push_str(&summary::favorites_line(screen.favorites, screen.teams));
    out.push_str("\n\n");

    let shown = screen.selection.current_game_pk();

    match screen.selection {
        SelectionState::Loading => out.push_str("Loading schedule...\n"),
        SelectionState::ShowingLive { games, current } => {
            let Some(game) = games.get(*current) else {
                return out;
            };
            // Only detail for the game on screen
            let detail = screen.detail.filter(|d| d.game_pk == game.game_pk);

            out.push_str(&format!("Live {}/{}\n", current + 1, games.len()));
            out.push_str(&scoreboard::scoreboard(game, detail));
            out.push('\n');

            match detail {
                Some(detail) => {
                    out.push_str(&scoreboard::diamond(&detail.linescore.bases));
                    if let Some(card) = screen.tooltip {
                        out.push_str(&scoreboard::runner_card(card));
                    }
                    out.push('\n');
                    if let Some((play, _)) = play::display_play(detail) {
                        out.push_str(&play::players(play, &detail.boxscore));
                        out.push('\n');
                    }
                    out.push_str(&play::render_on_deck(detail));
                    out.push('\n');
                    out.push_str(&play::current_play(detail));
                }
                None if screen.access == AccessLevel::Limited => {
                    out.push_str("Live game detail requires an access key\n");
                }
                None => out.push_str("Loading game...\n"),
            }
        }
        SelectionState::ShowingNext(game) => {
            out.push_str(&summary::next_game(game, &screen.offset));
        }
        SelectionState::ShowingRecent(games) => out.push_str(&summary::recent_scores(games)),
        SelectionState::OffSeason => out.push_str(&summary::off_season()),
    }

    if let Some(schedule) = screen.schedule {
        let others = summary::other_live_games(&schedule.games, shown);
        if !others.is_empty() {
            out.push('\n');
            out.push_str(&others);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::AbstractState;
    use crate::testing::{at, detail, game, snapshot};

    fn screen<'a>(
        selection: &'a SelectionState,
        schedule: Option<&'a ScheduleSnapshot>,
        detail: Option<&'a GameDetail>,
        favorites: &'a FavoriteSet,
        access: AccessLevel,
    ) -> Screen<'a> {
        Screen {
            selection,
            schedule,
            detail,
            tooltip: None,
            favorites,
            teams: &[],
            access,
            offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(or_placeholder::<u32>(None), "-");
        assert_eq!(or_placeholder(Some(4)), "4");
        assert_eq!(record_text(None), "-");
        assert_eq!(record_text(Some(&Record { wins: 3, losses: 1 })), "3-1");
    }

    #[test]
    fn test_render_live_with_detail() {
        let live = game(1, 10, 20, AbstractState::Live, at(17, 0));
        let other = game(2, 30, 40, AbstractState::Live, at(17, 0));
        let snap = snapshot(vec![live.clone(), other]);
        let selection = SelectionState::live(vec![live]);
        let favorites = FavoriteSet::from(vec![10]);
        let feed = detail(1);

        let text = render(&screen(&selection, Some(&snap), Some(&feed), &favorites, AccessLevel::Full));
        assert!(text.contains("Live 1/1"));
        assert!(text.contains("On Deck"));
        assert!(text.contains("Waiting for play data..."));
        assert!(text.contains("Other Live Games"));
        assert!(text.contains("[2]"));
    }

    #[test]
    fn test_render_ignores_detail_for_other_game() {
        let live = game(1, 10, 20, AbstractState::Live, at(17, 0));
        let selection = SelectionState::live(vec![live]);
        let favorites = FavoriteSet::new();
        let stale = detail(99);

        let text = render(&screen(&selection, None, Some(&stale), &favorites, AccessLevel::Full));
        assert!(text.contains("Loading game..."));

        let text = render(&screen(&selection, None, None, &favorites, AccessLevel::Limited));
        assert!(text.contains("requires an access key"));
    }

    #[test]
    fn test_render_states() {
        let favorites = FavoriteSet::new();
        let text = render(&screen(&SelectionState::OffSeason, None, None, &favorites, AccessLevel::Full));
        assert!(text.contains("Off Season"));

        let text = render(&screen(&SelectionState::Loading, None, None, &favorites, AccessLevel::Full));
        assert!(text.contains("Loading schedule..."));

        let empty = SelectionState::ShowingRecent(vec![]);
        let text = render(&screen(&empty, None, None, &favorites, AccessLevel::Full));
        assert!(text.contains("No games to show today"));
    }
}
