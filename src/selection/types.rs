use serde::{Deserialize, Serialize};

use crate::data::types::{GamePk, GameSummary, TeamId};

pub const MAX_FAVORITES: usize = 3;

/// Followed teams in the order they were added. Never holds more than
/// [`MAX_FAVORITES`] ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TeamId>", into = "Vec<TeamId>")]
pub struct FavoriteSet {
    ids: Vec<TeamId>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `team_id` if present, otherwise append it while there is room.
    /// Toggling a new team into a full set returns the set unchanged.
    pub fn toggle(&self, team_id: TeamId) -> FavoriteSet {
        let mut ids = self.ids.clone();
        if let Some(pos) = ids.iter().position(|id| *id == team_id) {
            ids.remove(pos);
        } else if ids.len() < MAX_FAVORITES {
            ids.push(team_id);
        }
        FavoriteSet { ids }
    }

    pub fn contains(&self, team_id: TeamId) -> bool {
        self.ids.contains(&team_id)
    }

    pub fn involves(&self, game: &GameSummary) -> bool {
        self.contains(game.away.team.id) || self.contains(game.home.team.id)
    }

    pub fn ids(&self) -> &[TeamId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ids.len() >= MAX_FAVORITES
    }
}

// Stored lists may come from older or hand-edited databases
impl From<Vec<TeamId>> for FavoriteSet {
    fn from(raw: Vec<TeamId>) -> Self {
        let mut ids = Vec::with_capacity(MAX_FAVORITES);
        for id in raw {
            if ids.len() == MAX_FAVORITES {
                break;
            }
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        FavoriteSet { ids }
    }
}

impl From<FavoriteSet> for Vec<TeamId> {
    fn from(set: FavoriteSet) -> Self {
        set.ids
    }
}

/// What the viewer shows. Produced by [`crate::selection::policy::decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionState {
    /// No schedule has been observed yet.
    Loading,
    ShowingLive {
        games: Vec<GameSummary>,
        current: usize,
    },
    ShowingNext(GameSummary),
    /// Most recent finals, newest first. Empty means nothing to show today.
    ShowingRecent(Vec<GameSummary>),
    OffSeason,
}

impl SelectionState {
    pub fn live(games: Vec<GameSummary>) -> Self {
        SelectionState::ShowingLive { games, current: 0 }
    }

    /// The live game on screen, if any.
    pub fn current_game(&self) -> Option<&GameSummary> {
        match self {
            SelectionState::ShowingLive { games, current } => games.get(*current),
            _ => None,
        }
    }

    pub fn current_game_pk(&self) -> Option<GamePk> {
        self.current_game().map(|g| g.game_pk)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SelectionState::Loading => "loading",
            SelectionState::ShowingLive { .. } => "live",
            SelectionState::ShowingNext(_) => "next",
            SelectionState::ShowingRecent(_) => "recent",
            SelectionState::OffSeason => "off_season",
        }
    }

    /// Move the live cursor by `step`, wrapping at both ends. No-op for other states.
    pub fn navigate(&mut self, step: isize) {
        if let SelectionState::ShowingLive { games, current } = self {
            if games.is_empty() {
                return;
            }
            let len = games.len() as isize;
            *current = (*current as isize + step).rem_euclid(len) as usize;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::AbstractState;
    use crate::testing::{at, game};

    #[test]
    fn test_toggle_adds_in_insertion_order() {
        let set = FavoriteSet::new().toggle(30).toggle(10).toggle(20);
        assert_eq!(set.ids(), &[30, 10, 20]);
        assert!(set.is_full());
    }

    #[test]
    fn test_toggle_full_set_is_noop() {
        let set = FavoriteSet::from(vec![1, 2, 3]);
        assert_eq!(set.toggle(4), set);
    }

    #[test]
    fn test_toggle_removes_member_from_full_set() {
        let set = FavoriteSet::from(vec![1, 2, 3]);
        assert_eq!(set.toggle(2).ids(), &[1, 3]);
    }

    #[test]
    fn test_toggle_twice_round_trips() {
        let set = FavoriteSet::from(vec![5, 6]);
        assert_eq!(set.toggle(7).toggle(7), set);

        // Removing then re-adding the last member restores the order
        assert_eq!(set.toggle(6).toggle(6), set);
    }

    #[test]
    fn test_from_vec_dedupes_and_caps() {
        let set = FavoriteSet::from(vec![4, 4, 5, 6, 7]);
        assert_eq!(set.ids(), &[4, 5, 6]);
    }

    #[test]
    fn test_serde_as_plain_list() {
        let set = FavoriteSet::from(vec![147, 111]);
        assert_eq!(serde_json::to_string(&set).unwrap(), "[147,111]");

        let parsed: FavoriteSet = serde_json::from_str("[1,1,2,3,4]").unwrap();
        assert_eq!(parsed.ids(), &[1, 2, 3]);
    }

    #[test]
    fn test_navigate_wraps() {
        let games = vec![
            game(1, 10, 20, AbstractState::Live, at(17, 0)),
            game(2, 30, 40, AbstractState::Live, at(18, 0)),
            game(3, 50, 60, AbstractState::Live, at(19, 0)),
        ];
        let mut state = SelectionState::live(games);

        state.navigate(-1);
        assert_eq!(state.current_game_pk(), Some(3));
        state.navigate(1);
        assert_eq!(state.current_game_pk(), Some(1));
        state.navigate(1);
        assert_eq!(state.current_game_pk(), Some(2));

        let mut off = SelectionState::OffSeason;
        off.navigate(1);
        assert_eq!(off, SelectionState::OffSeason);
    }
}
