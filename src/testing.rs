//! Fixtures shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use futures::future::{self, BoxFuture, FutureExt};

use crate::data::stats_api::StatsSource;
use crate::data::types::{
    AbstractState, Bases, BoxScore, GameDetail, GamePk, GameSummary, InningHalf, LineScore,
    Person, ScheduleSnapshot, SeriesInfo, Team, TeamId, TeamLine, TeamStanding,
};

pub fn game_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
}

pub fn team(id: TeamId) -> Team {
    Team {
        id,
        name: format!("Team {}", id),
        abbreviation: format!("T{}", id),
    }
}

fn team_line(id: TeamId) -> TeamLine {
    TeamLine {
        team: team(id),
        score: Some(0),
        record: None,
        series_wins: None,
        is_winner: None,
    }
}

pub fn linescore() -> LineScore {
    LineScore {
        inning_ordinal: Some("5th".to_string()),
        half: InningHalf::Top,
        outs: 1,
        balls: 2,
        strikes: 1,
        bases: Bases::default(),
    }
}

pub fn game(
    game_pk: GamePk,
    away: TeamId,
    home: TeamId,
    state: AbstractState,
    start_time: DateTime<Utc>,
) -> GameSummary {
    GameSummary {
        game_pk,
        away: team_line(away),
        home: team_line(home),
        state,
        start_time,
        linescore: (state == AbstractState::Live).then(linescore),
    }
}

pub fn snapshot(games: Vec<GameSummary>) -> ScheduleSnapshot {
    ScheduleSnapshot {
        date: game_day(),
        games,
        upcoming: Vec::new(),
    }
}

pub fn detail(game_pk: GamePk) -> GameDetail {
    GameDetail {
        game_pk,
        series: SeriesInfo {
            description: None,
            game_number: None,
        },
        linescore: linescore(),
        away_record: None,
        home_record: None,
        current_play: None,
        last_play: None,
        boxscore: BoxScore::default(),
    }
}

pub fn person(id: u64, name: &str) -> Person {
    Person {
        id,
        full_name: name.to_string(),
    }
}

/// In-memory [`StatsSource`] with scripted responses and call counters.
#[derive(Default)]
pub struct ScriptedSource {
    schedules: Mutex<HashMap<NaiveDate, Vec<GameSummary>>>,
    details: Mutex<HashMap<GamePk, GameDetail>>,
    teams: Mutex<Vec<Team>>,
    standings: Mutex<Vec<TeamStanding>>,
    failing: AtomicBool,
    schedule_calls: AtomicUsize,
    teams_calls: AtomicUsize,
    detail_calls: Mutex<Vec<GamePk>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_schedule(&self, date: NaiveDate, games: Vec<GameSummary>) {
        self.schedules.lock().unwrap().insert(date, games);
    }

    pub fn set_detail(&self, detail: GameDetail) {
        self.details.lock().unwrap().insert(detail.game_pk, detail);
    }

    pub fn set_teams(&self, teams: Vec<Team>) {
        *self.teams.lock().unwrap() = teams;
    }

    pub fn set_standings(&self, standings: Vec<TeamStanding>) {
        *self.standings.lock().unwrap() = standings;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }

    pub fn teams_calls(&self) -> usize {
        self.teams_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> Vec<GamePk> {
        self.detail_calls.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(anyhow!("scripted upstream failure"))
        } else {
            Ok(())
        }
    }
}

impl StatsSource for ScriptedSource {
    fn schedule(&self, date: NaiveDate) -> BoxFuture<'_, Result<ScheduleSnapshot>> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.check().map(|_| ScheduleSnapshot {
            date,
            games: self
                .schedules
                .lock()
                .unwrap()
                .get(&date)
                .cloned()
                .unwrap_or_default(),
            upcoming: Vec::new(),
        });
        future::ready(result).boxed()
    }

    fn game_detail(&self, game_pk: GamePk) -> BoxFuture<'_, Result<GameDetail>> {
        self.detail_calls.lock().unwrap().push(game_pk);
        let result = self.check().and_then(|_| {
            self.details
                .lock()
                .unwrap()
                .get(&game_pk)
                .cloned()
                .ok_or_else(|| anyhow!("no feed for game {}", game_pk))
        });
        future::ready(result).boxed()
    }

    fn teams(&self) -> BoxFuture<'_, Result<Vec<Team>>> {
        self.teams_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.check().map(|_| self.teams.lock().unwrap().clone());
        future::ready(result).boxed()
    }

    fn standings(&self, _season: i32) -> BoxFuture<'_, Result<Vec<TeamStanding>>> {
        let result = self.check().map(|_| self.standings.lock().unwrap().clone());
        future::ready(result).boxed()
    }
}
