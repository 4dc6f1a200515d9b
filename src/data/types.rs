use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type TeamId = u32;
pub type GamePk = u64;
pub type PersonId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub abbreviation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbstractState {
    Preview,
    Live,
    Final,
}

impl AbstractState {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Preview" => Some(AbstractState::Preview),
            "Live" => Some(AbstractState::Live),
            "Final" => Some(AbstractState::Final),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InningHalf {
    Top,
    Bottom,
}

impl InningHalf {
    pub fn arrow(&self) -> &'static str {
        match self {
            InningHalf::Top => "▲",
            InningHalf::Bottom => "▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub full_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Base {
    First,
    Second,
    Third,
}

impl Base {
    pub fn label(&self) -> &'static str {
        match self {
            Base::First => "1st",
            Base::Second => "2nd",
            Base::Third => "3rd",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bases {
    pub first: Option<Person>,
    pub second: Option<Person>,
    pub third: Option<Person>,
}

impl Bases {
    pub fn runner(&self, base: Base) -> Option<&Person> {
        match base {
            Base::First => self.first.as_ref(),
            Base::Second => self.second.as_ref(),
            Base::Third => self.third.as_ref(),
        }
    }
}

/// In-progress state of a game as embedded in the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineScore {
    pub inning_ordinal: Option<String>,
    pub half: InningHalf,
    pub outs: u8,
    pub balls: u8,
    pub strikes: u8,
    pub bases: Bases,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub wins: u32,
    pub losses: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamLine {
    pub team: Team,
    pub score: Option<u32>,
    pub record: Option<Record>,
    pub series_wins: Option<u32>,
    pub is_winner: Option<bool>,
}

/// One scheduled game as reported by a schedule poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub game_pk: GamePk,
    pub away: TeamLine,
    pub home: TeamLine,
    pub state: AbstractState,
    pub start_time: DateTime<Utc>,
    pub linescore: Option<LineScore>,
}

impl GameSummary {
    pub fn involves(&self, team_id: TeamId) -> bool {
        self.away.team.id == team_id || self.home.team.id == team_id
    }

    pub fn is_live(&self) -> bool {
        self.state == AbstractState::Live
    }
}

/// All games for one calendar day. `upcoming` is only filled when `games` is empty
/// and holds the first later day (inside the lookahead window) that has games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    pub date: NaiveDate,
    pub games: Vec<GameSummary>,
    #[serde(default)]
    pub upcoming: Vec<GameSummary>,
}

impl ScheduleSnapshot {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            games: Vec::new(),
            upcoming: Vec::new(),
        }
    }

    pub fn game(&self, game_pk: GamePk) -> Option<&GameSummary> {
        self.games.iter().find(|g| g.game_pk == game_pk)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
    Switch,
}

impl Handedness {
    pub fn from_bat_side(code: &str) -> Option<Self> {
        match code {
            "L" => Some(Handedness::Left),
            "R" => Some(Handedness::Right),
            "S" => Some(Handedness::Switch),
            _ => None,
        }
    }

    pub fn from_pitch_hand(code: &str) -> Option<Self> {
        match code {
            "L" => Some(Handedness::Left),
            "R" => Some(Handedness::Right),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Handedness::Left => "Left",
            Handedness::Right => "Right",
            Handedness::Switch => "Switch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchCall {
    Ball,
    Strike,
    Other,
}

impl PitchCall {
    pub fn classify(description: &str) -> Self {
        if description.contains("Ball") {
            PitchCall::Ball
        } else if description.contains("Strike") || description.contains("Foul") {
            PitchCall::Strike
        } else {
            PitchCall::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchLocation {
    pub px: f64,
    pub pz: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pitch {
    pub pitch_type: Option<String>,
    pub description: Option<String>,
    pub call: PitchCall,
    pub start_speed: Option<f64>,
    pub location: Option<PitchLocation>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Count {
    pub balls: u8,
    pub strikes: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Play {
    pub batter: Option<Person>,
    pub pitcher: Option<Person>,
    pub bat_side: Option<Handedness>,
    pub pitch_hand: Option<Handedness>,
    pub pitches: Vec<Pitch>,
    pub count: Count,
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattingLine {
    pub avg: String,
    pub home_runs: Option<u32>,
    pub rbi: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitchingLine {
    pub era: String,
    pub wins: Option<u32>,
    pub losses: Option<u32>,
    pub strike_outs: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerEntry {
    pub person: Person,
    pub jersey_number: Option<String>,
    pub batting: Option<BattingLine>,
    pub pitching: Option<PitchingLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxTeam {
    pub batting_order: Vec<PersonId>,
    pub players: HashMap<PersonId, PlayerEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxScore {
    pub away: BoxTeam,
    pub home: BoxTeam,
}

impl BoxScore {
    /// Away roster first, then home.
    pub fn player(&self, id: PersonId) -> Option<&PlayerEntry> {
        self.away.players.get(&id).or_else(|| self.home.players.get(&id))
    }

    pub fn batting_team(&self, half: InningHalf) -> &BoxTeam {
        match half {
            InningHalf::Top => &self.away,
            InningHalf::Bottom => &self.home,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesInfo {
    pub description: Option<String>,
    pub game_number: Option<u32>,
}

/// Full live feed for one game. Replaced wholesale on every detail poll.
#[derive(Debug, Clone, PartialEq)]
pub struct GameDetail {
    pub game_pk: GamePk,
    pub series: SeriesInfo,
    pub linescore: LineScore,
    pub away_record: Option<Record>,
    pub home_record: Option<Record>,
    pub current_play: Option<Play>,
    pub last_play: Option<Play>,
    pub boxscore: BoxScore,
}

/// Standings splits for one team. Missing upstream fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamStanding {
    pub team_id: TeamId,
    pub wins: Option<u32>,
    pub losses: Option<u32>,
    pub pct: Option<String>,
    pub home: Option<Record>,
    pub away: Option<Record>,
    pub games_back: Option<String>,
    pub last_ten: Option<Record>,
}
