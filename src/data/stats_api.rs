use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::data::types::{
    AbstractState, Bases, BattingLine, BoxScore, BoxTeam, Count, GameDetail, GamePk,
    GameSummary, Handedness, InningHalf, LineScore, Person, PersonId, Pitch, PitchCall,
    PitchLocation, PitchingLine, Play, PlayerEntry, Record, ScheduleSnapshot, SeriesInfo,
    Team, TeamId, TeamLine, TeamStanding,
};

const SCHEDULE_HYDRATE: &str = "game(content(summary)),linescore,team";
const STANDINGS_LEAGUES: &str = "103,104";

/// Everything the viewer pulls from upstream. Implemented by [`StatsApiClient`] and by
/// scripted sources in tests.
pub trait StatsSource: Send + Sync + 'static {
    fn schedule(&self, date: NaiveDate) -> BoxFuture<'_, Result<ScheduleSnapshot>>;
    fn game_detail(&self, game_pk: GamePk) -> BoxFuture<'_, Result<GameDetail>>;
    fn teams(&self) -> BoxFuture<'_, Result<Vec<Team>>>;
    fn standings(&self, season: i32) -> BoxFuture<'_, Result<Vec<TeamStanding>>>;
}

pub struct StatsApiClient {
    client: Client,
    base_url: String,
    sport_id: u32,
}

// ---------------------------------------------------------------------------
// Raw upstream payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawScheduleResponse {
    #[serde(default)]
    dates: Vec<RawScheduleDate>,
}

#[derive(Debug, Deserialize)]
struct RawScheduleDate {
    #[serde(default)]
    games: Vec<RawGame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGame {
    game_pk: GamePk,
    game_date: String,
    status: RawStatus,
    teams: RawGameTeams,
    #[serde(default)]
    linescore: Option<RawLineScore>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStatus {
    #[serde(default)]
    abstract_game_state: String,
}

#[derive(Debug, Deserialize)]
struct RawGameTeams {
    away: RawGameTeam,
    home: RawGameTeam,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGameTeam {
    team: RawTeamRef,
    #[serde(default)]
    score: Option<u32>,
    #[serde(default)]
    league_record: Option<RawRecord>,
    #[serde(default)]
    series_number: Option<u32>,
    #[serde(default)]
    is_winner: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTeamRef {
    id: TeamId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    abbreviation: Option<String>,
    #[serde(default)]
    team_code: Option<String>,
    #[serde(default)]
    sport: Option<RawSport>,
}

#[derive(Debug, Deserialize)]
struct RawSport {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    wins: Option<u32>,
    #[serde(default)]
    losses: Option<u32>,
    #[serde(default)]
    pct: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLineScore {
    #[serde(default)]
    current_inning_ordinal: Option<String>,
    #[serde(default)]
    is_top_inning: Option<bool>,
    #[serde(default)]
    outs: Option<u8>,
    #[serde(default)]
    balls: Option<u8>,
    #[serde(default)]
    strikes: Option<u8>,
    #[serde(default)]
    offense: Option<RawOffense>,
    #[serde(default)]
    teams: Option<RawLineScoreTeams>,
}

#[derive(Debug, Deserialize)]
struct RawOffense {
    #[serde(default)]
    first: Option<RawPerson>,
    #[serde(default)]
    second: Option<RawPerson>,
    #[serde(default)]
    third: Option<RawPerson>,
}

#[derive(Debug, Deserialize)]
struct RawLineScoreTeams {
    #[serde(default)]
    away: Option<RawRecord>,
    #[serde(default)]
    home: Option<RawRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPerson {
    id: PersonId,
    #[serde(default)]
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTeamsResponse {
    #[serde(default)]
    teams: Vec<RawTeamRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLiveFeed {
    #[serde(default)]
    game_pk: Option<GamePk>,
    #[serde(default)]
    game_data: Option<RawGameData>,
    live_data: RawLiveData,
}

#[derive(Debug, Deserialize)]
struct RawGameData {
    #[serde(default)]
    game: Option<RawGameInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGameInfo {
    #[serde(default)]
    series_description: Option<String>,
    #[serde(default)]
    series_game_number: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawLiveData {
    #[serde(default)]
    plays: Option<RawPlays>,
    #[serde(default)]
    boxscore: Option<RawBoxScore>,
    #[serde(default)]
    linescore: Option<RawLineScore>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlays {
    #[serde(default)]
    current_play: Option<RawPlay>,
    #[serde(default)]
    all_plays: Vec<RawPlay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlay {
    #[serde(default)]
    matchup: Option<RawMatchup>,
    #[serde(default)]
    play_events: Vec<RawPlayEvent>,
    #[serde(default)]
    count: Option<RawCount>,
    #[serde(default)]
    result: Option<RawDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMatchup {
    #[serde(default)]
    batter: Option<RawPerson>,
    #[serde(default)]
    pitcher: Option<RawPerson>,
    #[serde(default)]
    bat_side: Option<RawCode>,
    #[serde(default)]
    pitch_hand: Option<RawCode>,
}

#[derive(Debug, Deserialize)]
struct RawCode {
    #[serde(default)]
    code: String,
}

#[derive(Debug, Deserialize)]
struct RawCount {
    #[serde(default)]
    balls: u8,
    #[serde(default)]
    strikes: u8,
}

#[derive(Debug, Deserialize)]
struct RawDescription {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlayEvent {
    #[serde(default)]
    is_pitch: bool,
    #[serde(default)]
    details: Option<RawPitchDetails>,
    #[serde(default)]
    pitch_data: Option<RawPitchData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPitchDetails {
    #[serde(default)]
    call: Option<RawDescription>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "type")]
    pitch_type: Option<RawDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPitchData {
    #[serde(default)]
    start_speed: Option<f64>,
    #[serde(default)]
    coordinates: Option<RawCoordinates>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawCoordinates {
    #[serde(default)]
    pX: Option<f64>,
    #[serde(default)]
    pZ: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawBoxScore {
    #[serde(default)]
    teams: Option<RawBoxTeams>,
}

#[derive(Debug, Deserialize)]
struct RawBoxTeams {
    #[serde(default)]
    away: Option<RawBoxTeam>,
    #[serde(default)]
    home: Option<RawBoxTeam>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBoxTeam {
    #[serde(default)]
    batting_order: Vec<PersonId>,
    #[serde(default)]
    players: HashMap<String, RawBoxPlayer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBoxPlayer {
    person: RawPerson,
    #[serde(default)]
    jersey_number: Option<String>,
    #[serde(default)]
    season_stats: Option<RawSeasonStats>,
}

#[derive(Debug, Deserialize)]
struct RawSeasonStats {
    #[serde(default)]
    batting: Option<RawBatting>,
    #[serde(default)]
    pitching: Option<RawPitching>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBatting {
    #[serde(default)]
    avg: Option<String>,
    #[serde(default)]
    home_runs: Option<u32>,
    #[serde(default)]
    rbi: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPitching {
    #[serde(default)]
    era: Option<String>,
    #[serde(default)]
    wins: Option<u32>,
    #[serde(default)]
    losses: Option<u32>,
    #[serde(default)]
    strike_outs: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawStandingsResponse {
    #[serde(default)]
    records: Vec<RawStandingsDivision>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStandingsDivision {
    #[serde(default)]
    team_records: Vec<RawTeamRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTeamRecord {
    team: RawTeamRef,
    #[serde(default)]
    league_record: Option<RawRecord>,
    #[serde(default)]
    games_back: Option<String>,
    #[serde(default)]
    records: Option<RawSplitRecords>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSplitRecords {
    #[serde(default)]
    split_records: Vec<RawSplitRecord>,
}

#[derive(Debug, Deserialize)]
struct RawSplitRecord {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    wins: u32,
    #[serde(default)]
    losses: u32,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl StatsApiClient {
    pub fn new(base_url: &str, sport_id: u32, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("diamondwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            sport_id,
        })
    }

    /// Fetch one day of the schedule. A day without games yields an empty snapshot.
    pub async fn fetch_schedule(&self, date: NaiveDate) -> Result<ScheduleSnapshot> {
        let url = format!(
            "{}/v1/schedule?sportId={}&date={}&hydrate={}",
            self.base_url,
            self.sport_id,
            date.format("%Y-%m-%d"),
            SCHEDULE_HYDRATE
        );

        let response: RawScheduleResponse = self.get_json(&url).await?;
        Ok(convert_schedule(date, response))
    }

    /// Fetch the live feed for a single game
    pub async fn fetch_game_detail(&self, game_pk: GamePk) -> Result<GameDetail> {
        let url = format!("{}/v1.1/game/{}/feed/live", self.base_url, game_pk);

        let feed: RawLiveFeed = self.get_json(&url).await?;
        Ok(convert_live_feed(game_pk, feed))
    }

    /// Fetch the league's team catalog, sorted by name
    pub async fn fetch_teams(&self) -> Result<Vec<Team>> {
        let url = format!("{}/v1/teams?sportId={}", self.base_url, self.sport_id);

        let response: RawTeamsResponse = self.get_json(&url).await?;
        Ok(convert_teams(response, self.sport_id))
    }

    pub async fn fetch_standings(&self, season: i32) -> Result<Vec<TeamStanding>> {
        let url = format!(
            "{}/v1/standings?leagueId={}&season={}&standingsTypes=regularSeason",
            self.base_url, STANDINGS_LEAGUES, season
        );

        let response: RawStandingsResponse = self.get_json(&url).await?;
        Ok(convert_standings(response))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url, "GET");

        self.client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?
            .error_for_status()
            .with_context(|| format!("Upstream returned an error for {}", url))?
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }
}

impl StatsSource for StatsApiClient {
    fn schedule(&self, date: NaiveDate) -> BoxFuture<'_, Result<ScheduleSnapshot>> {
        self.fetch_schedule(date).boxed()
    }

    fn game_detail(&self, game_pk: GamePk) -> BoxFuture<'_, Result<GameDetail>> {
        self.fetch_game_detail(game_pk).boxed()
    }

    fn teams(&self) -> BoxFuture<'_, Result<Vec<Team>>> {
        self.fetch_teams().boxed()
    }

    fn standings(&self, season: i32) -> BoxFuture<'_, Result<Vec<TeamStanding>>> {
        self.fetch_standings(season).boxed()
    }
}

/// Standing for one team; every field empty when the team is missing.
pub fn standing_for(standings: &[TeamStanding], team_id: TeamId) -> TeamStanding {
    standings
        .iter()
        .find(|s| s.team_id == team_id)
        .cloned()
        .unwrap_or_else(|| TeamStanding {
            team_id,
            ..TeamStanding::default()
        })
}

// ---------------------------------------------------------------------------
// Conversion into domain types
// ---------------------------------------------------------------------------

fn convert_schedule(date: NaiveDate, response: RawScheduleResponse) -> ScheduleSnapshot {
    let games = response
        .dates
        .into_iter()
        .next()
        .map(|day| day.games.into_iter().filter_map(convert_game).collect())
        .unwrap_or_default();

    ScheduleSnapshot {
        date,
        games,
        upcoming: Vec::new(),
    }
}

fn convert_game(raw: RawGame) -> Option<GameSummary> {
    let Some(state) = AbstractState::parse(&raw.status.abstract_game_state) else {
        debug!(game_pk = raw.game_pk, state = %raw.status.abstract_game_state, "Skipping game with unknown state");
        return None;
    };

    let start_time = match DateTime::parse_from_rfc3339(&raw.game_date) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(e) => {
            debug!(game_pk = raw.game_pk, error = %e, "Skipping game with unparsable start time");
            return None;
        }
    };

    Some(GameSummary {
        game_pk: raw.game_pk,
        away: convert_team_line(raw.teams.away),
        home: convert_team_line(raw.teams.home),
        state,
        start_time,
        linescore: raw.linescore.map(convert_linescore),
    })
}

fn convert_team_ref(raw: RawTeamRef) -> Team {
    let name = raw.name.unwrap_or_else(|| format!("Team {}", raw.id));
    let abbreviation = raw
        .abbreviation
        .or(raw.team_code.map(|c| c.to_uppercase()))
        .unwrap_or_else(|| "---".to_string());

    Team {
        id: raw.id,
        name,
        abbreviation,
    }
}

fn convert_team_line(raw: RawGameTeam) -> TeamLine {
    TeamLine {
        team: convert_team_ref(raw.team),
        score: raw.score,
        record: raw.league_record.and_then(convert_record),
        series_wins: raw.series_number,
        is_winner: raw.is_winner,
    }
}

fn convert_record(raw: RawRecord) -> Option<Record> {
    Some(Record {
        wins: raw.wins?,
        losses: raw.losses?,
    })
}

fn convert_person(raw: RawPerson) -> Person {
    Person {
        id: raw.id,
        full_name: raw.full_name.unwrap_or_else(|| "Unknown".to_string()),
    }
}

fn convert_linescore(raw: RawLineScore) -> LineScore {
    let offense = raw.offense;
    let bases = match offense {
        Some(o) => Bases {
            first: o.first.map(convert_person),
            second: o.second.map(convert_person),
            third: o.third.map(convert_person),
        },
        None => Bases::default(),
    };

    LineScore {
        inning_ordinal: raw.current_inning_ordinal,
        half: if raw.is_top_inning.unwrap_or(true) {
            InningHalf::Top
        } else {
            InningHalf::Bottom
        },
        outs: raw.outs.unwrap_or(0),
        balls: raw.balls.unwrap_or(0),
        strikes: raw.strikes.unwrap_or(0),
        bases,
    }
}

fn convert_live_feed(requested: GamePk, feed: RawLiveFeed) -> GameDetail {
    let series = feed
        .game_data
        .and_then(|d| d.game)
        .map(|g| SeriesInfo {
            description: g.series_description.filter(|s| !s.is_empty()),
            game_number: g.series_game_number,
        })
        .unwrap_or(SeriesInfo {
            description: None,
            game_number: None,
        });

    let live = feed.live_data;
    let mut raw_linescore = live.linescore.unwrap_or_default();
    let (away_record, home_record) = match raw_linescore.teams.take() {
        Some(teams) => (
            teams.away.and_then(convert_record),
            teams.home.and_then(convert_record),
        ),
        None => (None, None),
    };

    let (current_play, last_play) = match live.plays {
        Some(plays) => {
            let last = plays.all_plays.into_iter().last().map(convert_play);
            (plays.current_play.map(convert_play), last)
        }
        None => (None, None),
    };

    let boxscore = live
        .boxscore
        .and_then(|b| b.teams)
        .map(|teams| BoxScore {
            away: teams.away.map(convert_box_team).unwrap_or_default(),
            home: teams.home.map(convert_box_team).unwrap_or_default(),
        })
        .unwrap_or_default();

    GameDetail {
        game_pk: feed.game_pk.unwrap_or(requested),
        series,
        linescore: convert_linescore(raw_linescore),
        away_record,
        home_record,
        current_play,
        last_play,
        boxscore,
    }
}

fn convert_play(raw: RawPlay) -> Play {
    let (batter, pitcher, bat_side, pitch_hand) = match raw.matchup {
        Some(m) => (
            m.batter.map(convert_person),
            m.pitcher.map(convert_person),
            m.bat_side.and_then(|c| Handedness::from_bat_side(&c.code)),
            m.pitch_hand.and_then(|c| Handedness::from_pitch_hand(&c.code)),
        ),
        None => (None, None, None, None),
    };

    let pitches = raw
        .play_events
        .into_iter()
        .filter(|e| e.is_pitch)
        .map(convert_pitch)
        .collect();

    Play {
        batter,
        pitcher,
        bat_side,
        pitch_hand,
        pitches,
        count: raw
            .count
            .map(|c| Count {
                balls: c.balls,
                strikes: c.strikes,
            })
            .unwrap_or_default(),
        result: raw.result.and_then(|r| r.description),
    }
}

fn convert_pitch(raw: RawPlayEvent) -> Pitch {
    let (call, pitch_type, description) = match raw.details {
        Some(d) => (
            d.call.and_then(|c| c.description),
            d.pitch_type.and_then(|t| t.description),
            d.description,
        ),
        None => (None, None, None),
    };

    let (start_speed, location) = match raw.pitch_data {
        Some(data) => {
            let location = data.coordinates.and_then(|c| match (c.pX, c.pZ) {
                (Some(px), Some(pz)) => Some(PitchLocation { px, pz }),
                _ => None,
            });
            (data.start_speed, location)
        }
        None => (None, None),
    };

    Pitch {
        pitch_type,
        description,
        call: PitchCall::classify(call.as_deref().unwrap_or("")),
        start_speed,
        location,
    }
}

fn convert_box_team(raw: RawBoxTeam) -> BoxTeam {
    let players = raw
        .players
        .into_values()
        .map(|p| {
            let (batting, pitching) = match p.season_stats {
                Some(stats) => (
                    stats.batting.map(|b| BattingLine {
                        avg: b.avg.unwrap_or_else(|| ".000".to_string()),
                        home_runs: b.home_runs,
                        rbi: b.rbi,
                    }),
                    stats.pitching.map(|pitching| PitchingLine {
                        era: pitching.era.unwrap_or_else(|| "-.--".to_string()),
                        wins: pitching.wins,
                        losses: pitching.losses,
                        strike_outs: pitching.strike_outs,
                    }),
                ),
                None => (None, None),
            };

            let person = convert_person(p.person);
            (
                person.id,
                PlayerEntry {
                    person,
                    jersey_number: p.jersey_number,
                    batting,
                    pitching,
                },
            )
        })
        .collect();

    BoxTeam {
        batting_order: raw.batting_order,
        players,
    }
}

fn convert_teams(response: RawTeamsResponse, sport_id: u32) -> Vec<Team> {
    let mut teams: Vec<Team> = response
        .teams
        .into_iter()
        .filter(|t| t.sport.as_ref().map(|s| s.id == sport_id).unwrap_or(false))
        .map(convert_team_ref)
        .collect();

    teams.sort_by(|a, b| a.name.cmp(&b.name));
    teams
}

fn convert_standings(response: RawStandingsResponse) -> Vec<TeamStanding> {
    response
        .records
        .into_iter()
        .flat_map(|division| division.team_records)
        .map(|record| {
            let split = |kind: &str| {
                record.records.as_ref().and_then(|r| {
                    r.split_records
                        .iter()
                        .find(|s| s.kind == kind)
                        .map(|s| Record {
                            wins: s.wins,
                            losses: s.losses,
                        })
                })
            };

            let home = split("home");
            let away = split("away");
            let last_ten = split("lastTen");
            let (wins, losses, pct) = match &record.league_record {
                Some(r) => (r.wins, r.losses, r.pct.clone()),
                None => (None, None, None),
            };

            TeamStanding {
                team_id: record.team.id,
                wins,
                losses,
                pct,
                home,
                away,
                games_back: record.games_back.clone(),
                last_ten,
            }
        })
        .collect()
}
