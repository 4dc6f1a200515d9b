use chrono::FixedOffset;

use crate::data::images::ImageUrls;
use crate::data::types::{GamePk, GameSummary, Team, TeamId, TeamLine, TeamStanding};
use crate::display::{or_placeholder, record_text};
use crate::selection::types::FavoriteSet;

fn league_record(line: &TeamLine) -> String {
    let record = line.record.unwrap_or_default();
    format!("{}-{}", record.wins, record.losses)
}

pub fn next_game(game: &GameSummary, offset: &FixedOffset) -> String {
    let local = game.start_time.with_timezone(offset);

    format!(
        "Next Game\n{} ({})\n  at\n{} ({})\n{}\n{}\n",
        game.away.team.name,
        league_record(&game.away),
        game.home.team.name,
        league_record(&game.home),
        local.format("%-I:%M %p"),
        local.format("%A, %B %-d")
    )
}

pub fn recent_scores(games: &[GameSummary]) -> String {
    if games.is_empty() {
        return "No games to show today\n".to_string();
    }

    let rows: String = games
        .iter()
        .map(|game| {
            format!(
                "{:<4} {:>2}{}  {:<4} {:>2}{}  Final\n",
                game.away.team.abbreviation,
                or_placeholder(game.away.score),
                winner_mark(&game.away),
                game.home.team.abbreviation,
                or_placeholder(game.home.score),
                winner_mark(&game.home),
            )
        })
        .collect();
    format!("Recent Scores\n{}", rows)
}

fn winner_mark(line: &TeamLine) -> &'static str {
    if line.is_winner == Some(true) {
        " *"
    } else {
        "  "
    }
}

pub fn off_season() -> String {
    "Off Season\nNo games scheduled in the coming week. See you next season!\n".to_string()
}

/// Live games other than `shown`, as pickable `watch` targets.
pub fn other_live_games(games: &[GameSummary], shown: Option<GamePk>) -> String {
    let others: Vec<&GameSummary> = games
        .iter()
        .filter(|g| g.is_live() && Some(g.game_pk) != shown)
        .collect();
    if others.is_empty() {
        return String::new();
    }

    let rows: String = others
        .into_iter()
        .map(|game| {
            let inning = game
                .linescore
                .as_ref()
                .map(|ls| format!("{} {}", ls.half.arrow(), ls.inning_ordinal.as_deref().unwrap_or("-")))
                .unwrap_or_default();
            format!(
                "[{}] {} {} - {} {}  {}\n",
                game.game_pk,
                game.away.team.abbreviation,
                or_placeholder(game.away.score),
                game.home.team.abbreviation,
                or_placeholder(game.home.score),
                inning
            )
        })
        .collect();
    format!("Other Live Games\n{}", rows)
}

pub fn teams_list(teams: &[Team], favorites: &FavoriteSet) -> String {
    if teams.is_empty() {
        return "Loading teams...\n".to_string();
    }

    teams
        .iter()
        .map(|team| {
            let star = if favorites.contains(team.id) { "*" } else { " " };
            format!("{} {:>4}  {:<4} {}\n", star, team.id, team.abbreviation, team.name)
        })
        .collect()
}

/// "Favorites: NYY, 999" using the catalog when it knows the team.
pub fn favorites_line(favorites: &FavoriteSet, teams: &[Team]) -> String {
    if favorites.is_empty() {
        return "Favorites: none (use `fav <teamId>`)".to_string();
    }

    let names: Vec<String> = favorites
        .ids()
        .iter()
        .map(|id| {
            teams
                .iter()
                .find(|t| t.id == *id)
                .map(|t| t.abbreviation.clone())
                .unwrap_or_else(|| id.to_string())
        })
        .collect();
    format!("Favorites: {}", names.join(", "))
}

/// One row per followed team with its logo.
pub fn followed_teams(favorites: &FavoriteSet, teams: &[Team], images: &ImageUrls) -> String {
    let rows: String = favorites
        .ids()
        .iter()
        .map(|id| {
            let name = teams
                .iter()
                .find(|t| t.id == *id)
                .map(|t| t.name.as_str())
                .unwrap_or("Unknown team");
            format!("  {:>4}  {:<24} {}\n", id, name, images.team_logo(*id))
        })
        .collect();
    format!("{}\n{}", favorites_line(favorites, teams), rows)
}

pub fn standings_card(team_id: TeamId, team_name: Option<&str>, standing: &TeamStanding) -> String {
    format!(
        "{}\nW {}  L {}  PCT {}  GB {}\nHome {}  Away {}  Last 10 {}\n",
        team_name.map(str::to_string).unwrap_or_else(|| team_id.to_string()),
        or_placeholder(standing.wins),
        or_placeholder(standing.losses),
        standing.pct.as_deref().unwrap_or(".000"),
        standing.games_back.as_deref().unwrap_or("-"),
        record_text(standing.home.as_ref()),
        record_text(standing.away.as_ref()),
        record_text(standing.last_ten.as_ref())
    )
}
