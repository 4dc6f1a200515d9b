use std::fmt;

use crate::data::types::{Base, Bases, GameDetail, GameSummary, TeamLine};
use crate::display::{or_placeholder, record_text};
use crate::viewer::tooltip::RunnerCard;

/// "Game 3 (NYY leads 2-0)", "Game 4 (Series tied 2-2)" or "Game 1".
pub fn series_status(game_number: Option<u32>, away: &TeamLine, home: &TeamLine) -> Option<String> {
    let number = game_number?;
    let away_wins = away.series_wins.unwrap_or(0);
    let home_wins = home.series_wins.unwrap_or(0);

    let status = if away_wins == 0 && home_wins == 0 {
        format!("Game {}", number)
    } else if away_wins > home_wins {
        format!("Game {} ({} leads {}-{})", number, away.team.abbreviation, away_wins, home_wins)
    } else if home_wins > away_wins {
        format!("Game {} ({} leads {}-{})", number, home.team.abbreviation, home_wins, away_wins)
    } else {
        format!("Game {} (Series tied {}-{})", number, away_wins, home_wins)
    };
    Some(status)
}

struct Scoreboard<'a> {
    game: &'a GameSummary,
    detail: Option<&'a GameDetail>,
}

impl fmt::Display for Scoreboard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let game = self.game;

        if let Some(detail) = self.detail {
            if let Some(description) = &detail.series.description {
                writeln!(f, "{}", description)?;
            }
            if let Some(status) = series_status(detail.series.game_number, &game.away, &game.home) {
                writeln!(f, "{}", status)?;
            }
        }

        let away_record = self
            .detail
            .and_then(|d| d.away_record.as_ref())
            .or(game.away.record.as_ref());
        let home_record = self
            .detail
            .and_then(|d| d.home_record.as_ref())
            .or(game.home.record.as_ref());

        writeln!(
            f,
            "{:<28} {:>7} {:>3}",
            game.away.team.name,
            record_text(away_record),
            or_placeholder(game.away.score)
        )?;
        writeln!(
            f,
            "{:<28} {:>7} {:>3}",
            game.home.team.name,
            record_text(home_record),
            or_placeholder(game.home.score)
        )?;

        let linescore = self.detail.map(|d| &d.linescore).or(game.linescore.as_ref());
        if let Some(ls) = linescore {
            writeln!(
                f,
                "Inning {} {}   Outs {}   Count {}-{}",
                ls.half.arrow(),
                ls.inning_ordinal.as_deref().unwrap_or("-"),
                ls.outs,
                ls.balls,
                ls.strikes
            )?;
        }
        Ok(())
    }
}

/// Team rows, inning, outs and count. Detail data wins over the schedule copy when present.
pub fn scoreboard(game: &GameSummary, detail: Option<&GameDetail>) -> String {
    Scoreboard { game, detail }.to_string()
}

/// Occupied bases are filled diamonds, runners listed underneath.
pub fn diamond(bases: &Bases) -> String {
    let mark = |base| if bases.runner(base).is_some() { '◆' } else { '◇' };

    let runners: String = [Base::First, Base::Second, Base::Third]
        .into_iter()
        .filter_map(|base| {
            bases
                .runner(base)
                .map(|runner| format!("{}: {}\n", base.label(), runner.full_name))
        })
        .collect();

    format!(
        "      {}\n  {}       {}\n      ⌂\n{}",
        mark(Base::Second),
        mark(Base::Third),
        mark(Base::First),
        runners
    )
}

pub fn runner_card(card: &RunnerCard) -> String {
    let jersey = card
        .jersey_number
        .as_ref()
        .map(|number| format!(" #{}", number))
        .unwrap_or_default();
    let batting = match &card.batting {
        Some(b) => format!(
            "AVG {}  HR {}  RBI {}",
            b.avg,
            or_placeholder(b.home_runs),
            or_placeholder(b.rbi)
        ),
        None => "AVG -  HR -  RBI -".to_string(),
    };

    format!(
        "[{}] {}{}\n{}\n{}\n",
        card.base.label(),
        card.runner.full_name,
        jersey,
        batting,
        card.headshot_url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::{AbstractState, BattingLine, Record};
    use crate::testing::{at, detail, game, person};

    fn lines(away_wins: Option<u32>, home_wins: Option<u32>) -> (TeamLine, TeamLine) {
        let mut g = game(1, 147, 111, AbstractState::Live, at(17, 0));
        g.away.series_wins = away_wins;
        g.home.series_wins = home_wins;
        (g.away, g.home)
    }

    #[test]
    fn test_series_status() {
        let (away, home) = lines(Some(2), Some(0));
        assert_eq!(series_status(Some(3), &away, &home).unwrap(), "Game 3 (T147 leads 2-0)");

        let (away, home) = lines(Some(1), Some(3));
        assert_eq!(series_status(Some(5), &away, &home).unwrap(), "Game 5 (T111 leads 3-1)");

        let (away, home) = lines(Some(2), Some(2));
        assert_eq!(series_status(Some(5), &away, &home).unwrap(), "Game 5 (Series tied 2-2)");

        let (away, home) = lines(None, None);
        assert_eq!(series_status(Some(1), &away, &home).unwrap(), "Game 1");
        assert_eq!(series_status(None, &away, &home), None);
    }

    #[test]
    fn test_scoreboard_prefers_detail() {
        let mut g = game(1, 147, 111, AbstractState::Live, at(17, 0));
        g.away.score = Some(3);
        g.home.score = None;
        let mut d = detail(1);
        d.away_record = Some(Record { wins: 40, losses: 20 });
        d.linescore.inning_ordinal = Some("9th".to_string());

        let text = scoreboard(&g, Some(&d));
        assert!(text.contains("Team 147"));
        assert!(text.contains("40-20"));
        assert!(text.contains("Inning ▲ 9th"));
        // Missing score and record render as placeholders
        let home_row = text.lines().find(|l| l.starts_with("Team 111")).unwrap();
        assert!(home_row.trim_end().ends_with('-'));
    }

    #[test]
    fn test_diamond_marks_runners() {
        let bases = Bases {
            first: Some(person(1, "Aaron Judge")),
            second: None,
            third: Some(person(3, "Juan Soto")),
        };
        let text = diamond(&bases);
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[0].trim(), "◇");
        assert_eq!(rows[1].trim(), "◆       ◆");
        assert!(text.contains("1st: Aaron Judge"));
        assert!(text.contains("3rd: Juan Soto"));
    }

    #[test]
    fn test_runner_card_text() {
        let card = RunnerCard {
            base: Base::Second,
            runner: person(9, "Gleyber Torres"),
            jersey_number: Some("25".to_string()),
            batting: Some(BattingLine {
                avg: ".257".to_string(),
                home_runs: Some(12),
                rbi: None,
            }),
            headshot_url: "https://img.test/9".to_string(),
        };
        let text = runner_card(&card);
        assert!(text.starts_with("[2nd] Gleyber Torres #25"));
        assert!(text.contains("AVG .257  HR 12  RBI -"));
    }
}
