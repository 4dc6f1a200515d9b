use std::fmt;

use crate::data::types::{
    BoxScore, GameDetail, Handedness, Pitch, PitchCall, PitchLocation, Play, PlayerEntry,
};
use crate::display::or_placeholder;

const ZONE_COLS: usize = 13;
const ZONE_ROWS: usize = 9;

fn hand_label(hand: Option<Handedness>) -> &'static str {
    hand.map(|h| h.label()).unwrap_or("")
}

struct Players<'a> {
    play: &'a Play,
    boxscore: &'a BoxScore,
}

impl fmt::Display for Players<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let play = self.play;

        match &play.batter {
            Some(batter) => {
                write!(f, "At Bat:   {}", batter.full_name)?;
                if play.bat_side.is_some() {
                    write!(f, " (Bats: {})", hand_label(play.bat_side))?;
                }
                let line = self.boxscore.player(batter.id).and_then(|p| p.batting.as_ref());
                writeln!(
                    f,
                    "   AVG {}  HR {}  RBI {}",
                    line.map(|b| b.avg.as_str()).unwrap_or("-"),
                    or_placeholder(line.and_then(|b| b.home_runs)),
                    or_placeholder(line.and_then(|b| b.rbi))
                )?;
            }
            None => writeln!(f, "At Bat:   -")?,
        }

        match &play.pitcher {
            Some(pitcher) => {
                write!(f, "Pitching: {}", pitcher.full_name)?;
                if play.pitch_hand.is_some() {
                    write!(f, " (Throws: {})", hand_label(play.pitch_hand))?;
                }
                let line = self.boxscore.player(pitcher.id).and_then(|p| p.pitching.as_ref());
                writeln!(
                    f,
                    "   ERA {}  W-L {}-{}  SO {}",
                    line.map(|p| p.era.as_str()).unwrap_or("-"),
                    or_placeholder(line.and_then(|p| p.wins)),
                    or_placeholder(line.and_then(|p| p.losses)),
                    or_placeholder(line.and_then(|p| p.strike_outs))
                )
            }
            None => writeln!(f, "Pitching: -"),
        }
    }
}

/// At-bat and pitching lines for the play on screen.
pub fn players(play: &Play, boxscore: &BoxScore) -> String {
    Players { play, boxscore }.to_string()
}

/// The three batters after the current one, wrapping around the order. Empty when the
/// order is missing or the batter is not in it.
pub fn on_deck(detail: &GameDetail) -> Vec<&PlayerEntry> {
    let Some(batter) = detail.current_play.as_ref().and_then(|p| p.batter.as_ref()) else {
        return Vec::new();
    };

    let team = detail.boxscore.batting_team(detail.linescore.half);
    let order = &team.batting_order;
    let Some(position) = order.iter().position(|id| *id == batter.id) else {
        return Vec::new();
    };

    (1..=3)
        .map(|i| order[(position + i) % order.len()])
        .filter_map(|id| team.players.get(&id))
        .collect()
}

pub fn render_on_deck(detail: &GameDetail) -> String {
    let next = on_deck(detail);
    if next.is_empty() {
        return "On Deck\nLineup data not available\n".to_string();
    }

    let rows: String = next
        .iter()
        .enumerate()
        .map(|(i, player)| {
            format!(
                "{}. {} #{}\n",
                i + 1,
                player.person.full_name,
                player.jersey_number.as_deref().unwrap_or("-")
            )
        })
        .collect();
    format!("On Deck\n{}", rows)
}

/// Position of a pitch in the catcher's-view box, in percent. `None` outside the box.
pub fn zone_position(location: &PitchLocation) -> Option<(f64, f64)> {
    let x = (location.px + 1.5) / 3.0 * 100.0;
    let z = (1.0 - (location.pz - 1.5) / 2.0) * 100.0;

    if (0.0..=100.0).contains(&x) && (0.0..=100.0).contains(&z) {
        Some((x, z))
    } else {
        None
    }
}

/// Current play, falling back to the last completed one.
pub fn display_play(detail: &GameDetail) -> Option<(&Play, &'static str)> {
    match (&detail.current_play, &detail.last_play) {
        (Some(play), _) => Some((play, "Current Play")),
        (None, Some(play)) => Some((play, "Last Play")),
        (None, None) => None,
    }
}

fn call_mark(call: PitchCall) -> &'static str {
    match call {
        PitchCall::Ball => "ball",
        PitchCall::Strike => "strike",
        PitchCall::Other => "in play",
    }
}

/// Grid of numbered pitches. The inner box is the strike zone.
pub fn strike_zone(pitches: &[Pitch]) -> String {
    let mut grid = vec![vec![' '; ZONE_COLS]; ZONE_ROWS];

    // Zone spans the middle half in both directions
    for (row, cells) in grid.iter_mut().enumerate() {
        for (col, cell) in cells.iter_mut().enumerate() {
            let on_top_or_bottom = (row == 2 || row == 6) && (3..=9).contains(&col);
            let on_sides = (col == 3 || col == 9) && (2..=6).contains(&row);
            if on_top_or_bottom {
                *cell = '-';
            } else if on_sides {
                *cell = '|';
            }
        }
    }

    for (i, pitch) in pitches.iter().enumerate() {
        let Some((x, z)) = pitch.location.as_ref().and_then(zone_position) else {
            continue;
        };
        let col = (x / 100.0 * (ZONE_COLS - 1) as f64).round() as usize;
        let row = (z / 100.0 * (ZONE_ROWS - 1) as f64).round() as usize;
        let label = char::from_digit(((i + 1) % 10) as u32, 10).unwrap_or('*');
        grid[row][col] = label;
    }

    grid.into_iter()
        .map(|cells| {
            let line: String = cells.into_iter().collect();
            format!("  {}\n", line.trim_end())
        })
        .collect()
}

struct CurrentPlay<'a> {
    play: &'a Play,
    title: &'static str,
}

impl fmt::Display for CurrentPlay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let play = self.play;
        writeln!(f, "{}", self.title)?;
        writeln!(f, "Count {}-{}", play.count.balls, play.count.strikes)?;

        if let Some(last) = play.pitches.last() {
            let speed = last
                .start_speed
                .map(|s| format!("{} mph", s.round() as i64))
                .unwrap_or_default();
            writeln!(
                f,
                "Last pitch: {} {} {}",
                last.pitch_type.as_deref().unwrap_or("-"),
                speed,
                last.description.as_deref().unwrap_or("")
            )?;
        }

        f.write_str(&strike_zone(&play.pitches))?;
        for (i, pitch) in play.pitches.iter().enumerate() {
            writeln!(
                f,
                "{:>2}. {:<8} {}",
                i + 1,
                call_mark(pitch.call),
                pitch.description.as_deref().unwrap_or("")
            )?;
        }

        if let Some(result) = &play.result {
            writeln!(f, "{}", result)?;
        }
        Ok(())
    }
}

pub fn current_play(detail: &GameDetail) -> String {
    match display_play(detail) {
        Some((play, title)) => CurrentPlay { play, title }.to_string(),
        None => "Current Play\nWaiting for play data...\n".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::{BattingLine, BoxTeam, Count, InningHalf, PersonId, PitchingLine};
    use crate::testing::{detail, person};

    fn entry(id: PersonId, name: &str) -> PlayerEntry {
        PlayerEntry {
            person: person(id, name),
            jersey_number: Some(id.to_string()),
            batting: None,
            pitching: None,
        }
    }

    fn lineup(ids: &[PersonId]) -> BoxTeam {
        BoxTeam {
            batting_order: ids.to_vec(),
            players: ids.iter().map(|id| (*id, entry(*id, &format!("Batter {}", id)))).collect(),
        }
    }

    fn play_with_batter(id: PersonId) -> Play {
        Play {
            batter: Some(person(id, "Current")),
            pitcher: None,
            bat_side: None,
            pitch_hand: None,
            pitches: Vec::new(),
            count: Count { balls: 0, strikes: 0 },
            result: None,
        }
    }

    fn pitch(call: PitchCall, px: f64, pz: f64) -> Pitch {
        Pitch {
            pitch_type: Some("Slider".to_string()),
            description: Some("Called Strike".to_string()),
            call,
            start_speed: Some(86.6),
            location: Some(PitchLocation { px, pz }),
        }
    }

    #[test]
    fn test_on_deck_wraps_order() {
        let mut d = detail(1);
        d.linescore.half = InningHalf::Top;
        d.boxscore.away = lineup(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        d.current_play = Some(play_with_batter(8));

        let names: Vec<&str> = on_deck(&d).iter().map(|p| p.person.full_name.as_str()).collect();
        assert_eq!(names, vec!["Batter 9", "Batter 1", "Batter 2"]);
    }

    #[test]
    fn test_on_deck_uses_home_in_bottom_half() {
        let mut d = detail(1);
        d.linescore.half = InningHalf::Bottom;
        d.boxscore.away = lineup(&[1, 2, 3, 4]);
        d.boxscore.home = lineup(&[11, 12, 13, 14]);
        d.current_play = Some(play_with_batter(11));

        let ids: Vec<PersonId> = on_deck(&d).iter().map(|p| p.person.id).collect();
        assert_eq!(ids, vec![12, 13, 14]);
    }

    #[test]
    fn test_on_deck_unavailable() {
        let mut d = detail(1);
        d.boxscore.away = lineup(&[1, 2, 3]);
        d.current_play = Some(play_with_batter(42));
        assert!(render_on_deck(&d).contains("Lineup data not available"));

        d.boxscore.away = BoxTeam::default();
        d.current_play = Some(play_with_batter(1));
        assert!(render_on_deck(&d).contains("Lineup data not available"));
    }

    #[test]
    fn test_zone_position() {
        let center = zone_position(&PitchLocation { px: 0.0, pz: 2.5 }).unwrap();
        assert!((center.0 - 50.0).abs() < 1e-9);
        assert!((center.1 - 50.0).abs() < 1e-9);

        let corner = zone_position(&PitchLocation { px: -1.5, pz: 3.5 }).unwrap();
        assert!(corner.0.abs() < 1e-9 && corner.1.abs() < 1e-9);

        assert!(zone_position(&PitchLocation { px: 1.6, pz: 2.5 }).is_none());
        assert!(zone_position(&PitchLocation { px: 0.0, pz: 1.2 }).is_none());
    }

    #[test]
    fn test_current_play_falls_back_to_last() {
        let mut d = detail(1);
        assert!(current_play(&d).contains("Waiting for play data..."));

        let mut last = play_with_batter(3);
        last.result = Some("Aaron Judge homers (30) on a fly ball to left field.".to_string());
        d.last_play = Some(last);
        let text = current_play(&d);
        assert!(text.starts_with("Last Play"));
        assert!(text.contains("homers"));
    }

    #[test]
    fn test_last_pitch_speed_rounded() {
        let mut d = detail(1);
        let mut play = play_with_batter(3);
        play.count = Count { balls: 1, strikes: 2 };
        play.pitches = vec![
            pitch(PitchCall::Ball, -3.0, 2.5),
            pitch(PitchCall::Strike, 0.0, 2.5),
        ];
        d.current_play = Some(play);

        let text = current_play(&d);
        assert!(text.starts_with("Current Play"));
        assert!(text.contains("Count 1-2"));
        assert!(text.contains("Last pitch: Slider 87 mph Called Strike"));
        // Pitch 1 is outside the box and not drawn, pitch 2 sits in the middle
        let grid = strike_zone(&d.current_play.as_ref().unwrap().pitches);
        assert_eq!(grid.lines().count(), ZONE_ROWS);
        assert!(!grid.contains('1'));
        assert_eq!(grid.lines().nth(4).unwrap().chars().nth(2 + 6), Some('2'));
    }

    #[test]
    fn test_players_lines() {
        let mut boxscore = BoxScore::default();
        let mut batter = entry(10, "Aaron Judge");
        batter.batting = Some(BattingLine {
            avg: ".322".to_string(),
            home_runs: Some(30),
            rbi: Some(70),
        });
        let mut pitcher = entry(20, "Gerrit Cole");
        pitcher.pitching = Some(PitchingLine {
            era: "2.95".to_string(),
            wins: Some(8),
            losses: Some(3),
            strike_outs: None,
        });
        boxscore.away.players.insert(10, batter);
        boxscore.home.players.insert(20, pitcher);

        let play = Play {
            batter: Some(person(10, "Aaron Judge")),
            pitcher: Some(person(20, "Gerrit Cole")),
            bat_side: Some(Handedness::Right),
            pitch_hand: None,
            pitches: Vec::new(),
            count: Count { balls: 0, strikes: 0 },
            result: None,
        };

        let text = players(&play, &boxscore);
        assert!(text.contains("At Bat:   Aaron Judge (Bats: Right)   AVG .322  HR 30  RBI 70"));
        assert!(text.contains("Pitching: Gerrit Cole   ERA 2.95  W-L 8-3  SO -"));

        // Unknown players and missing box score lines
        let empty = Play {
            batter: None,
            pitcher: Some(person(30, "Clay Holmes")),
            pitch_hand: Some(Handedness::Right),
            ..play
        };
        assert_eq!(
            players(&empty, &BoxScore::default()),
            "At Bat:   -\nPitching: Clay Holmes (Throws: Right)   ERA -  W-L ---  SO -\n"
        );
    }
}
