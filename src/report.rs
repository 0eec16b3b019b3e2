use std::io::Write;

use anyhow::{Result, bail};
use chrono::NaiveDateTime;

use crate::extract::{GameRecord, PlayerResult};
use crate::known::KnownData;

/// Renders one played game as the report shows it.
pub fn render_game(record: &GameRecord) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let _ = writeln!(out, "Game: {}", record.game);
    let _ = writeln!(out, "Time: {}", record.time.format("%Y-%m-%d %H:%M"));
    match record.duration_minutes {
        Some(minutes) => {
            let _ = writeln!(out, "Duration: {minutes} minutes");
        }
        None => {
            let _ = writeln!(out, "Duration: unknown");
        }
    }

    if let [solo] = record.players.as_slice() {
        let outcome = if solo.score > 0 { "won" } else { "lost" };
        let _ = writeln!(out, "Solo mode: {outcome}");
    } else {
        let _ = writeln!(out, "Players:");
        let mut players: Vec<&PlayerResult> = record.players.iter().collect();
        players.sort_by_key(|player| player.rank);
        for player in players {
            let _ = writeln!(out, "\t{}. {} ({})", player.rank, player.identifier, player.score);
        }
    }

    if let Some(information) = &record.information {
        let _ = writeln!(out, "{information}");
    }
    out.push('\n');
    out
}

/// Prints every record grouped by game name (case-insensitive order),
/// optionally restricted to one game, then the aggregate summary line.
pub fn print_report(
    out: &mut impl Write,
    records: &[GameRecord],
    filter: Option<&str>,
    known: &KnownData,
) -> Result<()> {
    let games = unique_game_names(records);

    let games = if let Some(wanted) = filter {
        if !games.iter().any(|name| *name == wanted) {
            bail!(
                "'{wanted}' not found in the list of games: {}.",
                games.join(", ")
            );
        }
        vec![wanted]
    } else {
        games
    };

    let mut plays = 0usize;
    let mut first: Option<NaiveDateTime> = None;
    let mut last: Option<NaiveDateTime> = None;
    for game in &games {
        for record in records.iter().filter(|r| r.game == *game) {
            write!(out, "{}", render_game(record))?;
            plays += 1;
            first = Some(first.map_or(record.time, |t| t.min(record.time)));
            last = Some(last.map_or(record.time, |t| t.max(record.time)));
        }
    }

    match (first, last) {
        (Some(first), Some(last)) => writeln!(
            out,
            "=====> {} unique games played for a total of {} plays between {} and {}",
            games.len(),
            plays,
            first.date(),
            last.date()
        )?,
        _ => writeln!(out, "=====> no plays found")?,
    }

    if let Some(wanted) = filter {
        writeln!(out, "Logged plays: {}", bgg_plays_url(wanted, known)?)?;
    }
    Ok(())
}

/// Distinct game names sorted case-insensitively.
pub fn unique_game_names(records: &[GameRecord]) -> Vec<&str> {
    let mut games: Vec<&str> = records.iter().map(|r| r.game.as_str()).collect();
    games.sort_by_key(|name| name.to_lowercase());
    games.dedup();
    games
}

pub fn bgg_plays_url(game: &str, known: &KnownData) -> Result<String> {
    let Some(entry) = known.games.get(game) else {
        bail!("game {game:?} missing from the known games map");
    };
    let slug = game.to_lowercase().replace(' ', "-");
    Ok(format!(
        "https://boardgamegeek.com/boardgame/{}/{slug}/mygames/plays",
        entry.bgg_id
    ))
}

pub fn bga_gamestats_url(player_id: &str) -> String {
    format!("https://boardgamearena.com/gamestats?player={player_id}&opponent_id=0&finished=1#")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn record(game: &str, players: Vec<PlayerResult>) -> GameRecord {
        GameRecord {
            game: game.to_string(),
            table: "412345678".to_string(),
            time: NaiveDateTime::new(
                NaiveDate::from_ymd_opt(2024, 1, 10).expect("valid date"),
                chrono::NaiveTime::from_hms_opt(15, 0, 0).expect("valid time"),
            ),
            duration_minutes: Some(45),
            players,
            information: None,
        }
    }

    fn player(rank: u32, identifier: &str, score: i64) -> PlayerResult {
        PlayerResult {
            rank,
            identifier: identifier.to_string(),
            score,
        }
    }

    #[test]
    fn solo_win_when_score_positive() {
        let rendered = render_game(&record("Cascadia", vec![player(1, "alice_bgg", 87)]));
        assert!(rendered.contains("Solo mode: won"));
    }

    #[test]
    fn solo_loss_when_score_not_positive() {
        let rendered = render_game(&record("Cascadia", vec![player(1, "alice_bgg", 0)]));
        assert!(rendered.contains("Solo mode: lost"));
    }

    #[test]
    fn multiplayer_listing_follows_rank_order() {
        let rendered = render_game(&record(
            "Ark Nova",
            vec![player(2, "bob_on_bgg", 98), player(1, "alice_bgg", 112)],
        ));
        let alice = rendered.find("1. alice_bgg (112)").expect("alice listed");
        let bob = rendered.find("2. bob_on_bgg (98)").expect("bob listed");
        assert!(alice < bob);
    }

    #[test]
    fn unknown_duration_renders_as_unknown() {
        let mut rec = record("Cascadia", vec![player(1, "alice_bgg", 87)]);
        rec.duration_minutes = None;
        assert!(render_game(&rec).contains("Duration: unknown"));
    }

    #[test]
    fn game_names_sorted_case_insensitively() {
        let records = vec![
            record("azul", vec![player(1, "a", 1)]),
            record("Cascadia", vec![player(1, "a", 1)]),
            record("Ark Nova", vec![player(1, "a", 1)]),
            record("Cascadia", vec![player(1, "a", 1)]),
        ];
        assert_eq!(unique_game_names(&records), ["Ark Nova", "azul", "Cascadia"]);
    }

    #[test]
    fn gamestats_url_embeds_player_id() {
        assert_eq!(
            bga_gamestats_url("87654321"),
            "https://boardgamearena.com/gamestats?player=87654321&opponent_id=0&finished=1#"
        );
    }
}
