use anyhow::{Context, Result, anyhow, bail};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::known::KnownData;
use crate::locator::GameplayEntry;
use crate::raw::RawNode;

pub const RANK_VALUE_CLASS: &str = "gamerank_value";
const RANK_TIER_PREFIX: &str = "gamerank gamerank_";
const WHEN_SEPARATOR: &str = " at ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerResult {
    pub rank: u32,
    pub identifier: String,
    pub score: i64,
}

/// One played game recovered from the dump. Immutable once built; lives
/// for the single report pass.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub game: String,
    pub table: String,
    /// When the game concluded, minute precision.
    pub time: NaiveDateTime,
    pub duration_minutes: Option<u32>,
    pub players: Vec<PlayerResult>,
    /// Rank/ELO annotation, present only when the page shows a rank change.
    pub information: Option<String>,
}

pub fn extract_game_record(
    entry: &GameplayEntry<'_>,
    creation_time: NaiveDateTime,
    known: &KnownData,
) -> Result<GameRecord> {
    let (game, table) = extract_info(entry.info).context("info column")?;
    let (time, duration_minutes) = extract_time(entry.time, creation_time)
        .with_context(|| format!("time column of table {table}"))?;
    let players = extract_players(entry.players, known)
        .with_context(|| format!("players column of table {table}"))?;
    if players.is_empty() {
        bail!("table {table} lists no players");
    }
    let information = entry
        .game_rank
        .map(|nodes| extract_rank_change(nodes, &table))
        .transpose()
        .with_context(|| format!("rank change column of table {table}"))?;

    Ok(GameRecord {
        game,
        table,
        time,
        duration_minutes,
        players,
        information,
    })
}

fn extract_info(info: &[RawNode]) -> Result<(String, String)> {
    let link = info
        .get(1)
        .ok_or_else(|| anyhow!("missing table link node"))?;
    let game = link
        .text_value()
        .context("table link has no title text")?
        .to_string();
    let href = link.href_value().context("table link")?;
    Ok((game, trailing_token(href).to_string()))
}

fn extract_time(
    time: &[RawNode],
    creation_time: NaiveDateTime,
) -> Result<(NaiveDateTime, Option<u32>)> {
    let when = time
        .first()
        .and_then(|node| node.text.as_deref())
        .ok_or_else(|| anyhow!("missing played-at text"))?;
    let duration = time
        .get(1)
        .and_then(|node| node.text.as_deref())
        .ok_or_else(|| anyhow!("missing duration text"))?;
    Ok((
        resolve_played_at(when, creation_time)?,
        parse_duration_minutes(duration)?,
    ))
}

/// "45 mn" -> 45. Text without the minute unit means the page did not
/// record a duration for that game.
pub fn parse_duration_minutes(text: &str) -> Result<Option<u32>> {
    if !text.contains("mn") {
        return Ok(None);
    }
    let token = text.split_whitespace().next().unwrap_or(text);
    let minutes = token
        .parse()
        .with_context(|| format!("unparsable duration {text:?}"))?;
    Ok(Some(minutes))
}

/// Resolves the page's "played at" phrasing against the capture time of
/// the dump. Three forms appear: "N hours ago", "yesterday at HH:MM" and
/// the absolute "YYYY-MM-DD at HH:MM".
pub fn resolve_played_at(text: &str, creation_time: NaiveDateTime) -> Result<NaiveDateTime> {
    if text.contains("hours") {
        let token = text.split_whitespace().next().unwrap_or(text);
        let hours: i64 = token
            .parse()
            .with_context(|| format!("unparsable hour count in {text:?}"))?;
        return Ok(truncate_to_minute(creation_time - Duration::hours(hours)));
    }

    let (day_part, time_part) = text
        .split_once(WHEN_SEPARATOR)
        .ok_or_else(|| anyhow!("played-at text {text:?} has no \" at \" separator"))?;
    let time = NaiveTime::parse_from_str(time_part, "%H:%M")
        .with_context(|| format!("unparsable clock time in {text:?}"))?;
    let date = if text.contains("yesterday") {
        creation_time.date() - Duration::days(1)
    } else {
        NaiveDate::parse_from_str(day_part, "%Y-%m-%d")
            .with_context(|| format!("unparsable date in {text:?}"))?
    };
    Ok(NaiveDateTime::new(date, time))
}

fn truncate_to_minute(value: NaiveDateTime) -> NaiveDateTime {
    value
        .with_second(0)
        .and_then(|v| v.with_nanosecond(0))
        .unwrap_or(value)
}

fn extract_players(rows: &[RawNode], known: &KnownData) -> Result<Vec<PlayerResult>> {
    let mut players = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let player =
            extract_player(row, known).with_context(|| format!("player row {idx}"))?;
        players.push(player);
    }
    Ok(players)
}

fn extract_player(row: &RawNode, known: &KnownData) -> Result<PlayerResult> {
    let rank_label = row
        .child(0)
        .and_then(|node| node.text_value())
        .context("rank label")?;
    let rank = parse_rank_label(rank_label)?;
    let href = row
        .child(1)
        .and_then(|node| node.child(0))
        .and_then(|node| node.href_value())
        .context("player link")?;
    let identifier = known.player_identifier(trailing_token(href)).to_string();
    let score_text = row
        .child(2)
        .and_then(|node| node.text_value())
        .context("score")?;
    let score = score_text
        .trim()
        .parse()
        .with_context(|| format!("unparsable score {score_text:?}"))?;
    Ok(PlayerResult {
        rank,
        identifier,
        score,
    })
}

/// "1st" -> 1, "12th" -> 12. The page always appends a two letter ordinal
/// suffix to the rank number.
pub fn parse_rank_label(label: &str) -> Result<u32> {
    let mut chars = label.chars();
    chars.next_back();
    chars.next_back();
    chars
        .as_str()
        .parse()
        .with_context(|| format!("unparsable rank label {label:?}"))
}

fn extract_rank_change(nodes: &[RawNode], table: &str) -> Result<String> {
    let detail = nodes
        .get(1)
        .ok_or_else(|| anyhow!("missing rank change detail node"))?;
    let rank_cell = detail.child(2).context("rank value cell")?;
    let value_node = rank_cell.child(1).context("rank value cell")?;
    let class = value_node
        .class_value()
        .context("rank value node")?;
    if class != RANK_VALUE_CLASS {
        bail!("rank value node has class {class:?}, expected {RANK_VALUE_CLASS:?}");
    }
    let rank_value: i64 = value_node
        .text_value()
        .context("rank value node")?
        .trim()
        .parse()
        .context("unparsable rank value")?;
    let tier = rank_cell
        .class_value()
        .context("rank cell")?
        .replace(RANK_TIER_PREFIX, "");
    let elo_delta = detail
        .child(1)
        .and_then(|node| node.text_value())
        .context("elo delta")?;

    Ok(format!(
        "Played on [url=https://boardgamearena.com/table?table={table}]Board Game Arena[/url]\nGame rank: {tier}\nELO: {rank_value} (delta {elo_delta})"
    ))
}

/// Token after the last '=' of a BGA link, used for both table ids and
/// player ids. A href without '=' yields the whole string.
fn trailing_token(href: &str) -> &str {
    href.rsplit('=').next().unwrap_or(href)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid date"),
            NaiveTime::parse_from_str(time, "%H:%M").expect("valid time"),
        )
    }

    #[test]
    fn duration_with_minute_unit() {
        assert_eq!(parse_duration_minutes("45 mn").expect("valid"), Some(45));
        assert_eq!(parse_duration_minutes("3 mn").expect("valid"), Some(3));
    }

    #[test]
    fn duration_without_minute_unit_is_unknown() {
        assert_eq!(parse_duration_minutes("1 h").expect("valid"), None);
        assert_eq!(parse_duration_minutes("").expect("valid"), None);
    }

    #[test]
    fn duration_with_bad_number_fails() {
        assert!(parse_duration_minutes("abc mn").is_err());
    }

    #[test]
    fn hours_ago_subtracts_from_creation_time() {
        let creation = at("2024-01-10", "18:00");
        let resolved = resolve_played_at("3 hours ago", creation).expect("valid");
        assert_eq!(resolved, at("2024-01-10", "15:00"));
    }

    #[test]
    fn hours_ago_truncates_seconds() {
        let creation = at("2024-01-10", "18:00").with_second(42).expect("valid");
        let resolved = resolve_played_at("3 hours ago", creation).expect("valid");
        assert_eq!(resolved, at("2024-01-10", "15:00"));
    }

    #[test]
    fn yesterday_combines_previous_date_with_clock_time() {
        let creation = at("2024-03-05", "09:00");
        let resolved = resolve_played_at("yesterday at 20:15", creation).expect("valid");
        assert_eq!(resolved, at("2024-03-04", "20:15"));
    }

    #[test]
    fn absolute_form_ignores_creation_time() {
        let creation = at("2024-03-05", "09:00");
        let resolved = resolve_played_at("2023-12-01 at 08:30", creation).expect("valid");
        assert_eq!(resolved, at("2023-12-01", "08:30"));
    }

    #[test]
    fn when_text_without_separator_fails() {
        let creation = at("2024-03-05", "09:00");
        assert!(resolve_played_at("last week", creation).is_err());
    }

    #[test]
    fn rank_label_strips_ordinal_suffix() {
        assert_eq!(parse_rank_label("1st").expect("valid"), 1);
        assert_eq!(parse_rank_label("2nd").expect("valid"), 2);
        assert_eq!(parse_rank_label("12th").expect("valid"), 12);
    }

    #[test]
    fn rank_label_without_number_fails() {
        assert!(parse_rank_label("th").is_err());
        assert!(parse_rank_label("xyst").is_err());
    }

    #[test]
    fn trailing_token_takes_last_equals_segment() {
        assert_eq!(
            trailing_token("https://boardgamearena.com/table?table=412345678"),
            "412345678"
        );
        assert_eq!(trailing_token("no-equals-here"), "no-equals-here");
    }
}
