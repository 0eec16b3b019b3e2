use anyhow::{Context, Result};

use crate::raw::RawNode;

pub const SECTION_TITLE: &str = "Games history";

/// The logical columns of one entry in the games history list. The rank
/// change column is absent for games played without ELO tracking.
#[derive(Debug)]
pub struct GameplayEntry<'a> {
    pub info: &'a [RawNode],
    pub time: &'a [RawNode],
    pub players: &'a [RawNode],
    pub game_rank: Option<&'a [RawNode]>,
}

/// Finds the "Games history" section and returns its per-game entries.
///
/// A document without the section yields an empty list (an empty report is
/// valid); a section whose inner structure does not match the known page
/// layout is an error naming where the shape diverged.
pub fn games_history(document: &[RawNode]) -> Result<Vec<GameplayEntry<'_>>> {
    let Some(section) = document.iter().find(|node| {
        node.children.first().and_then(|c| c.text.as_deref()) == Some(SECTION_TITLE)
    }) else {
        return Ok(Vec::new());
    };

    // The per-game list sits below the section header along the first
    // child at every step.
    let list = section
        .child(1)
        .and_then(|node| node.child(0))
        .and_then(|node| node.child(0))
        .and_then(|node| node.child(0))
        .context("games history section has an unexpected shape")?;

    let mut entries = Vec::with_capacity(list.children.len());
    for (idx, game) in list.children.iter().enumerate() {
        let entry = split_columns(game)
            .with_context(|| format!("games history entry {idx} is malformed"))?;
        entries.push(entry);
    }
    Ok(entries)
}

fn split_columns(game: &RawNode) -> Result<GameplayEntry<'_>> {
    let info = game.child(0).context("missing info column")?;
    let time = game.child(1).context("missing time column")?;
    let players = game.child(2).context("missing players column")?;
    Ok(GameplayEntry {
        info: &info.children,
        time: &time.children,
        players: &players.children,
        game_rank: game.children.get(3).map(|node| node.children.as_slice()),
    })
}
