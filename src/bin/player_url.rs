use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};

use bga_history::known;
use bga_history::report::bga_gamestats_url;

fn main() -> Result<()> {
    let args = parse_args()?;
    if !args.known.extension().is_some_and(|ext| ext == "json") {
        bail!("known data file {} must be a .json file", args.known.display());
    }
    if !args.known.exists() {
        bail!("known data file {} does not exist", args.known.display());
    }

    let known = known::load_known_data(&args.known)?;
    let Some(player_id) = known.player_id_by_bga_name(&args.player_name) else {
        bail!(
            "player name {:?} not found in known players",
            args.player_name
        );
    };

    println!(
        "Please open {} and save the page as 'latest.gameshistory.html'",
        bga_gamestats_url(player_id)
    );
    Ok(())
}

struct Args {
    player_name: String,
    known: PathBuf,
}

fn parse_args() -> Result<Args> {
    let mut player_name = None;
    let mut known = PathBuf::from("known_data.json");

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--playername" => {
                player_name = Some(
                    iter.next()
                        .ok_or_else(|| anyhow!("--playername requires a value"))?,
                );
            }
            "-k" | "--known" => {
                known = PathBuf::from(
                    iter.next()
                        .ok_or_else(|| anyhow!("{arg} requires a value"))?,
                );
            }
            "-h" | "--help" => {
                println!("Print the BGA game stats URL for a known player.");
                println!();
                println!("Usage: player_url --playername NAME [-k KNOWN]");
                std::process::exit(0);
            }
            other => bail!("unrecognized argument {other:?} (try --help)"),
        }
    }

    let player_name = player_name.ok_or_else(|| anyhow!("--playername is required"))?;
    Ok(Args { player_name, known })
}
