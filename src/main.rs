use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Local, NaiveDateTime};

use bga_history::{extract, known, locator, raw, report};

struct Args {
    file: PathBuf,
    known: PathBuf,
    game: Option<String>,
}

fn main() -> Result<()> {
    let args = parse_args()?;
    require_json_file(&args.file, "history dump")?;
    require_json_file(&args.known, "known data file")?;

    let known = known::load_known_data(&args.known)?;
    let creation_time = creation_time(&args.file)?;
    let document = raw::load_document(&args.file)?;

    let entries = locator::games_history(&document)?;
    let mut records = Vec::with_capacity(entries.len());
    for entry in &entries {
        records.push(extract::extract_game_record(entry, creation_time, &known)?);
    }

    let stdout = io::stdout();
    report::print_report(&mut stdout.lock(), &records, args.game.as_deref(), &known)
}

fn parse_args() -> Result<Args> {
    let mut file = PathBuf::from("all.games.history.json");
    let mut known = PathBuf::from("known_data.json");
    let mut game = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-f" | "--file" => file = PathBuf::from(next_value(&mut iter, &arg)?),
            "-k" | "--known" => known = PathBuf::from(next_value(&mut iter, &arg)?),
            "-g" | "--game" => game = Some(next_value(&mut iter, &arg)?),
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            other => bail!("unrecognized argument {other:?} (try --help)"),
        }
    }
    Ok(Args { file, known, game })
}

fn next_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    iter.next().ok_or_else(|| anyhow!("{flag} requires a value"))
}

fn print_usage() {
    println!("Process a JSON dump of a BGA games history page.");
    println!();
    println!("Usage: bga_history [-f FILE] [-k KNOWN] [-g GAME]");
    println!("  -f, --file   Path to the games history JSON dump (default all.games.history.json)");
    println!("  -k, --known  Path to the known players and games JSON file (default known_data.json)");
    println!("  -g, --game   Filter the report to one game name");
}

fn require_json_file(path: &Path, what: &str) -> Result<()> {
    if !path.extension().is_some_and(|ext| ext == "json") {
        bail!("{what} {} must be a .json file", path.display());
    }
    if !path.exists() {
        bail!("{what} {} does not exist", path.display());
    }
    Ok(())
}

/// Reference moment for relative "played at" phrases: the dump file's
/// modified time as local time. CREATION_TIME overrides it for runs on
/// copied files whose mtime is meaningless.
fn creation_time(path: &Path) -> Result<NaiveDateTime> {
    if let Ok(raw) = std::env::var("CREATION_TIME") {
        return NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M")
            .context("CREATION_TIME must look like \"2024-01-10 18:00\"");
    }
    let modified = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("stat {}", path.display()))?;
    Ok(DateTime::<Local>::from(modified).naive_local())
}
