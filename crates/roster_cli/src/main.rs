//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `roster_core` linkage.
//! - Optionally print a read-only summary of a board database.
//!
//! Usage: `roster [BOARD_DB_PATH]`

use roster_core::{open_db, BoardConfig, BoardRepository, BoardSnapshot, SqliteStateStore};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("roster_core ping={}", roster_core::ping());
    println!("roster_core version={}", roster_core::core_version());

    let Some(path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    match print_board(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_board(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db(path)?;
    let config = BoardConfig::default();
    let repo = BoardRepository::new(SqliteStateStore::try_new(&conn)?, &config);
    let (state, report) = repo.load(&config)?;
    let snapshot = BoardSnapshot::capture(&state);

    println!("names={}", snapshot.pool.len());
    for chip in &snapshot.pool {
        println!("  {}", chip.name);
    }
    if snapshot.has_no_panels() {
        println!("panels=0 (no panels yet)");
    } else {
        println!("panels={}", snapshot.panels.len());
    }
    for panel in &snapshot.panels {
        let occupied = panel
            .slots
            .iter()
            .filter(|slot| slot.occupant.is_some())
            .count();
        println!(
            "  {} \"{}\" interval={}m slots={} occupied={} category={}",
            panel.container_id,
            panel.display_name,
            panel.interval_minutes,
            panel.slots.len(),
            occupied,
            panel.category.len()
        );
        for slot in panel.slots.iter() {
            if let Some(chip) = &slot.occupant {
                println!("    {} {}", slot.label, chip.name);
            }
        }
    }
    if !report.is_clean() {
        println!("note: stored data needs repair; open the board to write it back");
    }
    Ok(())
}
