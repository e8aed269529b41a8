use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use super::model::Board;
use super::parse::parse_board;

pub fn load_board(path: &Path) -> Result<Board> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read board snapshot {}", path.display()))?;
    let board = parse_board(&raw)
        .with_context(|| format!("failed to parse board snapshot {}", path.display()))?;

    info!(
        "loaded {} cards, {} sets, {} projects from {}",
        board.cards.len(),
        board.sets.len(),
        board.projects.len(),
        path.display()
    );
    Ok(board)
}
