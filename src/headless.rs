use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::board::{Board, CardFilter, visible_cards, visible_sets};
use crate::sim::{Anchor, SimConfig, Simulator, connections, placements};

#[derive(Debug, Serialize)]
pub struct LayoutReport {
    pub ticks: u64,
    pub kinetic_energy: f32,
    pub nodes: Vec<NodeReport>,
    pub connections: Vec<ConnectionReport>,
}

#[derive(Debug, Serialize)]
pub struct NodeReport {
    pub id: String,
    pub title: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Serialize)]
pub struct ConnectionReport {
    pub from: String,
    pub to: String,
    pub start: [f32; 2],
    pub end: [f32; 2],
}

/// Lays out the filtered board for `ticks` steps without a window.
pub fn simulate(
    board: &Board,
    filter: &CardFilter,
    config: SimConfig,
    seed: Option<u64>,
    ticks: u64,
) -> LayoutReport {
    let cards = visible_cards(board, filter);
    let sets = visible_sets(board, filter);
    let mut simulator = Simulator::new(config, seed);
    simulator.sync(&cards, &sets);
    for _ in 0..ticks {
        simulator.tick();
    }

    let nodes = placements(&simulator, &cards)
        .into_iter()
        .map(|placement| NodeReport {
            id: placement.card.id.clone(),
            title: placement.card.display_title().to_owned(),
            x: placement.position.x,
            y: placement.position.y,
        })
        .collect();

    let node_ids = simulator.nodes();
    let connections = connections(&simulator, &cards, Anchor::default())
        .into_iter()
        .map(|line| ConnectionReport {
            from: node_ids[line.from].id.clone(),
            to: node_ids[line.to].id.clone(),
            start: [line.start.x, line.start.y],
            end: [line.end.x, line.end.y],
        })
        .collect();

    LayoutReport {
        ticks: simulator.tick_count(),
        kinetic_energy: simulator.kinetic_energy(),
        nodes,
        connections,
    }
}

pub fn run(
    board: &Board,
    filter: &CardFilter,
    config: SimConfig,
    seed: Option<u64>,
    ticks: u64,
) -> Result<()> {
    let report = simulate(board, filter, config, seed, ticks);
    info!(
        "headless layout: {} nodes, {} connections, kinetic energy {:.6} after {} ticks",
        report.nodes.len(),
        report.connections.len(),
        report.kinetic_energy,
        report.ticks
    );

    let json = serde_json::to_string_pretty(&report).context("failed to encode layout report")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::sample_board;

    #[test]
    fn report_covers_every_visible_card() {
        let board = sample_board();
        let filter = CardFilter::default();
        let report = simulate(&board, &filter, SimConfig::default(), Some(42), 50);

        assert_eq!(report.ticks, 50);
        assert_eq!(report.nodes.len(), visible_cards(&board, &filter).len());
        assert!(report.nodes.iter().all(|node| node.x.is_finite() && node.y.is_finite()));
        assert!(report.nodes.iter().all(|node| node.id != "old-ending"));
    }

    #[test]
    fn connections_only_join_reported_nodes() {
        let board = sample_board();
        let report = simulate(&board, &CardFilter::default(), SimConfig::default(), Some(42), 10);

        assert!(!report.connections.is_empty());
        for line in &report.connections {
            assert!(report.nodes.iter().any(|node| node.id == line.from));
            assert!(report.nodes.iter().any(|node| node.id == line.to));
            assert_ne!(line.to, "ghost-link");
        }
    }

    #[test]
    fn same_seed_gives_the_same_layout() {
        let board = sample_board();
        let filter = CardFilter::default();
        let first = simulate(&board, &filter, SimConfig::default(), Some(9), 120);
        let second = simulate(&board, &filter, SimConfig::default(), Some(9), 120);

        let json = |report: &LayoutReport| serde_json::to_value(report).unwrap();
        assert_eq!(json(&first), json(&second));
    }

    #[test]
    fn report_serializes_the_documented_fields() {
        let board = sample_board();
        let report = simulate(&board, &CardFilter::default(), SimConfig::default(), Some(1), 0);
        let value = serde_json::to_value(&report).unwrap();

        for key in ["ticks", "kinetic_energy", "nodes", "connections"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        let node = &value["nodes"][0];
        for key in ["id", "title", "x", "y"] {
            assert!(node.get(key).is_some(), "missing node.{key}");
        }
        assert_eq!(value["kinetic_energy"], 0.0);
    }
}
