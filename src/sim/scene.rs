use std::collections::{HashMap, HashSet};

use eframe::egui::{Vec2, vec2};

use crate::board::IdeaCard;

use super::Simulator;

/// Width of a compact card in layout units.
pub const CARD_WIDTH: f32 = 192.0;
/// Height of a compact card in layout units.
pub const CARD_HEIGHT: f32 = 96.0;
const DEFAULT_ANCHOR_DROP: f32 = 30.0;

/// Where thread lines attach relative to a node position (the card's top-left).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    offset: Vec2,
}

impl Anchor {
    /// Horizontal center of a card of `size`, `drop` units below its top edge.
    pub fn for_card(size: Vec2, drop: f32) -> Self {
        Self {
            offset: vec2(size.x * 0.5, drop.clamp(0.0, size.y)),
        }
    }

    pub fn offset(self) -> Vec2 {
        self.offset
    }

    pub fn point(self, position: Vec2) -> Vec2 {
        position + self.offset
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::for_card(vec2(CARD_WIDTH, CARD_HEIGHT), DEFAULT_ANCHOR_DROP)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Placement<'a> {
    pub node: usize,
    pub card: &'a IdeaCard,
    pub position: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Connection {
    pub from: usize,
    pub to: usize,
    pub start: Vec2,
    pub end: Vec2,
}

/// Cards to draw, in node order. Nodes whose card is gone are skipped.
pub fn placements<'a>(simulator: &Simulator, cards: &'a [IdeaCard]) -> Vec<Placement<'a>> {
    let card_by_id = cards
        .iter()
        .map(|card| (card.id.as_str(), card))
        .collect::<HashMap<_, _>>();

    simulator
        .nodes()
        .iter()
        .enumerate()
        .filter_map(|(node, sim_node)| {
            card_by_id.get(sim_node.id.as_str()).copied().map(|card| Placement {
                node,
                card,
                position: sim_node.position,
            })
        })
        .collect()
}

/// One line per unordered thread pair whose cards both exist and both have
/// nodes, however many times the pair is declared.
pub fn connections(simulator: &Simulator, cards: &[IdeaCard], anchor: Anchor) -> Vec<Connection> {
    let present = cards
        .iter()
        .map(|card| card.id.as_str())
        .collect::<HashSet<_>>();
    let nodes = simulator.nodes();
    let mut drawn = HashSet::new();
    let mut lines = Vec::new();

    for card in cards {
        let Some(source) = simulator.index_of(&card.id) else {
            continue;
        };

        for target_id in &card.threads {
            if !present.contains(target_id.as_str()) {
                continue;
            }
            let Some(target) = simulator.index_of(target_id) else {
                continue;
            };
            if source == target || !drawn.insert((source.min(target), source.max(target))) {
                continue;
            }

            lines.push(Connection {
                from: source,
                to: target,
                start: anchor.point(nodes[source].position),
                end: anchor.point(nodes[target].position),
            });
        }
    }
    lines
}
