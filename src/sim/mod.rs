mod config;
mod forces;
mod frame_loop;
mod quadtree;
mod relations;
mod scene;

use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::{IdeaCard, IdeaSet};
use forces::{
    Repulsion, accumulate_cluster_pull, accumulate_pairwise_repulsion, accumulate_thread_springs,
    accumulate_tree_repulsion, integrate,
};
use quadtree::QuadNode;
use relations::Relations;

pub use config::{MAX_DAMPING, SeedPolicy, SimConfig};
pub use frame_loop::FrameLoop;
pub use quadtree::QuadtreeCell;
pub use scene::{Anchor, CARD_HEIGHT, CARD_WIDTH, connections, placements};

const ENERGY_LOG_INTERVAL: u64 = 240;

#[derive(Clone, Debug, PartialEq)]
pub struct SimNode {
    pub id: String,
    pub position: Vec2,
    pub velocity: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    Reseeded,
    Refreshed,
}

#[derive(Clone, Default)]
struct Scratch {
    positions: Vec<Vec2>,
    forces: Vec<Vec2>,
}

/// Force-directed layout over one node per visible card.
///
/// The node set is replaced wholesale when the number of input cards changes
/// and otherwise only moves under [`Simulator::tick`].
#[derive(Clone)]
pub struct Simulator {
    config: SimConfig,
    nodes: Vec<SimNode>,
    index_by_id: HashMap<String, usize>,
    relations: Relations,
    seeded_card_count: Option<usize>,
    viewport: Vec2,
    rng: StdRng,
    scratch: Scratch,
    ticks: u64,
    seeds: u64,
}

impl Simulator {
    pub fn new(config: SimConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            viewport: config.sanitized().seed_bounds(),
            config,
            nodes: Vec::new(),
            index_by_id: HashMap::new(),
            relations: Relations::default(),
            seeded_card_count: None,
            rng,
            scratch: Scratch::default(),
            ticks: 0,
            seeds: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SimConfig) {
        self.config = config;
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn position_of(&self, id: &str) -> Option<Vec2> {
        self.index_of(id).map(|index| self.nodes[index].position)
    }

    pub fn relations(&self) -> &Relations {
        &self.relations
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Number of times the node set has been seeded.
    pub fn seed_count(&self) -> u64 {
        self.seeds
    }

    pub fn center(&self) -> Vec2 {
        self.viewport * 0.5
    }

    pub fn set_viewport(&mut self, size: Vec2) {
        if size.is_finite() && size.x > 0.0 && size.y > 0.0 {
            self.viewport = size;
        }
    }

    pub fn uses_barnes_hut(&self) -> bool {
        self.nodes.len() > self.config.barnes_hut_threshold
    }

    /// Sum of squared velocities.
    pub fn kinetic_energy(&self) -> f32 {
        self.nodes.iter().map(|node| node.velocity.length_sq()).sum()
    }

    pub fn needs_reseed(&self, card_count: usize) -> bool {
        self.seeded_card_count != Some(card_count)
    }

    /// Re-seeds when the card count changed, otherwise only picks up the new
    /// relations.
    pub fn sync(&mut self, cards: &[IdeaCard], sets: &[IdeaSet]) -> SyncOutcome {
        if self.needs_reseed(cards.len()) {
            self.reseed(cards, sets);
            SyncOutcome::Reseeded
        } else {
            self.refresh(cards, sets);
            SyncOutcome::Refreshed
        }
    }

    /// Rebuilds the node set following the configured [`SeedPolicy`].
    pub fn reseed(&mut self, cards: &[IdeaCard], sets: &[IdeaSet]) {
        let keep = self.config.seed_policy == SeedPolicy::KeepSettled;
        self.seed_nodes(cards, keep);
        self.refresh(cards, sets);
    }

    /// Full re-seed regardless of policy.
    pub fn shuffle(&mut self, cards: &[IdeaCard], sets: &[IdeaSet]) {
        self.seed_nodes(cards, false);
        self.refresh(cards, sets);
    }

    /// Replaces the relation view. Node state is untouched.
    pub fn refresh(&mut self, cards: &[IdeaCard], sets: &[IdeaSet]) {
        self.relations = Relations::build(cards, sets, &self.index_by_id);
    }

    /// Moves one node and stops it. Returns false for unknown ids.
    pub fn set_position(&mut self, id: &str, position: Vec2) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let node = &mut self.nodes[index];
        node.position = position;
        node.velocity = Vec2::ZERO;
        true
    }

    fn seed_nodes(&mut self, cards: &[IdeaCard], keep_settled: bool) {
        let mut previous = if keep_settled {
            self.nodes
                .drain(..)
                .map(|node| (node.id.clone(), node))
                .collect::<HashMap<_, _>>()
        } else {
            HashMap::new()
        };

        self.nodes.clear();
        self.index_by_id.clear();
        let bounds = self.config.sanitized().seed_bounds();
        let mut kept = 0usize;

        for card in cards {
            if self.index_by_id.contains_key(&card.id) {
                continue;
            }

            let node = if let Some(node) = previous.remove(&card.id) {
                kept += 1;
                node
            } else {
                let position = vec2(
                    self.rng.random::<f32>() * bounds.x,
                    self.rng.random::<f32>() * bounds.y,
                );
                SimNode {
                    id: card.id.clone(),
                    position,
                    velocity: Vec2::ZERO,
                }
            };

            self.index_by_id.insert(card.id.clone(), self.nodes.len());
            self.nodes.push(node);
        }

        self.seeded_card_count = Some(cards.len());
        self.seeds += 1;
        info!(
            "layout seeded with {} nodes ({kept} kept, {} placed)",
            self.nodes.len(),
            self.nodes.len() - kept
        );
    }

    /// One integration step: repulsion, thread springs, cluster pull, then
    /// gravity, damping and movement.
    pub fn tick(&mut self) {
        self.ticks += 1;
        let node_count = self.nodes.len();
        if node_count == 0 {
            return;
        }

        let config = self.config.sanitized();
        let center = self.center();
        let use_tree = self.uses_barnes_hut();
        let Scratch { positions, forces } = &mut self.scratch;

        positions.clear();
        positions.extend(self.nodes.iter().map(|node| node.position));
        forces.clear();
        forces.resize(node_count, Vec2::ZERO);

        let repulsion = Repulsion {
            strength: config.repulsion,
            softening: config.softening,
        };
        if use_tree {
            if let Some(tree) = QuadNode::build(positions) {
                for (index, force) in forces.iter_mut().enumerate() {
                    accumulate_tree_repulsion(
                        &tree,
                        index,
                        positions,
                        repulsion,
                        config.barnes_hut_theta,
                        force,
                    );
                }
            }
        } else {
            accumulate_pairwise_repulsion(positions, repulsion, forces);
        }

        accumulate_thread_springs(
            positions,
            &self.relations.threads,
            config.rest_length,
            config.spring,
            forces,
        );
        accumulate_cluster_pull(
            positions,
            &self.relations.clusters,
            config.cluster_pull,
            forces,
        );
        integrate(&mut self.nodes, forces, center, config.gravity, config.damping);

        if self.ticks % ENERGY_LOG_INTERVAL == 0 {
            debug!(
                "tick {}: {} nodes, kinetic energy {:.5}",
                self.ticks,
                node_count,
                self.kinetic_energy()
            );
        }
    }

    /// Quad-tree squares over the current positions, for the debug overlay.
    pub fn quadtree_cells(&self, cells: &mut Vec<QuadtreeCell>) {
        cells.clear();
        let positions = self
            .nodes
            .iter()
            .map(|node| node.position)
            .collect::<Vec<_>>();
        if let Some(tree) = QuadNode::build(&positions) {
            tree.collect_cells(0, cells);
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::Rng;

    use super::*;

    fn card(id: &str, threads: &[&str], sets: &[&str]) -> IdeaCard {
        let mut card = IdeaCard::new(id, id);
        card.threads = threads.iter().map(|id| (*id).to_owned()).collect();
        card.sets = sets.iter().map(|id| (*id).to_owned()).collect();
        card
    }

    fn five_cards() -> Vec<IdeaCard> {
        vec![
            card("a", &["b"], &[]),
            card("b", &["c"], &[]),
            card("c", &["a"], &["s"]),
            card("d", &["e"], &["s"]),
            card("e", &[], &[]),
        ]
    }

    fn sets() -> Vec<IdeaSet> {
        vec![IdeaSet {
            id: "s".to_owned(),
            ..Default::default()
        }]
    }

    fn positions(simulator: &Simulator) -> Vec<Vec2> {
        simulator.nodes().iter().map(|node| node.position).collect()
    }

    fn springs_only() -> SimConfig {
        SimConfig {
            repulsion: 0.0,
            cluster_pull: 0.0,
            gravity: 0.0,
            ..SimConfig::default()
        }
    }

    #[test]
    fn first_sync_seeds_inside_the_bounds_at_rest() {
        let mut simulator = Simulator::new(SimConfig::default(), Some(1));
        assert_eq!(simulator.sync(&five_cards(), &sets()), SyncOutcome::Reseeded);

        assert_eq!(simulator.node_count(), 5);
        for node in simulator.nodes() {
            assert!((0.0..800.0).contains(&node.position.x));
            assert!((0.0..600.0).contains(&node.position.y));
            assert_eq!(node.velocity, Vec2::ZERO);
        }
        assert_eq!(simulator.relations().threads, vec![(0, 1), (0, 2), (1, 2), (3, 4)]);
        assert_eq!(simulator.relations().clusters.len(), 1);
    }

    #[test]
    fn energy_decays_to_rest() {
        let mut simulator = Simulator::new(SimConfig::default(), Some(7));
        simulator.sync(&five_cards(), &sets());

        let mut energies = Vec::new();
        for _ in 0..3000 {
            simulator.tick();
            energies.push(simulator.kinetic_energy());
        }

        let early_peak = energies[..50].iter().copied().fold(0.0_f32, f32::max);
        let late_peak = energies[2500..].iter().copied().fold(0.0_f32, f32::max);
        assert!(early_peak > 0.0);
        assert!(late_peak < early_peak * 1e-3, "{late_peak} vs {early_peak}");
        assert!(energies[2999] < 1e-4);
        assert!(
            simulator
                .nodes()
                .iter()
                .all(|node| node.position.is_finite())
        );
    }

    #[test]
    fn coincident_nodes_separate_after_one_tick() {
        let mut simulator = Simulator::new(SimConfig::default(), Some(2));
        let cards = vec![card("a", &[], &[]), card("b", &[], &[])];
        simulator.sync(&cards, &[]);
        simulator.set_position("a", vec2(400.0, 300.0));
        simulator.set_position("b", vec2(400.0, 300.0));

        simulator.tick();
        let nodes = simulator.nodes();
        assert!((nodes[0].position - nodes[1].position).length() > 0.0);
    }

    #[test]
    fn stale_thread_adds_no_force() {
        let with_stale = vec![card("a", &["ghost"], &[]), card("b", &[], &["nowhere"])];
        let clean = vec![card("a", &[], &[]), card("b", &[], &[])];

        let mut left = Simulator::new(SimConfig::default(), Some(5));
        let mut right = Simulator::new(SimConfig::default(), Some(5));
        left.sync(&with_stale, &sets());
        right.sync(&clean, &sets());
        for _ in 0..20 {
            left.tick();
            right.tick();
        }

        assert_eq!(positions(&left), positions(&right));
        assert!(left.relations().threads.is_empty());
    }

    #[test]
    fn adding_a_card_reseeds_every_node() {
        let mut simulator = Simulator::new(SimConfig::default(), Some(9));
        let mut cards = five_cards();
        simulator.sync(&cards, &sets());
        for _ in 0..500 {
            simulator.tick();
        }
        let settled = positions(&simulator);

        cards.push(card("f", &["a"], &[]));
        assert_eq!(simulator.sync(&cards, &sets()), SyncOutcome::Reseeded);

        assert_eq!(simulator.node_count(), 6);
        for (old, node) in settled.iter().zip(simulator.nodes()) {
            assert_ne!(*old, node.position);
        }
        for node in simulator.nodes() {
            assert_eq!(node.velocity, Vec2::ZERO);
            assert!((0.0..800.0).contains(&node.position.x));
            assert!((0.0..600.0).contains(&node.position.y));
        }
        assert_eq!(simulator.seed_count(), 2);
    }

    #[test]
    fn editing_content_leaves_positions_in_place() {
        let mut simulator = Simulator::new(SimConfig::default(), Some(9));
        let mut cards = five_cards();
        simulator.sync(&cards, &sets());
        for _ in 0..500 {
            simulator.tick();
        }
        let untouched = simulator.clone();

        cards[2].content = "rewritten".to_owned();
        cards[2].title = "New title".to_owned();
        assert_eq!(simulator.sync(&cards, &sets()), SyncOutcome::Refreshed);
        assert_eq!(simulator.nodes(), untouched.nodes());

        let mut untouched = untouched;
        simulator.tick();
        untouched.tick();
        assert_eq!(positions(&simulator), positions(&untouched));
        assert_eq!(simulator.seed_count(), 1);
    }

    #[test]
    fn relinking_refreshes_relations_without_moving_nodes() {
        let mut simulator = Simulator::new(SimConfig::default(), Some(4));
        let mut cards = five_cards();
        simulator.sync(&cards, &sets());
        let before = positions(&simulator);

        cards[4].threads.push("a".to_owned());
        simulator.sync(&cards, &sets());
        assert_eq!(positions(&simulator), before);
        assert!(simulator.relations().is_linked(0, 4));
    }

    #[test]
    fn keep_settled_policy_only_places_new_nodes() {
        let config = SimConfig {
            seed_policy: SeedPolicy::KeepSettled,
            ..SimConfig::default()
        };
        let mut simulator = Simulator::new(config, Some(12));
        let mut cards = five_cards();
        simulator.sync(&cards, &sets());
        for _ in 0..300 {
            simulator.tick();
        }
        let settled = simulator.nodes().to_vec();

        cards.remove(1);
        cards.push(card("f", &[], &[]));
        cards.push(card("g", &[], &[]));
        assert_eq!(simulator.sync(&cards, &sets()), SyncOutcome::Reseeded);

        assert_eq!(simulator.node_count(), 6);
        for node in &settled {
            if node.id == "b" {
                assert_eq!(simulator.index_of("b"), None);
            } else {
                assert_eq!(simulator.position_of(&node.id), Some(node.position));
            }
        }
        let fresh = &simulator.nodes()[simulator.index_of("f").unwrap()];
        assert_eq!(fresh.velocity, Vec2::ZERO);
    }

    #[test]
    fn shuffle_reseeds_without_a_count_change() {
        let config = SimConfig {
            seed_policy: SeedPolicy::KeepSettled,
            ..SimConfig::default()
        };
        let mut simulator = Simulator::new(config, Some(21));
        let cards = five_cards();
        simulator.sync(&cards, &sets());
        let before = positions(&simulator);

        simulator.shuffle(&cards, &sets());
        assert_eq!(simulator.node_count(), 5);
        assert!(positions(&simulator).iter().zip(&before).all(|(a, b)| a != b));
        assert_eq!(simulator.relations().threads.len(), 4);
        assert!(!simulator.needs_reseed(5));
    }

    #[test]
    fn duplicate_card_ids_get_one_node_and_settle_the_trigger() {
        let mut simulator = Simulator::new(SimConfig::default(), Some(3));
        let cards = vec![card("a", &[], &[]), card("a", &[], &[]), card("b", &[], &[])];
        assert_eq!(simulator.sync(&cards, &[]), SyncOutcome::Reseeded);
        assert_eq!(simulator.node_count(), 2);
        assert_eq!(simulator.sync(&cards, &[]), SyncOutcome::Refreshed);
    }

    #[test]
    fn empty_board_ticks_harmlessly() {
        let mut simulator = Simulator::new(SimConfig::default(), Some(3));
        assert_eq!(simulator.sync(&[], &[]), SyncOutcome::Reseeded);
        simulator.tick();
        assert_eq!(simulator.kinetic_energy(), 0.0);
        assert_eq!(simulator.sync(&[], &[]), SyncOutcome::Refreshed);
    }

    #[test]
    fn set_position_stops_the_node() {
        let mut simulator = Simulator::new(SimConfig::default(), Some(3));
        simulator.sync(&five_cards(), &sets());
        simulator.tick();

        assert!(simulator.set_position("c", vec2(10.0, 20.0)));
        assert_eq!(simulator.position_of("c"), Some(vec2(10.0, 20.0)));
        assert_eq!(simulator.nodes()[2].velocity, Vec2::ZERO);
        assert!(!simulator.set_position("ghost", Vec2::ZERO));
    }

    #[test]
    fn gravity_pulls_toward_the_viewport_center() {
        let config = SimConfig {
            repulsion: 0.0,
            ..SimConfig::default()
        };
        let mut simulator = Simulator::new(config, Some(3));
        simulator.sync(&[card("a", &[], &[])], &[]);
        simulator.set_viewport(vec2(2000.0, 1000.0));
        simulator.set_position("a", vec2(0.0, 0.0));

        simulator.tick();
        let velocity = simulator.nodes()[0].velocity;
        assert!((velocity - vec2(1000.0, 500.0) * 0.005 * 0.9).length() < 1e-5);

        simulator.set_viewport(vec2(-1.0, f32::NAN));
        assert_eq!(simulator.center(), vec2(1000.0, 500.0));
    }

    #[test]
    fn tree_repulsion_with_zero_theta_is_exact() {
        let mut rng = StdRng::seed_from_u64(17);
        let points = (0..120)
            .map(|_| vec2(rng.random::<f32>() * 900.0, rng.random::<f32>() * 700.0))
            .collect::<Vec<_>>();
        let repulsion = Repulsion {
            strength: 5000.0,
            softening: 100.0,
        };

        let mut exact = vec![Vec2::ZERO; points.len()];
        accumulate_pairwise_repulsion(&points, repulsion, &mut exact);
        let tree = QuadNode::build(&points).unwrap();
        for (index, expected) in exact.iter().enumerate() {
            let mut force = Vec2::ZERO;
            accumulate_tree_repulsion(&tree, index, &points, repulsion, 0.0, &mut force);
            assert!((force - *expected).length() < 1e-3);
        }
    }

    #[test]
    fn tree_repulsion_approximates_the_exact_sum() {
        let mut rng = StdRng::seed_from_u64(23);
        let points = (0..400)
            .map(|_| vec2(rng.random::<f32>() * 3000.0, rng.random::<f32>() * 3000.0))
            .collect::<Vec<_>>();
        let repulsion = Repulsion {
            strength: 5000.0,
            softening: 100.0,
        };

        let mut exact = vec![Vec2::ZERO; points.len()];
        accumulate_pairwise_repulsion(&points, repulsion, &mut exact);
        let tree = QuadNode::build(&points).unwrap();

        let mut error = 0.0;
        let mut magnitude = 0.0;
        for (index, expected) in exact.iter().enumerate() {
            let mut force = Vec2::ZERO;
            accumulate_tree_repulsion(&tree, index, &points, repulsion, 0.5, &mut force);
            error += (force - *expected).length();
            magnitude += expected.length();
        }
        assert!(error / magnitude < 0.05, "relative error {}", error / magnitude);
    }

    #[test]
    fn large_boards_switch_to_the_quadtree() {
        let cards = (0..300)
            .map(|index| {
                let next = format!("n{}", (index + 1) % 300);
                card(&format!("n{index}"), &[next.as_str()], &[])
            })
            .collect::<Vec<_>>();
        let mut simulator = Simulator::new(SimConfig::default(), Some(8));
        simulator.sync(&cards, &[]);
        assert!(simulator.uses_barnes_hut());

        for _ in 0..30 {
            simulator.tick();
        }
        assert!(
            simulator
                .nodes()
                .iter()
                .all(|node| node.position.is_finite() && node.velocity.is_finite())
        );

        let mut cells = Vec::new();
        simulator.quadtree_cells(&mut cells);
        assert!(cells.len() > 1);
    }

    proptest! {
        #[test]
        fn thread_force_is_equal_and_opposite(
            ax in -1000.0f32..1000.0,
            ay in -1000.0f32..1000.0,
            bx in -1000.0f32..1000.0,
            by in -1000.0f32..1000.0,
            declared_by_b in any::<bool>(),
            both_sides in any::<bool>(),
        ) {
            let a_links = if both_sides || !declared_by_b { vec!["b"] } else { Vec::new() };
            let b_links = if both_sides || declared_by_b { vec!["a"] } else { Vec::new() };
            let cards = vec![card("a", &a_links, &[]), card("b", &b_links, &[])];
            let mut simulator = Simulator::new(springs_only(), Some(1));
            simulator.sync(&cards, &[]);
            simulator.set_position("a", vec2(ax, ay));
            simulator.set_position("b", vec2(bx, by));

            simulator.tick();
            let nodes = simulator.nodes();
            prop_assert_eq!(nodes[0].velocity, -nodes[1].velocity);
        }

        #[test]
        fn shared_positions_never_stay_collapsed(
            x in -2000.0f32..2000.0,
            y in -2000.0f32..2000.0,
        ) {
            let cards = vec![card("a", &[], &[]), card("b", &[], &[])];
            let mut simulator = Simulator::new(SimConfig::default(), Some(1));
            simulator.sync(&cards, &[]);
            simulator.set_position("a", vec2(x, y));
            simulator.set_position("b", vec2(x, y));

            simulator.tick();
            let nodes = simulator.nodes();
            prop_assert!((nodes[0].position - nodes[1].position).length() > 0.0);
        }
    }
}
