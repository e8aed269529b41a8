use eframe::egui::{Vec2, vec2};

use super::SimNode;
use super::quadtree::QuadNode;
use super::relations::Cluster;

const MIN_SPRING_DISTANCE: f32 = 1e-4;

#[derive(Clone, Copy, Debug)]
pub(super) struct Repulsion {
    pub(super) strength: f32,
    pub(super) softening: f32,
}

impl Repulsion {
    /// Push on `low` away from `high`; the caller applies the negation to
    /// `high`. `delta` is `pos_low - pos_high`.
    fn between(self, delta: Vec2, low: usize, high: usize) -> Vec2 {
        let distance_sq = delta.length_sq();
        let direction = if distance_sq > 0.0 {
            delta / distance_sq.sqrt().max(1.0)
        } else {
            fallback_direction(low, high)
        };
        direction * (self.strength / (distance_sq + self.softening))
    }
}

/// Deterministic unit vector for a pair sitting on the same point.
fn fallback_direction(low: usize, high: usize) -> Vec2 {
    let angle = ((low as f32) * 0.618_034 + (high as f32) * 0.414_214 + 0.37) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

pub(super) fn accumulate_pairwise_repulsion(
    positions: &[Vec2],
    repulsion: Repulsion,
    forces: &mut [Vec2],
) {
    for low in 0..positions.len() {
        for high in (low + 1)..positions.len() {
            let push = repulsion.between(positions[low] - positions[high], low, high);
            forces[low] += push;
            forces[high] -= push;
        }
    }
}

/// Barnes-Hut approximation of the repulsion on `index`.
pub(super) fn accumulate_tree_repulsion(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    repulsion: Repulsion,
    theta: f32,
    force: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];
    if node.is_leaf() {
        for &other in &node.indices {
            if other == index {
                continue;
            }
            let delta = point - positions[other];
            *force += if index < other {
                repulsion.between(delta, index, other)
            } else {
                -repulsion.between(-delta, other, index)
            };
        }
        return;
    }

    let delta = point - node.center_of_mass;
    let distance_sq = delta.length_sq();
    let distance = distance_sq.sqrt().max(1.0);
    let far_enough = !node.bounds.contains(point) && node.bounds.side() / distance < theta;
    if far_enough {
        *force += (delta / distance) * (repulsion.strength * node.mass / (distance_sq + repulsion.softening));
        return;
    }

    for child in node.children() {
        accumulate_tree_repulsion(child, index, positions, repulsion, theta, force);
    }
}

/// Hooke springs toward `rest_length` along each unique thread pair.
pub(super) fn accumulate_thread_springs(
    positions: &[Vec2],
    threads: &[(usize, usize)],
    rest_length: f32,
    stiffness: f32,
    forces: &mut [Vec2],
) {
    for &(a, b) in threads {
        if a >= positions.len() || b >= positions.len() || a == b {
            continue;
        }

        let delta = positions[b] - positions[a];
        let distance = delta.length();
        if distance <= MIN_SPRING_DISTANCE {
            continue;
        }

        let pull = (delta / distance) * ((distance - rest_length) * stiffness);
        forces[a] += pull;
        forces[b] -= pull;
    }
}

pub(super) fn accumulate_cluster_pull(
    positions: &[Vec2],
    clusters: &[Cluster],
    strength: f32,
    forces: &mut [Vec2],
) {
    for cluster in clusters {
        let mut centroid = Vec2::ZERO;
        let mut count = 0usize;
        for &member in &cluster.members {
            if let Some(position) = positions.get(member) {
                centroid += *position;
                count += 1;
            }
        }
        if count < 2 {
            continue;
        }
        centroid /= count as f32;

        for &member in &cluster.members {
            if let Some(position) = positions.get(member) {
                forces[member] += (centroid - *position) * strength;
            }
        }
    }
}

/// Center gravity, damping and position integration, in that order.
pub(super) fn integrate(
    nodes: &mut [SimNode],
    forces: &[Vec2],
    center: Vec2,
    gravity: f32,
    damping: f32,
) {
    for (node, force) in nodes.iter_mut().zip(forces) {
        node.velocity += *force;
        node.velocity += (center - node.position) * gravity;
        node.velocity *= damping;
        node.position += node.velocity;
    }
}
