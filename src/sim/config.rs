use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};

/// Upper bound on the velocity damping factor; damping must stay below 1.
pub const MAX_DAMPING: f32 = 0.99;

/// What happens to existing nodes when the visible card count changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedPolicy {
    /// Every node gets a fresh random position.
    #[default]
    Full,
    /// Nodes whose card survives keep their state; only new nodes are placed.
    KeepSettled,
}

impl SeedPolicy {
    pub fn label(self) -> &'static str {
        match self {
            Self::Full => "Re-seed everything",
            Self::KeepSettled => "Keep settled cards",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub repulsion: f32,
    pub softening: f32,
    pub rest_length: f32,
    pub spring: f32,
    pub cluster_pull: f32,
    pub gravity: f32,
    pub damping: f32,
    pub seed_width: f32,
    pub seed_height: f32,
    /// Above this many nodes repulsion switches to the quad-tree approximation.
    pub barnes_hut_threshold: usize,
    pub barnes_hut_theta: f32,
    pub seed_policy: SeedPolicy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            repulsion: 5000.0,
            softening: 100.0,
            rest_length: 150.0,
            spring: 0.005,
            cluster_pull: 0.002,
            gravity: 0.005,
            damping: 0.9,
            seed_width: 800.0,
            seed_height: 600.0,
            barnes_hut_threshold: 256,
            barnes_hut_theta: 0.72,
            seed_policy: SeedPolicy::Full,
        }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read layout config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid layout config {}", path.display()))
    }

    pub fn seed_bounds(&self) -> Vec2 {
        vec2(self.seed_width, self.seed_height)
    }

    /// Copy with every value forced into a range the integrator is stable in.
    pub(super) fn sanitized(self) -> Self {
        let defaults = Self::default();
        let finite = |value: f32, fallback: f32| if value.is_finite() { value } else { fallback };

        Self {
            repulsion: finite(self.repulsion, defaults.repulsion).max(0.0),
            softening: finite(self.softening, defaults.softening).max(1.0),
            rest_length: finite(self.rest_length, defaults.rest_length).max(0.0),
            spring: finite(self.spring, defaults.spring).clamp(0.0, 0.5),
            cluster_pull: finite(self.cluster_pull, defaults.cluster_pull).clamp(0.0, 0.5),
            gravity: finite(self.gravity, defaults.gravity).clamp(0.0, 0.5),
            damping: finite(self.damping, defaults.damping).clamp(0.0, MAX_DAMPING),
            seed_width: finite(self.seed_width, defaults.seed_width).max(1.0),
            seed_height: finite(self.seed_height, defaults.seed_height).max(1.0),
            barnes_hut_threshold: self.barnes_hut_threshold,
            barnes_hut_theta: finite(self.barnes_hut_theta, defaults.barnes_hut_theta)
                .clamp(0.0, 1.5),
            seed_policy: self.seed_policy,
        }
    }
}
