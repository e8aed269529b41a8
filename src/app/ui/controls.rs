use std::ops::RangeInclusive;

use eframe::egui::{self, Ui};

use crate::sim::{MAX_DAMPING, SeedPolicy, SimConfig};

use super::super::ViewModel;

fn physics_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: RangeInclusive<f32>,
    label: &str,
    hint: &str,
) -> bool {
    ui.add(
        egui::Slider::new(value, range)
            .text(label)
            .clamping(egui::SliderClamping::Always),
    )
    .on_hover_text(hint)
    .changed()
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Threads Controls");
        ui.separator();
        ui.add_space(4.0);

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                self.draw_filter_controls(ui);
                ui.separator();
                self.draw_layout_controls(ui);
                ui.separator();
                self.draw_physics_tuning(ui);
                ui.separator();
                self.draw_simulation_stats(ui);
            });
    }

    fn draw_filter_controls(&mut self, ui: &mut Ui) {
        let mut changed = false;

        ui.label("Search")
            .on_hover_text("Only cards whose title, content or tags contain this text are laid out.");
        changed |= ui.text_edit_singleline(&mut self.filter.query).changed();

        let project_text = match &self.filter.project {
            Some(id) => self.board.project_name(id).unwrap_or(id.as_str()).to_owned(),
            None => "All projects".to_owned(),
        };
        egui::ComboBox::from_label("Project")
            .selected_text(project_text)
            .show_ui(ui, |ui| {
                changed |= ui
                    .selectable_value(&mut self.filter.project, None, "All projects")
                    .changed();
                for project in &self.board.projects {
                    changed |= ui
                        .selectable_value(
                            &mut self.filter.project,
                            Some(project.id.clone()),
                            project.name.as_str(),
                        )
                        .changed();
                }
            });

        let category_text = self
            .filter
            .category
            .clone()
            .unwrap_or_else(|| "Any category".to_owned());
        egui::ComboBox::from_label("Category")
            .selected_text(category_text)
            .show_ui(ui, |ui| {
                changed |= ui
                    .selectable_value(&mut self.filter.category, None, "Any category")
                    .changed();
                for category in &self.categories {
                    changed |= ui
                        .selectable_value(
                            &mut self.filter.category,
                            Some(category.clone()),
                            category.as_str(),
                        )
                        .changed();
                }
            });

        changed |= ui
            .checkbox(&mut self.filter.archived, "Show archive")
            .on_hover_text("Lay out archived cards instead of active ones.")
            .changed();

        ui.add_space(6.0);
        ui.label("Find")
            .on_hover_text("Fuzzy-highlight matching cards without changing the layout.");
        ui.text_edit_singleline(&mut self.find);

        if changed {
            self.refresh_visible(ui.ctx());
        }
    }

    fn draw_layout_controls(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            let pause_label = if self.paused { "Resume" } else { "Pause" };
            if ui
                .button(pause_label)
                .on_hover_text("Stop or restart the per-frame simulation.")
                .clicked()
            {
                let paused = !self.paused;
                self.set_paused(paused, ui.ctx());
            }

            if ui
                .button("Shuffle")
                .on_hover_text("Scatter every card to a fresh random position.")
                .clicked()
            {
                self.shuffle(ui.ctx());
            }
        });

        ui.label("When the card count changes");
        let mut config = *self.simulator.config();
        let mut policy_changed = false;
        ui.horizontal_wrapped(|ui| {
            for policy in [SeedPolicy::Full, SeedPolicy::KeepSettled] {
                policy_changed |= ui
                    .selectable_value(&mut config.seed_policy, policy, policy.label())
                    .changed();
            }
        });
        if policy_changed {
            self.simulator.set_config(config);
        }

        ui.checkbox(&mut self.show_quadtree_overlay, "Show quadtree overlay")
            .on_hover_text("Draw the repulsion quad-tree cells over the canvas.");
        ui.checkbox(&mut self.show_fps_bar, "FPS display")
            .on_hover_text("Show frame rate and tick time in the header.");
    }

    fn draw_physics_tuning(&mut self, ui: &mut Ui) {
        let mut config = *self.simulator.config();
        let mut changed = false;

        egui::CollapsingHeader::new("Physics tuning")
            .default_open(false)
            .show(ui, |ui| {
                changed |= ui
                    .add(
                        egui::Slider::new(&mut config.repulsion, 0.0..=50_000.0)
                            .logarithmic(true)
                            .text("Repulsion"),
                    )
                    .on_hover_text("How strongly every pair of cards pushes apart.")
                    .changed();
                changed |= physics_slider(
                    ui,
                    &mut config.softening,
                    1.0..=1_000.0,
                    "Softening",
                    "Added to the squared distance so close cards do not explode apart.",
                );
                changed |= physics_slider(
                    ui,
                    &mut config.rest_length,
                    20.0..=400.0,
                    "Thread length",
                    "Distance a thread spring settles at.",
                );
                changed |= physics_slider(
                    ui,
                    &mut config.spring,
                    0.0..=0.05,
                    "Thread spring",
                    "Stiffness of the spring along each thread.",
                );
                changed |= physics_slider(
                    ui,
                    &mut config.cluster_pull,
                    0.0..=0.02,
                    "Set pull",
                    "Attraction of set members toward their shared centroid.",
                );
                changed |= physics_slider(
                    ui,
                    &mut config.gravity,
                    0.0..=0.05,
                    "Center gravity",
                    "Pull of every card toward the middle of the canvas.",
                );
                changed |= physics_slider(
                    ui,
                    &mut config.damping,
                    0.5..=MAX_DAMPING,
                    "Velocity damping",
                    "Fraction of velocity kept after each tick.",
                );
                changed |= physics_slider(
                    ui,
                    &mut config.barnes_hut_theta,
                    0.2..=1.2,
                    "Quadtree accuracy",
                    "Opening angle for the approximation. Lower is more exact and slower.",
                );
                changed |= ui
                    .add(
                        egui::Slider::new(&mut config.barnes_hut_threshold, 16..=4096)
                            .logarithmic(true)
                            .text("Quadtree above"),
                    )
                    .on_hover_text("Card count above which repulsion uses the quad-tree.")
                    .changed();

                if ui.button("Reset to defaults").clicked() {
                    config = SimConfig {
                        seed_policy: config.seed_policy,
                        ..SimConfig::default()
                    };
                    changed = true;
                }
            });

        if changed {
            self.simulator.set_config(config);
        }
    }

    fn draw_simulation_stats(&self, ui: &mut Ui) {
        egui::Grid::new("simulation_stats")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                ui.label("Nodes");
                ui.label(self.simulator.node_count().to_string());
                ui.end_row();

                ui.label("Threads");
                ui.label(self.simulator.relations().threads.len().to_string());
                ui.end_row();

                ui.label("Set clusters");
                ui.label(self.simulator.relations().clusters.len().to_string());
                ui.end_row();

                ui.label("Ticks");
                ui.label(self.simulator.tick_count().to_string());
                ui.end_row();

                ui.label("Seeds");
                ui.label(self.simulator.seed_count().to_string());
                ui.end_row();

                ui.label("Kinetic energy");
                ui.label(format!("{:.4}", self.simulator.kinetic_energy()));
                ui.end_row();

                ui.label("Repulsion");
                ui.label(if self.simulator.uses_barnes_hut() {
                    "quad-tree"
                } else {
                    "exact"
                });
                ui.end_row();
            });
    }
}
