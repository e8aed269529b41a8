use std::collections::VecDeque;

use eframe::egui::{self, Align, Context, Layout, Vec2};
use log::debug;

use crate::board::{Board, visible_cards, visible_sets};
use crate::sim::{Anchor, FrameLoop, Simulator};

use super::super::{Launch, ViewModel, ViewScratch};

impl ViewModel {
    pub(in crate::app) fn new(ctx: &Context, board: Board, launch: &Launch) -> Self {
        let mut model = Self {
            board,
            source: launch.source_label(),
            filter: launch.filter.clone(),
            cards: Vec::new(),
            sets: Vec::new(),
            categories: Vec::new(),
            simulator: Simulator::new(launch.config, launch.seed),
            frame_loop: FrameLoop::default(),
            paused: false,
            anchor: Anchor::default(),
            find: String::new(),
            find_cache: None,
            selected: None,
            link_target: None,
            dragging: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            show_quadtree_overlay: false,
            view_scratch: ViewScratch::default(),
            board_revision: 0,
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
            tick_millis: 0.0,
            visible_card_count: 0,
            visible_thread_count: 0,
        };
        model.refresh_visible(ctx);
        model
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context, reload_requested: &mut bool, is_loading: bool) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Threads");
                    ui.separator();
                    ui.label(self.source.as_str());
                    ui.label(format!("cards: {}", self.board.card_count()));
                    ui.label(format!("threads: {}", self.board.thread_count()));
                    ui.label(format!("sets: {}", self.board.sets.len()));
                    let reload_button = ui.add_enabled(!is_loading, egui::Button::new("Reload board"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.visible_graph_text());
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                if is_loading {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Reloading board...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                } else {
                    self.draw_graph(ui);
                }
            });
    }

    /// Recomputes the visible cards after a filter or board edit. A new card
    /// count restarts the frame loop around a re-seed; anything else only
    /// refreshes the relations the forces read.
    pub(in crate::app) fn refresh_visible(&mut self, ctx: &Context) {
        self.cards = visible_cards(&self.board, &self.filter);
        self.sets = visible_sets(&self.board, &self.filter);
        self.categories = self.board.categories();
        self.board_revision += 1;

        if self.simulator.needs_reseed(self.cards.len()) {
            self.frame_loop.cancel();
            self.dragging = None;
            self.simulator.reseed(&self.cards, &self.sets);
            if !self.paused {
                self.frame_loop.start(ctx);
            }
        } else {
            self.simulator.refresh(&self.cards, &self.sets);
            ctx.request_repaint();
        }
        debug!(
            "{} of {} cards visible (revision {})",
            self.cards.len(),
            self.board.card_count(),
            self.board_revision
        );
    }

    pub(in crate::app) fn shuffle(&mut self, ctx: &Context) {
        self.frame_loop.cancel();
        self.dragging = None;
        self.simulator.shuffle(&self.cards, &self.sets);
        if !self.paused {
            self.frame_loop.start(ctx);
        }
    }

    pub(in crate::app) fn set_paused(&mut self, paused: bool, ctx: &Context) {
        self.paused = paused;
        if paused {
            self.frame_loop.cancel();
        } else {
            self.frame_loop.start(ctx);
        }
    }

    pub(in crate::app) fn unmount(&mut self) {
        self.frame_loop.cancel();
        self.dragging = None;
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        if self.selected == selected {
            return;
        }

        self.selected = selected;
        self.link_target = None;
    }
}
