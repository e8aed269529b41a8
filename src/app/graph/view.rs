use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, StrokeKind, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::board::IdeaCard;
use crate::sim::{CARD_HEIGHT, CARD_WIDTH, connections, placements};
use crate::util::truncate_label;

use super::super::render_utils::{
    blend_color, card_accent, dim_color, draw_background, draw_thread, edge_visible,
    rect_visible, world_to_screen,
};
use super::super::{FindCache, ViewModel};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

fn card_matches(matcher: &SkimMatcherV2, card: &IdeaCard, query: &str) -> bool {
    fuzzy_match_score(matcher, card.display_title(), query).is_some()
        || card
            .all_tags()
            .any(|tag| fuzzy_match_score(matcher, tag, query).is_some())
}

impl ViewModel {
    fn cached_find_matches(&mut self) -> Option<Arc<HashSet<String>>> {
        let query = self.find.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.find_cache
            && cached.board_revision == self.board_revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .cards
            .iter()
            .filter(|card| card_matches(&matcher, card, query))
            .map(|card| card.id.clone())
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.find_cache = Some(FindCache {
            query: query.to_owned(),
            board_revision: self.board_revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    /// Screen rect per node index. Nodes whose card left the view get an
    /// empty rect.
    fn update_card_rects(&mut self, rect: Rect) {
        let size = vec2(CARD_WIDTH, CARD_HEIGHT) * self.zoom;
        let card_rects = &mut self.view_scratch.card_rects;
        card_rects.clear();
        card_rects.resize(self.simulator.node_count(), Rect::NOTHING);

        for placement in placements(&self.simulator, &self.cards) {
            let min = world_to_screen(rect, self.pan, self.zoom, placement.position);
            card_rects[placement.node] = Rect::from_min_size(min, size);
        }
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);
        self.simulator.set_viewport(rect.size());

        self.update_card_rects(rect);
        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer));
        let grabbed = Self::hovered_card(&self.view_scratch.card_rects, pointer)
            .map(|index| self.simulator.nodes()[index].id.clone());
        self.handle_card_drag(rect, &response, grabbed.as_deref());

        let started = Instant::now();
        if self.frame_loop.drive(ui.ctx(), &mut self.simulator) {
            self.tick_millis = started.elapsed().as_secs_f32() * 1000.0;
        }
        if self.dragging.is_some() {
            ui.ctx().request_repaint();
        }

        self.update_card_rects(rect);
        let hovered = Self::hovered_card(&self.view_scratch.card_rects, pointer);
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = if self.dragging.is_some() {
                    egui::CursorIcon::Grabbing
                } else {
                    egui::CursorIcon::Grab
                };
            });
        }

        let pending_selection = if response.clicked_by(egui::PointerButton::Primary) {
            Some(grabbed.clone())
        } else {
            None
        };

        let find_matches = self.cached_find_matches();
        let find_active = find_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());

        if self.show_quadtree_overlay {
            self.simulator
                .quadtree_cells(&mut self.view_scratch.quadtree_cells);
            for cell in &self.view_scratch.quadtree_cells {
                let half = vec2(cell.half_extent, cell.half_extent);
                let min = world_to_screen(rect, self.pan, self.zoom, cell.center - half);
                let max = world_to_screen(rect, self.pan, self.zoom, cell.center + half);

                let alpha = if cell.is_leaf { 110 } else { 55 };
                let line_width = (1.4 - (cell.depth as f32 * 0.09)).clamp(0.45, 1.4);
                painter.rect_stroke(
                    Rect::from_min_max(min, max),
                    0.0,
                    Stroke::new(line_width, Color32::from_rgba_unmultiplied(106, 198, 255, alpha)),
                    StrokeKind::Middle,
                );
            }
        }

        let selected_index = self
            .selected
            .as_deref()
            .and_then(|id| self.simulator.index_of(id));
        let zoom_sqrt = self.zoom.sqrt();

        let mut visible_thread_count = 0usize;
        for line in connections(&self.simulator, &self.cards, self.anchor) {
            let start = world_to_screen(rect, self.pan, self.zoom, line.start);
            let end = world_to_screen(rect, self.pan, self.zoom, line.end);
            if !edge_visible(rect, start, end, 2.0) {
                continue;
            }

            let touches_selection =
                selected_index.is_some_and(|index| index == line.from || index == line.to);
            let (width, color) = if touches_selection {
                ((2.4 * zoom_sqrt).clamp(1.2, 4.2), Color32::from_rgb(241, 146, 94))
            } else if selected_index.is_some() {
                (
                    (1.0 * zoom_sqrt).clamp(0.5, 2.0),
                    Color32::from_rgba_unmultiplied(96, 96, 96, 120),
                )
            } else {
                (
                    (1.4 * zoom_sqrt).clamp(0.7, 3.0),
                    Color32::from_rgba_unmultiplied(150, 146, 140, 200),
                )
            };
            draw_thread(&painter, start, end, width, color);
            visible_thread_count += 1;
        }
        self.visible_thread_count = visible_thread_count;

        let placed = placements(&self.simulator, &self.cards);
        let selected_color = Color32::from_rgb(245, 206, 93);
        let base_fill = Color32::from_gray(36);
        let rounding = (6.0 * self.zoom).clamp(1.0, 10.0);
        let title_size = (13.0 * self.zoom).clamp(6.0, 24.0);
        let mut visible_card_count = 0usize;
        let mut selection_animating = false;

        for placement in &placed {
            let card_rect = self.view_scratch.card_rects[placement.node];
            if !rect_visible(rect, card_rect.min, card_rect.size()) {
                continue;
            }
            visible_card_count += 1;

            let card = placement.card;
            let is_selected = selected_index == Some(placement.node);
            let is_hovered = hovered == Some(placement.node);
            let is_linked = selected_index
                .is_some_and(|index| self.simulator.relations().is_linked(index, placement.node));
            let is_find_match = find_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&card.id));

            let fill = if is_hovered {
                Color32::from_gray(54)
            } else if is_find_match {
                blend_color(base_fill, Color32::from_rgb(103, 196, 255), 0.32)
            } else if is_linked {
                blend_color(base_fill, Color32::from_rgb(246, 137, 92), 0.22)
            } else if find_active || (selected_index.is_some() && !is_selected) {
                dim_color(base_fill, 0.72)
            } else {
                base_fill
            };

            let selection_mix = ui.ctx().animate_bool(
                ui.make_persistent_id(("card-selection", card.id.as_str())),
                is_selected,
            );
            if selection_mix > 0.0 && selection_mix < 1.0 {
                selection_animating = true;
            }

            let accent = card_accent(&card.color);
            painter.rect_filled(card_rect, rounding, fill);
            painter.rect_filled(
                Rect::from_min_size(card_rect.min, vec2(card_rect.width(), (4.0 * self.zoom).max(1.5))),
                0.0,
                accent,
            );
            painter.rect_stroke(
                card_rect,
                rounding,
                Stroke::new(
                    1.0 + selection_mix * 1.6,
                    blend_color(accent, selected_color, selection_mix),
                ),
                StrokeKind::Inside,
            );

            if self.zoom < 0.35 {
                continue;
            }
            let card_painter = painter.with_clip_rect(card_rect.intersect(rect));
            card_painter.text(
                card_rect.min + vec2(10.0, 12.0) * self.zoom,
                Align2::LEFT_TOP,
                truncate_label(card.display_title(), 24),
                FontId::proportional(title_size),
                Color32::from_gray(236),
            );
            if self.zoom > 0.6 && !card.content.trim().is_empty() {
                card_painter.text(
                    card_rect.min + vec2(10.0, 40.0) * self.zoom,
                    Align2::LEFT_TOP,
                    truncate_label(&card.content, 30),
                    FontId::proportional(title_size * 0.82),
                    Color32::from_gray(160),
                );
            }
            if self.zoom > 0.8 && !card.threads.is_empty() {
                card_painter.text(
                    card_rect.left_bottom() + vec2(10.0, -10.0) * self.zoom,
                    Align2::LEFT_BOTTOM,
                    format!("{} threads", card.threads.len()),
                    FontId::proportional(title_size * 0.72),
                    Color32::from_gray(128),
                );
            }
        }
        self.visible_card_count = visible_card_count;

        if selection_animating {
            ui.ctx().request_repaint();
        }

        if self.cards.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No cards match the current filter.",
                FontId::proportional(15.0),
                Color32::from_gray(170),
            );
        }

        if let Some(index) = hovered
            && let Some(placement) = placed.iter().find(|placement| placement.node == index)
        {
            let card = placement.card;
            let project = self
                .board
                .project_name(&card.project_id)
                .unwrap_or(card.project_id.as_str());
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{}  |  {}  |  threads {}  |  tags {}",
                    card.display_title(),
                    project,
                    card.threads.len(),
                    card.tag_count()
                ),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if let Some(selected) = pending_selection {
            self.set_selected(selected);
        }
    }
}
