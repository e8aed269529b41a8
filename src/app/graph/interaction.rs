use eframe::egui::{self, Pos2, Rect, Ui};

use super::super::render_utils::screen_to_world;
use super::super::{DragGrab, ViewModel};

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.1, 4.0);
        self.pan = pointer - rect.min - (world_before * self.zoom);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    /// Topmost card under the pointer. Later rects are drawn on top.
    pub(in crate::app) fn hovered_card(card_rects: &[Rect], pointer: Option<Pos2>) -> Option<usize> {
        let pointer = pointer?;
        card_rects.iter().rposition(|card| card.contains(pointer))
    }

    /// Primary drag moves the grabbed card's node. The node's velocity is
    /// zeroed on every move, so it stays where it is dropped until forces
    /// act on it again.
    pub(in crate::app) fn handle_card_drag(
        &mut self,
        rect: Rect,
        response: &egui::Response,
        grabbed: Option<&str>,
    ) {
        let pointer = response.interact_pointer_pos();

        if response.drag_started_by(egui::PointerButton::Primary)
            && let (Some(id), Some(pointer)) = (grabbed, pointer)
            && let Some(position) = self.simulator.position_of(id)
        {
            let world = screen_to_world(rect, self.pan, self.zoom, pointer);
            self.dragging = Some(DragGrab {
                id: id.to_owned(),
                offset: world - position,
            });
        }

        if response.dragged_by(egui::PointerButton::Primary)
            && let (Some(grab), Some(pointer)) = (&self.dragging, pointer)
        {
            let world = screen_to_world(rect, self.pan, self.zoom, pointer);
            self.simulator.set_position(&grab.id, world - grab.offset);
        }

        if response.drag_stopped() {
            self.dragging = None;
        }
    }
}
