use eframe::egui::{self, Color32, RichText, Ui};
use log::info;

use crate::util::{truncate_label, unix_millis};

use super::super::ViewModel;

enum CardEdit {
    ToggleThread(String),
    SetArchived(bool),
    Delete,
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Card Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Select a card on the canvas.");
            return;
        };

        let Some(card) = self.board.card(&selected_id).cloned() else {
            ui.label("Selected card no longer exists on the board.");
            if ui.button("Clear selection").clicked() {
                self.set_selected(None);
            }
            return;
        };

        let mut edit = None;
        let mut select = None;

        ui.label(RichText::new(card.display_title()).strong().size(16.0));
        let project = self
            .board
            .project_name(&card.project_id)
            .unwrap_or(card.project_id.as_str());
        ui.small(format!("{project}  ·  {}", card.color));
        if card.is_archived {
            ui.colored_label(Color32::from_rgb(217, 160, 26), "Archived");
        }
        if self.simulator.index_of(&card.id).is_none() {
            ui.weak("Not in the current view");
        }
        ui.add_space(6.0);

        if card.content.trim().is_empty() {
            ui.weak("No content.");
        } else {
            egui::ScrollArea::vertical()
                .id_salt("card_content_scroll")
                .max_height(160.0)
                .show(ui, |ui| {
                    ui.label(card.content.as_str());
                });
        }

        if card.tag_count() > 0 {
            ui.separator();
            ui.label(RichText::new("Tags").strong());
            for (category, tags) in &card.tags {
                if !tags.is_empty() {
                    ui.label(format!("{category}: {}", tags.join(", ")));
                }
            }
        }

        if !card.sets.is_empty() {
            ui.separator();
            ui.label(RichText::new("Sets").strong());
            for set_id in &card.sets {
                ui.label(self.board.set_name(set_id).unwrap_or(set_id.as_str()));
            }
        }

        ui.separator();
        ui.label(RichText::new("Threads").strong());
        if card.threads.is_empty() {
            ui.weak("No threads yet.");
        }
        for target_id in &card.threads {
            ui.horizontal(|ui| {
                match self.board.card(target_id) {
                    Some(target) => {
                        if ui.link(truncate_label(target.display_title(), 32)).clicked() {
                            select = Some(target.id.clone());
                        }
                    }
                    None => {
                        ui.weak(format!("missing card {target_id}"));
                    }
                }
                if ui.small_button("Unlink").clicked() {
                    edit = Some(CardEdit::ToggleThread(target_id.clone()));
                }
            });
        }

        let linked_from = self
            .board
            .cards
            .iter()
            .filter(|other| other.links_to(&card.id) && !card.links_to(&other.id))
            .map(|other| (other.id.clone(), truncate_label(other.display_title(), 32)))
            .collect::<Vec<_>>();
        if !linked_from.is_empty() {
            ui.add_space(4.0);
            ui.label(RichText::new("Linked from").weak());
            for (id, title) in linked_from {
                if ui.link(title).clicked() {
                    select = Some(id);
                }
            }
        }

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let target_text = self
                .link_target
                .as_deref()
                .and_then(|id| self.board.card(id))
                .map(|target| truncate_label(target.display_title(), 24))
                .unwrap_or_else(|| "Choose a card".to_owned());
            egui::ComboBox::from_id_salt("link_target")
                .selected_text(target_text)
                .show_ui(ui, |ui| {
                    for candidate in &self.cards {
                        if candidate.id == card.id || card.links_to(&candidate.id) {
                            continue;
                        }
                        ui.selectable_value(
                            &mut self.link_target,
                            Some(candidate.id.clone()),
                            truncate_label(candidate.display_title(), 32),
                        );
                    }
                });

            let can_link = self.link_target.is_some();
            if ui.add_enabled(can_link, egui::Button::new("Link")).clicked()
                && let Some(target) = self.link_target.take()
            {
                edit = Some(CardEdit::ToggleThread(target));
            }
        });

        ui.separator();
        ui.horizontal(|ui| {
            let archive_label = if card.is_archived { "Restore" } else { "Archive" };
            if ui.button(archive_label).clicked() {
                edit = Some(CardEdit::SetArchived(!card.is_archived));
            }
            if ui
                .button(RichText::new("Delete").color(Color32::from_rgb(215, 38, 61)))
                .clicked()
            {
                edit = Some(CardEdit::Delete);
            }
        });

        if let Some(edit) = edit {
            self.apply_card_edit(ui.ctx(), &card.id, edit);
        } else if let Some(id) = select {
            self.set_selected(Some(id));
        }
    }

    fn apply_card_edit(&mut self, ctx: &egui::Context, card_id: &str, edit: CardEdit) {
        let changed = match edit {
            CardEdit::ToggleThread(target) => self.board.toggle_thread(card_id, &target, unix_millis()),
            CardEdit::SetArchived(archived) => {
                self.board.set_archived(card_id, archived, unix_millis())
            }
            CardEdit::Delete => {
                let removed = self.board.delete_card(card_id);
                if let Some(card) = &removed {
                    info!("deleted card {} ({})", card.id, card.display_title());
                    self.set_selected(None);
                }
                removed.is_some()
            }
        };

        if changed {
            self.refresh_visible(ctx);
        }
    }
}
