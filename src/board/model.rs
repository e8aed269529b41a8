use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaCard {
    pub id: String,
    #[serde(default = "default_project_id")]
    pub project_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub threads: Vec<String>,
    #[serde(default)]
    pub sets: Vec<String>,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub updated_at: u64,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub is_archived: bool,
}

impl IdeaCard {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            project_id: default_project_id(),
            title: title.into(),
            color: default_color(),
            ..Default::default()
        }
    }

    pub fn display_title(&self) -> &str {
        let title = self.title.trim();
        if title.is_empty() { "Untitled" } else { title }
    }

    pub fn tag_count(&self) -> usize {
        self.tags.values().map(Vec::len).sum()
    }

    pub fn all_tags(&self) -> impl Iterator<Item = &str> {
        self.tags.values().flatten().map(String::as_str)
    }

    pub fn links_to(&self, target_id: &str) -> bool {
        self.threads.iter().any(|id| id == target_id)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaSet {
    pub id: String,
    #[serde(default = "default_project_id")]
    pub project_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created_at: u64,
    /// Explicit members. Cards can also join a set through their own `sets` list.
    #[serde(default)]
    pub card_ids: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Board {
    pub cards: Vec<IdeaCard>,
    pub sets: Vec<IdeaSet>,
    pub projects: Vec<Project>,
}

impl Board {
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub fn thread_count(&self) -> usize {
        self.cards.iter().map(|card| card.threads.len()).sum()
    }

    pub fn card(&self, id: &str) -> Option<&IdeaCard> {
        self.cards.iter().find(|card| card.id == id)
    }

    fn card_mut(&mut self, id: &str) -> Option<&mut IdeaCard> {
        self.cards.iter_mut().find(|card| card.id == id)
    }

    pub fn set_name(&self, id: &str) -> Option<&str> {
        self.sets
            .iter()
            .find(|set| set.id == id)
            .map(|set| set.name.as_str())
    }

    pub fn project_name(&self, id: &str) -> Option<&str> {
        self.projects
            .iter()
            .find(|project| project.id == id)
            .map(|project| project.name.as_str())
    }

    /// Category names used by at least one card, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut names = self
            .cards
            .iter()
            .flat_map(|card| {
                card.tags
                    .iter()
                    .filter(|(_, tags)| !tags.is_empty())
                    .map(|(name, _)| name.clone())
            })
            .collect::<Vec<_>>();
        names.sort();
        names.dedup();
        names
    }

    /// Adds or removes `target_id` from the card's own thread list. Links are
    /// declared one-sided; the layout treats them as symmetric.
    pub fn toggle_thread(&mut self, card_id: &str, target_id: &str, now: u64) -> bool {
        if card_id == target_id {
            return false;
        }
        let Some(card) = self.card_mut(card_id) else {
            return false;
        };

        if let Some(position) = card.threads.iter().position(|id| id == target_id) {
            card.threads.remove(position);
        } else {
            card.threads.push(target_id.to_owned());
        }
        card.updated_at = now;
        true
    }

    pub fn set_archived(&mut self, card_id: &str, archived: bool, now: u64) -> bool {
        let Some(card) = self.card_mut(card_id) else {
            return false;
        };
        if card.is_archived == archived {
            return false;
        }
        card.is_archived = archived;
        card.updated_at = now;
        true
    }

    /// Removes the card and every thread pointing at it.
    pub fn delete_card(&mut self, card_id: &str) -> Option<IdeaCard> {
        let position = self.cards.iter().position(|card| card.id == card_id)?;
        let removed = self.cards.remove(position);
        for card in &mut self.cards {
            card.threads.retain(|id| id != card_id);
        }
        for set in &mut self.sets {
            set.card_ids.retain(|id| id != card_id);
        }
        Some(removed)
    }
}

fn default_project_id() -> String {
    "general".to_owned()
}

fn default_color() -> String {
    "white".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        let mut a = IdeaCard::new("a", "Lighthouse");
        a.threads = vec!["b".to_owned()];
        let mut b = IdeaCard::new("b", "Keeper");
        b.threads = vec!["a".to_owned(), "c".to_owned()];
        let c = IdeaCard::new("c", "");
        Board {
            cards: vec![a, b, c],
            sets: vec![IdeaSet {
                id: "s".to_owned(),
                card_ids: vec!["c".to_owned(), "a".to_owned()],
                ..Default::default()
            }],
            projects: Vec::new(),
        }
    }

    #[test]
    fn toggle_thread_is_one_sided() {
        let mut board = board();
        assert!(board.toggle_thread("c", "a", 7));
        assert!(board.card("c").is_some_and(|card| card.links_to("a")));
        assert!(!board.card("a").is_some_and(|card| card.links_to("c")));
        assert_eq!(board.card("c").map(|card| card.updated_at), Some(7));

        assert!(board.toggle_thread("c", "a", 8));
        assert!(!board.card("c").is_some_and(|card| card.links_to("a")));
    }

    #[test]
    fn toggle_thread_rejects_self_and_unknown_cards() {
        let mut board = board();
        assert!(!board.toggle_thread("a", "a", 1));
        assert!(!board.toggle_thread("missing", "a", 1));
    }

    #[test]
    fn delete_card_scrubs_references() {
        let mut board = board();
        let removed = board.delete_card("a");
        assert_eq!(removed.map(|card| card.id), Some("a".to_owned()));
        assert_eq!(board.card_count(), 2);
        assert_eq!(
            board.card("b").map(|card| card.threads.clone()),
            Some(vec!["c".to_owned()])
        );
        assert_eq!(board.sets[0].card_ids, vec!["c".to_owned()]);
        assert!(board.delete_card("a").is_none());
    }

    #[test]
    fn untitled_cards_get_a_display_title() {
        let board = board();
        assert_eq!(board.card("c").map(IdeaCard::display_title), Some("Untitled"));
    }
}
