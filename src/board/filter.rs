use super::model::{Board, IdeaCard, IdeaSet};

/// Which cards the threads view shows. The length of the resulting list is
/// what drives a layout re-seed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CardFilter {
    pub query: String,
    pub project: Option<String>,
    pub category: Option<String>,
    pub archived: bool,
}

impl CardFilter {
    pub fn matches(&self, card: &IdeaCard) -> bool {
        if card.is_archived != self.archived {
            return false;
        }

        if let Some(project) = &self.project
            && &card.project_id != project
        {
            return false;
        }

        if !self.matches_query(card) {
            return false;
        }

        match &self.category {
            Some(category) => card.tags.get(category).is_some_and(|tags| !tags.is_empty()),
            None => true,
        }
    }

    fn matches_query(&self, card: &IdeaCard) -> bool {
        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        card.title.to_lowercase().contains(&query)
            || card.content.to_lowercase().contains(&query)
            || card.all_tags().any(|tag| tag.to_lowercase().contains(&query))
    }

    pub fn includes_set(&self, set: &IdeaSet) -> bool {
        self.project
            .as_ref()
            .is_none_or(|project| &set.project_id == project)
    }
}

pub fn visible_cards(board: &Board, filter: &CardFilter) -> Vec<IdeaCard> {
    board
        .cards
        .iter()
        .filter(|card| filter.matches(card))
        .cloned()
        .collect()
}

pub fn visible_sets(board: &Board, filter: &CardFilter) -> Vec<IdeaSet> {
    board
        .sets
        .iter()
        .filter(|set| filter.includes_set(set))
        .cloned()
        .collect()
}
