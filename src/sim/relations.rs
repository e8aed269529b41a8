use std::collections::{HashMap, HashSet};

use crate::board::{IdeaCard, IdeaSet};

/// Node indices of every member of one set present in the layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cluster {
    pub set_id: String,
    pub members: Vec<usize>,
}

/// Index-resolved relations for one layout session. Rebuilt whenever the
/// card snapshot changes, without touching node state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Relations {
    /// Unique unordered pairs, stored as `(low, high)`.
    pub threads: Vec<(usize, usize)>,
    /// Only sets with at least two members in the layout.
    pub clusters: Vec<Cluster>,
}

impl Relations {
    pub fn build(
        cards: &[IdeaCard],
        sets: &[IdeaSet],
        index_by_id: &HashMap<String, usize>,
    ) -> Self {
        Self {
            threads: collect_threads(cards, index_by_id),
            clusters: collect_clusters(cards, sets, index_by_id),
        }
    }

    pub fn is_linked(&self, a: usize, b: usize) -> bool {
        let key = (a.min(b), a.max(b));
        self.threads.binary_search(&key).is_ok()
    }
}

fn collect_threads(cards: &[IdeaCard], index_by_id: &HashMap<String, usize>) -> Vec<(usize, usize)> {
    let mut threads = Vec::new();
    for card in cards {
        let Some(&source) = index_by_id.get(&card.id) else {
            continue;
        };

        for target_id in &card.threads {
            if let Some(&target) = index_by_id.get(target_id)
                && source != target
            {
                threads.push((source.min(target), source.max(target)));
            }
        }
    }
    threads.sort_unstable();
    threads.dedup();
    threads
}

fn collect_clusters(
    cards: &[IdeaCard],
    sets: &[IdeaSet],
    index_by_id: &HashMap<String, usize>,
) -> Vec<Cluster> {
    let mut clusters = Vec::new();
    for set in sets {
        let declared_by_cards = cards
            .iter()
            .filter(|card| card.sets.iter().any(|id| id == &set.id))
            .map(|card| card.id.as_str());
        let declared_by_set = set.card_ids.iter().map(String::as_str);

        let mut seen = HashSet::new();
        let members = declared_by_cards
            .chain(declared_by_set)
            .filter_map(|id| index_by_id.get(id).copied())
            .filter(|index| seen.insert(*index))
            .collect::<Vec<_>>();

        if members.len() >= 2 {
            clusters.push(Cluster {
                set_id: set.id.clone(),
                members,
            });
        }
    }
    clusters
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn card(id: &str, threads: &[&str], sets: &[&str]) -> IdeaCard {
        let mut card = IdeaCard::new(id, id);
        card.threads = threads.iter().map(|id| (*id).to_owned()).collect();
        card.sets = sets.iter().map(|id| (*id).to_owned()).collect();
        card
    }

    fn set(id: &str, card_ids: &[&str]) -> IdeaSet {
        IdeaSet {
            id: id.to_owned(),
            card_ids: card_ids.iter().map(|id| (*id).to_owned()).collect(),
            ..Default::default()
        }
    }

    fn index(cards: &[IdeaCard]) -> HashMap<String, usize> {
        cards
            .iter()
            .enumerate()
            .map(|(position, card)| (card.id.clone(), position))
            .collect()
    }

    #[test]
    fn mutual_threads_collapse_to_one_pair() {
        let cards = vec![card("a", &["b"], &[]), card("b", &["a"], &[])];
        let relations = Relations::build(&cards, &[], &index(&cards));
        assert_eq!(relations.threads, vec![(0, 1)]);
        assert!(relations.is_linked(1, 0));
    }

    #[test]
    fn stale_and_self_references_are_ignored() {
        let cards = vec![card("a", &["a", "ghost"], &[]), card("b", &[], &[])];
        let relations = Relations::build(&cards, &[], &index(&cards));
        assert!(relations.threads.is_empty());
    }

    #[test]
    fn threads_from_cards_without_nodes_are_ignored() {
        let cards = vec![card("a", &[], &[]), card("b", &["a"], &[])];
        let mut index_by_id = index(&cards);
        index_by_id.remove("b");
        let relations = Relations::build(&cards, &[], &index_by_id);
        assert!(relations.threads.is_empty());
    }

    #[test]
    fn cluster_members_come_from_cards_and_sets() {
        let cards = vec![
            card("a", &[], &["s"]),
            card("b", &[], &[]),
            card("c", &[], &["s"]),
        ];
        let sets = vec![set("s", &["b", "a", "missing"])];
        let relations = Relations::build(&cards, &sets, &index(&cards));
        assert_eq!(
            relations.clusters,
            vec![Cluster {
                set_id: "s".to_owned(),
                members: vec![0, 2, 1],
            }]
        );
    }

    #[test]
    fn single_member_sets_do_not_cluster() {
        let cards = vec![card("a", &[], &["solo"]), card("b", &[], &["unknown"])];
        let sets = vec![set("solo", &[]), set("empty", &[])];
        let relations = Relations::build(&cards, &sets, &index(&cards));
        assert!(relations.clusters.is_empty());
    }
}
