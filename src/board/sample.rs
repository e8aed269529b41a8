use std::collections::BTreeMap;

use super::model::{Board, IdeaCard, IdeaSet, Project};

struct SampleCard {
    id: &'static str,
    project: &'static str,
    title: &'static str,
    content: &'static str,
    tags: &'static [(&'static str, &'static str)],
    threads: &'static [&'static str],
    sets: &'static [&'static str],
    color: &'static str,
    archived: bool,
}

const SAMPLE_CARDS: &[SampleCard] = &[
    SampleCard {
        id: "lighthouse",
        project: "saltwater",
        title: "The lighthouse that keeps the wrong time",
        content: "Its beam sweeps once a minute, but the minutes are from 1911.",
        tags: &[("Setting", "Location"), ("Mood", "Liminal")],
        threads: &["keeper", "tide-clock"],
        sets: &["coast"],
        color: "amber",
        archived: false,
    },
    SampleCard {
        id: "keeper",
        project: "saltwater",
        title: "Keeper who never ages",
        content: "She writes letters to a daughter who has not been born yet.",
        tags: &[("Character", "Archetype"), ("Theme", "Memory")],
        threads: &["lighthouse", "letters"],
        sets: &["coast", "people"],
        color: "royal",
        archived: false,
    },
    SampleCard {
        id: "tide-clock",
        project: "saltwater",
        title: "Tide clock",
        content: "A brass clock that runs on the tide instead of a spring.",
        tags: &[("Plot", "Device")],
        threads: &["drowned-bells"],
        sets: &["coast"],
        color: "gold",
        archived: false,
    },
    SampleCard {
        id: "drowned-bells",
        project: "saltwater",
        title: "Drowned bells",
        content: "At low water the old parish bells can be heard under the bay.",
        tags: &[("Sound", "Design"), ("Mood", "Melancholy")],
        threads: &["tide-clock"],
        sets: &["coast"],
        color: "teal",
        archived: false,
    },
    SampleCard {
        id: "letters",
        project: "saltwater",
        title: "Letters in bottles",
        content: "Every letter washes back up the morning after it is sent.",
        tags: &[("Plot", "Beat")],
        threads: &["keeper", "daughter"],
        sets: &["people"],
        color: "white",
        archived: false,
    },
    SampleCard {
        id: "daughter",
        project: "saltwater",
        title: "The daughter",
        content: "Finds the letters decades later, already addressed to her.",
        tags: &[("Character", "Goal"), ("Theme", "Ancestry")],
        threads: &["letters"],
        sets: &["people"],
        color: "plum",
        archived: false,
    },
    SampleCard {
        id: "fog",
        project: "saltwater",
        title: "Fog with a grammar",
        content: "The fog only rolls in during sentences that end in questions.",
        tags: &[("Setting", "World Rule")],
        threads: &[],
        sets: &[],
        color: "sage",
        archived: false,
    },
    SampleCard {
        id: "old-ending",
        project: "saltwater",
        title: "Abandoned ending",
        content: "The keeper walks into the sea. Too neat.",
        tags: &[("Plot", "Structure")],
        threads: &["keeper"],
        sets: &[],
        color: "crimson",
        archived: true,
    },
    SampleCard {
        id: "night-market",
        project: "nightshift",
        title: "Night market of lost hours",
        content: "Stalls sell the hours people slept through.",
        tags: &[("Setting", "Location"), ("Mood", "Surreal")],
        threads: &["courier", "hour-glass"],
        sets: &["market"],
        color: "amber",
        archived: false,
    },
    SampleCard {
        id: "courier",
        project: "nightshift",
        title: "Courier of borrowed time",
        content: "Delivers hours to insomniacs and takes a minute as a fee.",
        tags: &[("Character", "Function")],
        threads: &["night-market", "missing-minute"],
        sets: &["market"],
        color: "crimson",
        archived: false,
    },
    SampleCard {
        id: "hour-glass",
        project: "nightshift",
        title: "Hourglass full of neon",
        content: "",
        tags: &[("Visuals", "Lighting")],
        threads: &[],
        sets: &["market"],
        color: "teal",
        archived: false,
    },
    SampleCard {
        id: "missing-minute",
        project: "nightshift",
        title: "The missing minute",
        content: "Somebody has been skimming a minute from every delivery.",
        tags: &[("Plot", "Conflict"), ("Genre", "Trope")],
        threads: &["courier", "ghost-link"],
        sets: &[],
        color: "gold",
        archived: false,
    },
];

/// Small two-project board shown when no snapshot is given. `missing-minute`
/// carries a thread to a card that does not exist.
pub fn sample_board() -> Board {
    let cards = SAMPLE_CARDS
        .iter()
        .enumerate()
        .map(|(index, sample)| {
            let mut tags: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for (category, tag) in sample.tags {
                tags.entry((*category).to_owned())
                    .or_default()
                    .push((*tag).to_owned());
            }

            let created_at = 1_700_000_000_000 + (index as u64 * 60_000);
            IdeaCard {
                id: sample.id.to_owned(),
                project_id: sample.project.to_owned(),
                title: sample.title.to_owned(),
                content: sample.content.to_owned(),
                tags,
                threads: sample.threads.iter().map(|id| (*id).to_owned()).collect(),
                sets: sample.sets.iter().map(|id| (*id).to_owned()).collect(),
                created_at,
                updated_at: created_at,
                color: sample.color.to_owned(),
                is_archived: sample.archived,
            }
        })
        .collect();

    let set = |id: &str, project: &str, name: &str| IdeaSet {
        id: id.to_owned(),
        project_id: project.to_owned(),
        name: name.to_owned(),
        created_at: 1_700_000_000_000,
        card_ids: Vec::new(),
    };
    let project = |id: &str, name: &str| Project {
        id: id.to_owned(),
        name: name.to_owned(),
        description: None,
    };

    Board {
        cards,
        sets: vec![
            set("coast", "saltwater", "The coast"),
            set("people", "saltwater", "People"),
            set("market", "nightshift", "Market"),
        ],
        projects: vec![
            project("saltwater", "Saltwater"),
            project("nightshift", "Nightshift"),
        ],
    }
}
