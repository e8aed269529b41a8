use std::collections::{BTreeSet, HashSet};

use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::model::{Board, IdeaCard, IdeaSet, Project};

const STORAGE_PREFIX: &str = "3x5_";
const GUEST_NAMESPACE: &str = "3x5_";
const COLLECTIONS: [&str; 3] = ["cards", "sets", "projects"];

pub(super) fn parse_board(raw: &str) -> Result<Board> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in board snapshot")?;
    let object = parsed
        .as_object()
        .ok_or_else(|| anyhow!("board snapshot must be a JSON object"))?;

    if COLLECTIONS.iter().any(|key| object.contains_key(*key)) {
        return build_board(
            object.get("cards"),
            object.get("sets"),
            object.get("projects"),
        );
    }

    let namespaces = storage_namespaces(object);
    let Some(namespace) = pick_namespace(&namespaces) else {
        return Err(anyhow!(
            "could not find idea cards in board snapshot; expected `cards` or `3x5_cards` keys"
        ));
    };
    for other in namespaces.iter().filter(|other| *other != namespace) {
        warn!("ignoring storage namespace {other:?}; using {namespace:?}");
    }
    debug!("reading local-storage dump from namespace {namespace:?}");

    build_board(
        object.get(&format!("{namespace}cards")),
        object.get(&format!("{namespace}sets")),
        object.get(&format!("{namespace}projects")),
    )
}

fn build_board(
    cards: Option<&Value>,
    sets: Option<&Value>,
    projects: Option<&Value>,
) -> Result<Board> {
    let cards = parse_entries::<IdeaCard>(cards, "card").context("invalid card list")?;
    let sets = parse_entries::<IdeaSet>(sets, "set").context("invalid set list")?;
    let projects =
        parse_entries::<Project>(projects, "project").context("invalid project list")?;

    Ok(Board {
        cards: dedup_by_id(cards, |card| &card.id, "card"),
        sets: dedup_by_id(sets, |set| &set.id, "set"),
        projects: dedup_by_id(projects, |project| &project.id, "project"),
    })
}

fn parse_entries<T: DeserializeOwned>(value: Option<&Value>, kind: &str) -> Result<Vec<T>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };

    // Local storage keeps every collection as a JSON-encoded string.
    let decoded;
    let value = match value {
        Value::Null => return Ok(Vec::new()),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(inner) => {
                decoded = inner;
                &decoded
            }
            Err(error) => {
                warn!("discarding unreadable {kind} collection: {error}");
                return Ok(Vec::new());
            }
        },
        other => other,
    };

    let items = value
        .as_array()
        .ok_or_else(|| anyhow!("expected a list of {kind}s"))?;

    let mut entries = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        match T::deserialize(item) {
            Ok(entry) => entries.push(entry),
            Err(error) => warn!("skipping malformed {kind} at index {position}: {error}"),
        }
    }
    Ok(entries)
}

fn dedup_by_id<T>(entries: Vec<T>, id: impl Fn(&T) -> &String, kind: &str) -> Vec<T> {
    let mut seen = HashSet::with_capacity(entries.len());
    let mut unique = Vec::with_capacity(entries.len());
    for entry in entries {
        let key = id(&entry);
        if key.is_empty() {
            warn!("skipping {kind} without an id");
            continue;
        }
        if !seen.insert(key.clone()) {
            warn!("skipping duplicate {kind} {key:?}");
            continue;
        }
        unique.push(entry);
    }
    unique
}

fn storage_namespaces(object: &Map<String, Value>) -> BTreeSet<String> {
    object
        .keys()
        .filter(|key| key.starts_with(STORAGE_PREFIX))
        .filter_map(|key| {
            COLLECTIONS
                .iter()
                .find_map(|collection| key.strip_suffix(collection))
        })
        .map(str::to_owned)
        .collect()
}

fn pick_namespace(namespaces: &BTreeSet<String>) -> Option<&String> {
    namespaces
        .iter()
        .find(|namespace| namespace.as_str() == GUEST_NAMESPACE)
        .or_else(|| namespaces.iter().next())
}
