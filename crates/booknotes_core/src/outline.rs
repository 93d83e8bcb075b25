//! crates/booknotes_core/src/outline.rs
//!
//! The chapter → topic → subtopic tree extracted from a book.
//!
//! The model is asked for a fixed schema but does not always follow it, so the
//! conversion from raw JSON is lenient: alternate key names are accepted, nested
//! sub-sub-topics are flattened into `Parent: Child` subtopics, and a bare topic
//! list (no chapter level) is wrapped in a single chapter.

use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outline {
    pub chapters: Vec<OutlineChapter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineChapter {
    pub name: String,
    pub topics: Vec<OutlineTopic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineTopic {
    pub name: String,
    pub subtopics: Vec<String>,
}

const CHAPTER_KEYS: &[&str] = &["chapter", "chapter_name", "title", "name"];
const TOPIC_KEYS: &[&str] = &["topic", "name", "title"];
const SUBTOPIC_KEYS: &[&str] = &["name", "sub_topic", "subtopic", "topic", "title"];
const TOPIC_LIST_KEYS: &[&str] = &["topics"];
const SUBTOPIC_LIST_KEYS: &[&str] = &["sub_topics", "subtopics", "sub_sub_topics"];

impl Outline {
    /// Converts the model's JSON into a typed tree. Bare topics are grouped
    /// under a chapter named `fallback_chapter`.
    pub fn from_json(value: &Value, fallback_chapter: &str) -> Self {
        let items: &[Value] = match value {
            Value::Array(items) => items.as_slice(),
            Value::Object(map) => match map.get("chapters") {
                Some(Value::Array(items)) => items.as_slice(),
                _ => std::slice::from_ref(value),
            },
            _ => &[],
        };

        let mut chapters = Vec::new();
        let mut loose_topics = Vec::new();

        for item in items {
            match item {
                Value::Object(map) if list_field(map, TOPIC_LIST_KEYS).is_some() => {
                    if let Some(chapter) = chapter_from(map) {
                        chapters.push(chapter);
                    }
                }
                other => {
                    if let Some(topic) = topic_from(other) {
                        loose_topics.push(topic);
                    }
                }
            }
        }

        if !loose_topics.is_empty() {
            chapters.push(OutlineChapter {
                name: fallback_chapter.to_string(),
                topics: loose_topics,
            });
        }

        Self { chapters }
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn topic_count(&self) -> usize {
        self.chapters.iter().map(|c| c.topics.len()).sum()
    }
}

fn chapter_from(map: &Map<String, Value>) -> Option<OutlineChapter> {
    let name = name_field(map, CHAPTER_KEYS)?;
    let topics = list_field(map, TOPIC_LIST_KEYS)
        .unwrap_or_default()
        .iter()
        .filter_map(topic_from)
        .collect();
    Some(OutlineChapter { name, topics })
}

fn topic_from(value: &Value) -> Option<OutlineTopic> {
    match value {
        Value::String(name) => non_blank(name).map(|name| OutlineTopic {
            name,
            subtopics: Vec::new(),
        }),
        Value::Object(map) => {
            let name = name_field(map, TOPIC_KEYS)?;
            let mut subtopics = Vec::new();
            for sub in list_field(map, SUBTOPIC_LIST_KEYS).unwrap_or_default() {
                collect_subtopics(sub, None, &mut subtopics);
            }
            Some(OutlineTopic { name, subtopics })
        }
        _ => None,
    }
}

fn collect_subtopics(value: &Value, parent: Option<&str>, out: &mut Vec<String>) {
    let qualify = |name: String| match parent {
        Some(parent) => format!("{parent}: {name}"),
        None => name,
    };
    match value {
        Value::String(name) => {
            if let Some(name) = non_blank(name) {
                out.push(qualify(name));
            }
        }
        Value::Object(map) => {
            let Some(name) = name_field(map, SUBTOPIC_KEYS).map(qualify) else {
                return;
            };
            out.push(name.clone());
            for child in list_field(map, SUBTOPIC_LIST_KEYS).unwrap_or_default() {
                collect_subtopics(child, Some(&name), out);
            }
        }
        _ => {}
    }
}

fn name_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .and_then(non_blank)
}

fn list_field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a [Value]> {
    keys.iter()
        .find_map(|key| map.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
