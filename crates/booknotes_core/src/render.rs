//! crates/booknotes_core/src/render.rs
//!
//! Renders a PDF's stored outline and notes as a single markdown document.

use std::fmt::Write;

use crate::domain::ChapterNotes;

pub const EMPTY_SUBTOPIC: &str = "_No notes yet._";

pub fn render_notes(title: &str, chapters: &[ChapterNotes]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {title}\n");
    if chapters.is_empty() {
        out.push_str("_No outline has been generated for this book._\n");
        return out;
    }
    for chapter in chapters {
        let _ = writeln!(out, "## {}\n", chapter.name);
        for topic in &chapter.topics {
            let _ = writeln!(out, "### {}\n", topic.name);
            for subtopic in &topic.subtopics {
                let body = subtopic
                    .content
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .unwrap_or(EMPTY_SUBTOPIC);
                let _ = writeln!(out, "#### {}\n\n{}\n", subtopic.name, body);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SubtopicNotes, TopicNotes};

    #[test]
    fn renders_tree_with_placeholders() {
        let chapters = vec![ChapterNotes {
            name: "Basics".into(),
            topics: vec![TopicNotes {
                name: "Ownership".into(),
                subtopics: vec![
                    SubtopicNotes { name: "Moves".into(), content: Some("Values move.".into()) },
                    SubtopicNotes { name: "Borrows".into(), content: None },
                ],
            }],
        }];

        let md = render_notes("rust.pdf", &chapters);
        assert!(md.starts_with("# rust.pdf\n"));
        // The file name is the only level-one heading.
        assert_eq!(md.lines().filter(|l| l.starts_with("# ")).count(), 1);
        assert!(md.contains("## Basics\n"));
        assert!(md.contains("### Ownership\n"));
        assert!(md.contains("#### Moves\n\nValues move.\n"));
        assert!(md.contains(&format!("#### Borrows\n\n{EMPTY_SUBTOPIC}\n")));
    }

    #[test]
    fn empty_outline_is_explained() {
        let md = render_notes("rust.pdf", &[]);
        assert!(md.contains("No outline"));
    }
}
