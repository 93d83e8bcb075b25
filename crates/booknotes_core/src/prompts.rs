//! crates/booknotes_core/src/prompts.rs
//!
//! Prompt texts sent to the generative model.

pub const OUTLINE_SYSTEM_INSTRUCTIONS: &str = r#"You are an expert text analyst specializing in content organization. Your task is to analyze a book and produce a structured outline of its chapters, topics and subtopics.

Follow these guidelines:
1. Read the provided book carefully.
2. Identify the chapters, the main topics within each chapter, and the subtopics of each topic.
3. Keep topics distinct and representative of the book's content; keep subtopics short and specific.
4. Keep the level of detail consistent across chapters.
5. Return the outline inside a single ```json fenced code block using exactly this format:

```json
[
  {
    "chapter": "Chapter 1 title",
    "topics": [
      {
        "topic": "Main Topic 1",
        "sub_topics": ["Subtopic 1A", "Subtopic 1B"]
      }
    ]
  }
]
```

6. If a subtopic needs further breakdown, use an object instead of a string:

```json
{ "name": "Subtopic 1A", "sub_topics": ["Detail 1", "Detail 2"] }
```

7. Use descriptive, meaningful names. Any remarks must come after the JSON block."#;

pub const OUTLINE_REQUEST: &str = "Give me the chapters, topics and subtopics of this book.";

pub const QUIZ_SYSTEM_INSTRUCTIONS: &str = r#"You write multiple-choice quizzes for students. Every question has exactly four options and exactly one correct answer. The "answer" field repeats the correct option verbatim. Respond with a single ```json fenced code block containing an array of objects with the keys "question", "options" and "answer"."#;

pub fn notes_request(chapter: &str, topic: &str, subtopic: &str) -> String {
    format!(
        "Write short study notes on the subtopic '{subtopic}' under the topic '{topic}' in the chapter '{chapter}' of this book."
    )
}

pub fn topic_notes_request(chapter: &str, topic: &str) -> String {
    format!(
        "Write short study notes on the topic '{topic}' in the chapter '{chapter}' of this book, covering each of its subtopics."
    )
}

pub fn quiz_request(chapter: &str, questions: usize) -> String {
    format!(
        "Create exactly {questions} multiple-choice questions, each with 4 options, testing the chapter '{chapter}' of this book. Return them as a ```json fenced array."
    )
}
