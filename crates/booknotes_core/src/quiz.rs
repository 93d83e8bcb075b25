//! crates/booknotes_core/src/quiz.rs
//!
//! Turns model output into multiple-choice questions, falling back to a fixed
//! question set whenever nothing usable comes back.

use serde_json::Value;
use tracing::warn;

use crate::domain::QuizQuestion;
use crate::fenced::extract_fenced_json;

pub const QUIZ_LENGTH: usize = 5;
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Parses the quiz out of a model response. Malformed entries are dropped;
/// an unparseable response or an empty result yields [`fallback_quiz`].
pub fn parse_quiz(response: &str) -> Vec<QuizQuestion> {
    let value = match extract_fenced_json(response) {
        Ok(value) => value,
        Err(e) => {
            warn!("Quiz response could not be parsed, using fallback questions: {}", e);
            return fallback_quiz();
        }
    };

    let items = match &value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("questions").or_else(|| map.get("quiz")) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => std::slice::from_ref(&value),
        },
        _ => &[],
    };

    let questions: Vec<QuizQuestion> = items
        .iter()
        .filter_map(question_from)
        .take(QUIZ_LENGTH)
        .collect();

    if questions.is_empty() {
        warn!("Quiz response held no usable questions, using fallback questions");
        return fallback_quiz();
    }
    questions
}

fn question_from(value: &Value) -> Option<QuizQuestion> {
    let question: QuizQuestion = serde_json::from_value(value.clone()).ok()?;
    let question_text = question.question.trim();
    if question_text.is_empty() || question.options.len() != OPTIONS_PER_QUESTION {
        return None;
    }
    let options: Vec<String> = question
        .options
        .iter()
        .map(|o| o.trim().to_string())
        .collect();
    if options.iter().any(String::is_empty) {
        return None;
    }
    let answer = resolve_answer(question.answer.trim(), &options)?;
    Some(QuizQuestion {
        question: question_text.to_string(),
        options,
        answer,
    })
}

/// The answer must name one of the options, either verbatim
/// (case-insensitive) or as a letter `A`-`D`.
fn resolve_answer(answer: &str, options: &[String]) -> Option<String> {
    if let Some(option) = options.iter().find(|o| o.eq_ignore_ascii_case(answer)) {
        return Some(option.clone());
    }
    let letter = answer.trim_end_matches([')', '.', ':']);
    if letter.len() == 1 {
        let index = letter.to_ascii_uppercase().as_bytes()[0].checked_sub(b'A')? as usize;
        return options.get(index).cloned();
    }
    None
}

/// The fixed question set returned when the model gives us nothing usable.
pub fn fallback_quiz() -> Vec<QuizQuestion> {
    let q = |question: &str, options: [&str; 4], answer: &str| QuizQuestion {
        question: question.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        answer: answer.to_string(),
    };
    vec![
        q(
            "What is the best first step when studying a new chapter?",
            [
                "Skim the headings to get an overview",
                "Memorize the last page",
                "Skip straight to the exercises",
                "Read only the footnotes",
            ],
            "Skim the headings to get an overview",
        ),
        q(
            "Which technique helps most with long-term retention?",
            [
                "Spaced repetition",
                "Reading once quickly",
                "Highlighting every line",
                "Studying only the night before",
            ],
            "Spaced repetition",
        ),
        q(
            "What should a good summary of a topic contain?",
            [
                "The key ideas in your own words",
                "Every sentence from the text",
                "Only the chapter title",
                "Unrelated examples",
            ],
            "The key ideas in your own words",
        ),
        q(
            "Why is self-testing useful while studying?",
            [
                "It reveals what you have not understood yet",
                "It replaces reading entirely",
                "It makes the material shorter",
                "It has no effect on learning",
            ],
            "It reveals what you have not understood yet",
        ),
        q(
            "How should subtopics relate to their parent topic?",
            [
                "They break the topic into focused parts",
                "They repeat the topic word for word",
                "They cover unrelated material",
                "They replace the topic",
            ],
            "They break the topic into focused parts",
        ),
    ]
}
