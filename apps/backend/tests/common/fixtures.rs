//! Test fixtures and factory functions for creating test data.

use serde_json::json;
use uuid::Uuid;

use learntocode_backend::models::{ContentBlock, DbQuestion};

/// Generate a unique username to avoid collisions between test runs.
pub fn unique_username(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

/// Generate a unique lesson slug.
pub fn unique_slug(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

/// A lesson order far away from real curriculum content.
///
/// Lesson orders are unique across the table, so every test picks its own
/// block and uses `base` and `base + 1`.
pub fn unique_lesson_order() -> i32 {
    let spread = (Uuid::new_v4().as_u128() % 500_000_000) as i32;
    1_000_000 + spread * 2
}

/// Body given to every seeded lesson.
pub fn lesson_content() -> Vec<ContentBlock> {
    vec![
        ContentBlock::Text {
            body: "Every C++ program starts in `main`.".to_string(),
        },
        ContentBlock::Code {
            body: "int main() {\n    return 0;\n}".to_string(),
        },
    ]
}

pub fn mcq_question(lesson_id: Uuid, solution_index: i32, concepts: &[&str]) -> DbQuestion {
    DbQuestion {
        id: Uuid::new_v4(),
        lesson_id,
        kind: "MCQ".to_string(),
        prompt: "What does `return 0;` in main signify?".to_string(),
        code_template: None,
        options: vec![
            "Restart the program".to_string(),
            "Successful execution".to_string(),
            "An error occurred".to_string(),
        ],
        blocks: vec![],
        solution_index: Some(solution_index),
        solution_text: None,
        solution_order: vec![],
        concepts: concepts.iter().map(|c| c.to_string()).collect(),
    }
}

pub fn fill_in_question(lesson_id: Uuid, solution: &str) -> DbQuestion {
    DbQuestion {
        id: Uuid::new_v4(),
        lesson_id,
        kind: "FILL_IN_BLANK".to_string(),
        prompt: "Print to standard output".to_string(),
        code_template: Some("___ << \"hi\";".to_string()),
        options: vec![],
        blocks: vec![],
        solution_index: None,
        solution_text: Some(solution.to_string()),
        solution_order: vec![],
        concepts: vec!["io".to_string()],
    }
}

pub fn parsons_question(lesson_id: Uuid) -> DbQuestion {
    DbQuestion {
        id: Uuid::new_v4(),
        lesson_id,
        kind: "PARSONS".to_string(),
        prompt: "Order the lines".to_string(),
        code_template: None,
        options: vec![],
        blocks: vec![
            "return 0;".to_string(),
            "int main() {".to_string(),
            "}".to_string(),
        ],
        solution_index: None,
        solution_text: None,
        solution_order: vec![1, 0, 2],
        concepts: vec!["structure".to_string()],
    }
}

/// Create a user register request body.
pub fn register_request(username: &str) -> serde_json::Value {
    json!({ "username": username })
}

/// Create an answer submission body. `answer` is sent as-is.
pub fn validate_request(question_id: Uuid, answer: serde_json::Value) -> serde_json::Value {
    json!({ "question_id": question_id, "answer": answer })
}

/// Create a complete-lesson request body.
pub fn complete_lesson_request(lesson_id: Uuid, score: u32) -> serde_json::Value {
    json!({ "lesson_id": lesson_id, "score": score })
}
