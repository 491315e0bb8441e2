//! Answer validation for each question kind.

use crate::tokenizer::tokenize;
use crate::types::{Question, QuestionBody, SubmittedAnswer};

/// Grade a submitted answer against a question's stored solution.
///
/// Never fails: answers of the wrong shape, and questions whose kind has no
/// validator, are simply incorrect.
pub fn validate(question: &Question, answer: &SubmittedAnswer) -> bool {
    validate_body(&question.body, answer)
}

/// Grade an answer against a question body.
pub fn validate_body(body: &QuestionBody, answer: &SubmittedAnswer) -> bool {
    match body {
        QuestionBody::MultipleChoice { solution_index, .. } => answer_index(answer)
            .and_then(|i| usize::try_from(i).ok())
            .is_some_and(|i| i == *solution_index),
        QuestionBody::FillInBlank { solution, .. } => match answer {
            SubmittedAnswer::Text(text) => compare_code(text, solution),
            SubmittedAnswer::Index(n) => compare_code(&n.to_string(), solution),
            SubmittedAnswer::Number(n) => compare_code(&n.to_string(), solution),
            SubmittedAnswer::Order(_) | SubmittedAnswer::Missing => false,
        },
        QuestionBody::BlockReorder { solution_order, .. } => match answer {
            SubmittedAnswer::Order(order) => compare_order(order, solution_order),
            _ => false,
        },
        QuestionBody::Unsupported { .. } => false,
    }
}

/// Token-wise comparison of two code fragments.
///
/// Whitespace between tokens is ignored, everything else (including case and
/// qualification such as `std::`) must match exactly.
pub fn compare_code(typed: &str, solution: &str) -> bool {
    let typed_tokens = tokenize(typed.trim());
    let solution_tokens = tokenize(solution.trim());

    typed_tokens.len() == solution_tokens.len()
        && typed_tokens.iter().zip(&solution_tokens).all(|(a, b)| a == b)
}

/// Position-by-position comparison of a block ordering.
pub fn compare_order(submitted: &[i64], solution: &[usize]) -> bool {
    submitted.len() == solution.len()
        && submitted
            .iter()
            .zip(solution)
            .all(|(&s, &expected)| usize::try_from(s).is_ok_and(|s| s == expected))
}

/// Extract an option index from an answer.
fn answer_index(answer: &SubmittedAnswer) -> Option<i64> {
    match answer {
        SubmittedAnswer::Index(i) => Some(*i),
        SubmittedAnswer::Number(n) => truncate(*n),
        SubmittedAnswer::Text(text) => parse_leading_int(text),
        SubmittedAnswer::Order(_) | SubmittedAnswer::Missing => None,
    }
}

/// Whole part of a finite number; `2.7` gives 2.
fn truncate(n: f64) -> Option<i64> {
    let whole = n.trunc();
    (whole.is_finite() && whole >= i64::MIN as f64 && whole < i64::MAX as f64)
        .then_some(whole as i64)
}

/// Lenient integer parse: optional leading whitespace and sign, then as many
/// digits as are present. `"2"`, `" 2 "` and `"2)"` all give 2.
fn parse_leading_int(text: &str) -> Option<i64> {
    let s = text.trim_start();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}
