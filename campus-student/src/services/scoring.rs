//! Quiz scoring for listening and reading content

use campus_common::db::models::Question;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizScore {
    /// Correct answers
    pub correct: i64,
    pub total_questions: i64,
    /// Marks awarded, scaled to `max_marks`
    pub marks: i64,
    pub max_marks: i64,
}

/// Answer key of question `index`: its `question_number`, else `Q<n>`
pub fn question_key(question: &Question, index: usize) -> String {
    match question.question_number.as_deref().map(str::trim) {
        Some(number) if !number.is_empty() => number.to_string(),
        _ => format!("Q{}", index + 1),
    }
}

/// Score submitted answers against the stored key
///
/// An answer counts when it matches the correct answer ignoring case and
/// surrounding whitespace. Answers are looked up by question key, then by
/// its lowercase form. Marks are `round(correct / total * max_marks)`; when
/// no positive `max_marks` is configured the raw count is the mark.
/// Returns `None` for content without questions.
pub fn score_quiz(
    questions: &[Question],
    answers: &BTreeMap<String, String>,
    max_marks: Option<i64>,
) -> Option<QuizScore> {
    if questions.is_empty() {
        return None;
    }

    let correct = questions
        .iter()
        .enumerate()
        .filter(|(index, question)| {
            let key = question_key(question, *index);
            let submitted = answers
                .get(&key)
                .or_else(|| answers.get(&key.to_lowercase()))
                .map(|a| a.trim().to_lowercase());
            let expected = question
                .correct_answer
                .as_deref()
                .map(|a| a.trim().to_lowercase());
            matches!((submitted, expected), (Some(s), Some(e)) if !s.is_empty() && s == e)
        })
        .count() as i64;

    let total_questions = questions.len() as i64;

    let (marks, max_marks) = match max_marks {
        Some(max) if max > 0 => {
            let scaled = (correct as f64 / total_questions as f64 * max as f64).round() as i64;
            (scaled, max)
        }
        _ => (correct, total_questions),
    };

    Some(QuizScore {
        correct,
        total_questions,
        marks,
        max_marks,
    })
}

/// Questions without their answer keys, for students who have not attempted
pub fn redact_answer_keys(questions: &[Question]) -> Vec<Question> {
    questions
        .iter()
        .map(|q| Question {
            correct_answer: None,
            ..q.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(number: Option<&str>, correct: &str) -> Question {
        Question {
            question_number: number.map(String::from),
            question: "?".to_string(),
            options: vec![],
            correct_answer: Some(correct.to_string()),
        }
    }

    fn answers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let questions = vec![q(None, "Paris"), q(None, "b")];
        let score = score_quiz(&questions, &answers(&[("Q1", "  paris "), ("Q2", "B")]), None).unwrap();
        assert_eq!(score.correct, 2);
        assert_eq!(score.marks, 2);
        assert_eq!(score.max_marks, 2);
    }

    #[test]
    fn test_explicit_numbers_and_lowercase_keys() {
        let questions = vec![q(Some("A1"), "x"), q(Some("A2"), "y")];
        let score = score_quiz(&questions, &answers(&[("a1", "x"), ("A2", "z")]), None).unwrap();
        assert_eq!(score.correct, 1);
    }

    #[test]
    fn test_scaled_marks_round() {
        let questions = vec![q(None, "a"), q(None, "b"), q(None, "c")];
        // 2 of 3 correct, max 10 -> 6.67 -> 7
        let score = score_quiz(&questions, &answers(&[("Q1", "a"), ("Q2", "b")]), Some(10)).unwrap();
        assert_eq!(score.marks, 7);
        assert_eq!(score.max_marks, 10);

        // 1 of 2 correct, max 5 -> 2.5 -> 3
        let questions = vec![q(None, "a"), q(None, "b")];
        let score = score_quiz(&questions, &answers(&[("Q1", "a")]), Some(5)).unwrap();
        assert_eq!(score.marks, 3);
    }

    #[test]
    fn test_blank_answers_never_score() {
        let questions = vec![q(None, "")];
        let score = score_quiz(&questions, &answers(&[("Q1", "  ")]), None).unwrap();
        assert_eq!(score.correct, 0);
    }

    #[test]
    fn test_no_questions() {
        assert!(score_quiz(&[], &BTreeMap::new(), Some(10)).is_none());
    }

    #[test]
    fn test_redaction() {
        let redacted = redact_answer_keys(&[q(None, "a")]);
        assert!(redacted[0].correct_answer.is_none());
    }
}
