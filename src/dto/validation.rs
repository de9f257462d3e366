//! Validation helpers for DTOs.

use std::collections::HashSet;

use indexmap::IndexMap;
use validator::ValidationError;

/// Rejects strings that are empty once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Answer options of a question: at least one, none blank, no duplicates.
///
/// Duplicates would make the per-answer `$inc` ambiguous since answers are
/// matched by exact text.
pub fn validate_answer_options(answers: &[String]) -> Result<(), ValidationError> {
    if answers.is_empty() {
        let mut err = ValidationError::new("answers_empty");
        err.message = Some("A question needs at least one answer".into());
        return Err(err);
    }

    if answers.iter().any(|answer| answer.trim().is_empty()) {
        let mut err = ValidationError::new("answer_blank");
        err.message = Some("Answers must not be blank".into());
        return Err(err);
    }

    let mut seen = HashSet::with_capacity(answers.len());
    if let Some(duplicate) = answers.iter().find(|answer| !seen.insert(answer.as_str())) {
        let mut err = ValidationError::new("answer_duplicate");
        err.message = Some(format!("Duplicate answer `{duplicate}`").into());
        return Err(err);
    }

    Ok(())
}

/// Ranked answers keyed by question id. Keys must be non-blank.
pub fn validate_ranked_answers(
    answers: &IndexMap<String, Vec<String>>,
) -> Result<(), ValidationError> {
    if answers.keys().any(|id| id.trim().is_empty()) {
        let mut err = ValidationError::new("question_id_blank");
        err.message = Some("Question ids must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_rejected() {
        assert!(validate_not_blank("Alice").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn answer_options_need_distinct_non_blank_entries() {
        assert!(validate_answer_options(&["Paris".into(), "Lyon".into()]).is_ok());
        assert!(validate_answer_options(&[]).is_err());
        assert!(validate_answer_options(&["Paris".into(), " ".into()]).is_err());
        assert!(validate_answer_options(&["Paris".into(), "Paris".into()]).is_err());
    }

    #[test]
    fn ranked_answers_may_be_empty_lists() {
        let mut answers = IndexMap::new();
        answers.insert("q1".to_string(), vec![]);
        assert!(validate_ranked_answers(&answers).is_ok());

        answers.insert(" ".to_string(), vec!["x".into()]);
        assert!(validate_ranked_answers(&answers).is_err());
    }
}
