use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::GuestSubmissionEntity,
    dto::{
        format_system_time,
        validation::{validate_not_blank, validate_ranked_answers},
    },
};

/// Body of `POST /guest/submit`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct GuestSubmissionRequest {
    /// Display name. Not an identity, several guests may share it.
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    /// Question id to answer texts, best ranked first.
    #[schema(value_type = Object)]
    #[validate(custom(function = "validate_ranked_answers"))]
    pub answers: IndexMap<String, Vec<String>>,
}

impl GuestSubmissionRequest {
    /// Trim the name and stamp the submission.
    pub fn into_entity(self, submitted_at: SystemTime) -> GuestSubmissionEntity {
        GuestSubmissionEntity {
            name: self.name.trim().to_owned(),
            answers: self.answers,
            submitted_at,
        }
    }
}

/// Confirmation returned once every increment of a submission landed.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    /// Confirmation text.
    pub message: String,
    /// RFC 3339 timestamp.
    pub submitted_at: String,
}

impl SubmissionResponse {
    /// Confirmation for a submission accepted at `submitted_at`.
    pub fn accepted(submitted_at: SystemTime) -> Self {
        Self {
            message: "Answers submitted successfully".into(),
            submitted_at: format_system_time(submitted_at),
        }
    }
}
