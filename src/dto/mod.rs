use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ContactRequest {
    /// Full name of the person reaching out
    pub name: String,
    /// Address the auto-reply is sent to
    pub email: String,
    pub phone: String,
    /// Service the inquiry is about
    pub service: String,
    /// Budget range picked on the form
    pub budget: String,
    pub message: String,
}

/// Text fields of a career application. The résumé travels separately as a
/// staged file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CareerRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Position applied for
    pub position: String,
    /// Experience level
    pub experience: String,
    pub expected_salary: String,
    pub message: String,
    pub portfolio: String,
    pub linkedin: String,
    pub github: String,
}

impl CareerRequest {
    /// Assigns a multipart text field by its form name. Returns `false` for
    /// names the form does not define.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "name" => &mut self.name,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "position" => &mut self.position,
            "experience" => &mut self.experience,
            "expectedSalary" => &mut self.expected_salary,
            "message" => &mut self.message,
            "portfolio" => &mut self.portfolio,
            "linkedin" => &mut self.linkedin,
            "github" => &mut self.github,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// Multipart body accepted by `POST /career`, for documentation only.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CareerForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub experience: String,
    pub expected_salary: String,
    pub message: String,
    pub portfolio: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    /// Optional résumé file
    #[schema(value_type = Option<String>, format = Binary)]
    pub resume: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Per-field problems when the submission was rejected as invalid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

impl SubmissionResponse {
    pub const fn ok() -> Self {
        Self {
            success: true,
            error: None,
            fields: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            fields: None,
        }
    }

    pub fn invalid(error: impl Into<String>, fields: Vec<FieldError>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            fields: Some(fields),
        }
    }
}
