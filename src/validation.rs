use crate::dto::{CareerRequest, ContactRequest, FieldError};

use lettre::Address;

/// Collects every failing field of a submission.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_fields(self) -> Vec<FieldError> {
        self.0
    }

    fn push(&mut self, field: &str, message: &str) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    fn min_chars(&mut self, field: &str, value: &str, min: usize, message: &str) {
        if value.trim().chars().count() < min {
            self.push(field, message);
        }
    }

    fn email(&mut self, field: &str, value: &str) {
        if value.trim().parse::<Address>().is_err() {
            self.push(field, "Invalid email address");
        }
    }

    fn optional_url(&mut self, field: &str, value: &str, message: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let valid = url::Url::parse(value)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
            .unwrap_or(false);
        if !valid {
            self.push(field, message);
        }
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

pub fn validate_contact(request: &ContactRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    errors.min_chars("name", &request.name, 2, "Name must be at least 2 characters");
    errors.email("email", &request.email);
    errors.min_chars("phone", &request.phone, 10, "Phone number must be at least 10 digits");
    errors.min_chars("service", &request.service, 1, "Please select a service");
    errors.min_chars("budget", &request.budget, 1, "Please select a budget range");
    errors.min_chars("message", &request.message, 10, "Message must be at least 10 characters");
    errors.into_result()
}

pub fn validate_career(request: &CareerRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    errors.min_chars("name", &request.name, 2, "Name must be at least 2 characters");
    errors.email("email", &request.email);
    errors.min_chars("phone", &request.phone, 10, "Phone number must be at least 10 digits");
    errors.min_chars("position", &request.position, 1, "Please select a position");
    errors.min_chars(
        "experience",
        &request.experience,
        1,
        "Please select your experience level",
    );
    errors.optional_url("portfolio", &request.portfolio, "Please enter a valid URL");
    errors.optional_url("linkedin", &request.linkedin, "Please enter a valid LinkedIn URL");
    errors.optional_url("github", &request.github, "Please enter a valid GitHub URL");
    errors.min_chars(
        "expectedSalary",
        &request.expected_salary,
        1,
        "Please enter your expected salary",
    );
    errors.min_chars("message", &request.message, 10, "Message must be at least 10 characters");
    errors.into_result()
}
