use crate::{
    dto::{CareerRequest, ContactRequest},
    mailer::{EmailBody, Mailer, MailerError, OutgoingEmail},
    upload::{StagedFile, StagingDir},
    validation::{ValidationErrors, validate_career, validate_contact},
};

use std::{fmt::Write, sync::Arc};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("{0}")]
    InvalidInput(ValidationErrors),

    #[error(transparent)]
    Delivery(#[from] MailerError),
}

/// Forwards form submissions to the operator mailbox and acknowledges the
/// submitter.
#[derive(Clone)]
pub struct RelayService {
    mailer: Arc<dyn Mailer>,
    staging: StagingDir,
    admin_email: String,
    brand_name: String,
}

impl RelayService {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        staging: StagingDir,
        admin_email: String,
        brand_name: String,
    ) -> Self {
        Self {
            mailer,
            staging,
            admin_email,
            brand_name,
        }
    }

    pub const fn staging(&self) -> &StagingDir {
        &self.staging
    }

    pub async fn submit_contact(&self, request: ContactRequest) -> Result<(), RelayError> {
        validate_contact(&request).map_err(RelayError::InvalidInput)?;

        tracing::info!("Relaying contact inquiry from {}", request.email);

        let html = notification_html(
            "New Contact Request",
            &[
                ("Name", request.name.as_str()),
                ("Email", request.email.as_str()),
                ("Phone", request.phone.as_str()),
                ("Service", request.service.as_str()),
                ("Budget", request.budget.as_str()),
                ("Message", request.message.as_str()),
            ],
        );
        self.notify_admin(format!("New Contact — {}", request.name), html, None)
            .await?;

        let reply = format!(
            "Hello {}, your inquiry has been received. Our team will respond shortly.\n\n— {}",
            request.name, self.brand_name
        );
        self.auto_reply(&request.email, reply).await?;

        Ok(())
    }

    /// Relays a job application. The staged résumé, if any, is removed once
    /// both sends have been attempted, whatever their outcome.
    pub async fn submit_career(
        &self,
        request: CareerRequest,
        resume: Option<StagedFile>,
    ) -> Result<(), RelayError> {
        let outcome = self.relay_career(&request, resume.as_ref()).await;

        if let Some(resume) = resume {
            resume.discard().await;
        }

        outcome
    }

    async fn relay_career(
        &self,
        request: &CareerRequest,
        resume: Option<&StagedFile>,
    ) -> Result<(), RelayError> {
        validate_career(request).map_err(RelayError::InvalidInput)?;

        tracing::info!(
            "Relaying career application from {} (resume attached: {})",
            request.email,
            resume.is_some()
        );

        let mut fields = vec![
            ("Name", request.name.as_str()),
            ("Email", request.email.as_str()),
            ("Phone", request.phone.as_str()),
            ("Position", request.position.as_str()),
            ("Experience", request.experience.as_str()),
            ("Expected Salary", request.expected_salary.as_str()),
        ];
        for (label, link) in [
            ("Portfolio", &request.portfolio),
            ("LinkedIn", &request.linkedin),
            ("GitHub", &request.github),
        ] {
            if !link.trim().is_empty() {
                fields.push((label, link.as_str()));
            }
        }
        fields.push(("Message", request.message.as_str()));

        let html = notification_html("New Career Application", &fields);
        self.notify_admin(
            format!("New Job Application — {}", request.name),
            html,
            resume,
        )
        .await?;

        let reply = format!(
            "Hello {},\n\nThank you for applying to {}. Our HR team will contact you soon.\n\n— {} HR",
            request.name, self.brand_name, self.brand_name
        );
        self.auto_reply(&request.email, reply).await?;

        Ok(())
    }

    async fn notify_admin(
        &self,
        subject: String,
        html: String,
        resume: Option<&StagedFile>,
    ) -> Result<(), MailerError> {
        self.mailer
            .send(OutgoingEmail {
                to: self.admin_email.clone(),
                subject,
                body: EmailBody::Html(html),
                attachments: resume.map(StagedFile::attachment).into_iter().collect(),
            })
            .await
    }

    async fn auto_reply(&self, to: &str, text: String) -> Result<(), MailerError> {
        self.mailer
            .send(OutgoingEmail {
                to: to.trim().to_string(),
                subject: format!("Thank You — {}", self.brand_name),
                body: EmailBody::Text(text),
                attachments: Vec::new(),
            })
            .await
    }
}

fn notification_html(heading: &str, fields: &[(&str, &str)]) -> String {
    let mut html = format!("<h2>{heading}</h2>\n");
    for (label, value) in fields {
        let _ = writeln!(html, "<p><b>{label}:</b> {}</p>", escape_html(value));
    }
    html
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '\r' => {}
            '\n' => escaped.push_str("<br>"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RecordingMailer, career_request, contact_request};

    async fn service(mailer: Arc<RecordingMailer>) -> (RelayService, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let staging = StagingDir::create(tmp.path()).await.unwrap();
        let service = RelayService::new(
            mailer,
            staging,
            "admin@laverse.test".to_string(),
            "Laverse Digital".to_string(),
        );
        (service, tmp)
    }

    #[tokio::test]
    async fn contact_sends_notification_then_reply() {
        let mailer = Arc::new(RecordingMailer::new());
        let (service, _tmp) = service(mailer.clone()).await;

        service.submit_contact(contact_request()).await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);

        let notification = &sent[0].email;
        assert_eq!(notification.to, "admin@laverse.test");
        assert_eq!(notification.subject, "New Contact — Ada");
        let EmailBody::Html(html) = &notification.body else {
            panic!("notification should be HTML");
        };
        assert!(html.contains("<h2>New Contact Request</h2>"));
        assert!(html.contains("<p><b>Budget:</b> $500 - $1,000</p>"));

        let reply = &sent[1].email;
        assert_eq!(reply.to, "ada@x.com");
        assert_eq!(reply.subject, "Thank You — Laverse Digital");
        assert_eq!(
            reply.body,
            EmailBody::Text(
                "Hello Ada, your inquiry has been received. Our team will respond shortly.\n\n— Laverse Digital"
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn failed_notification_skips_reply() {
        let mailer = Arc::new(RecordingMailer::failing_on(1));
        let (service, _tmp) = service(mailer.clone()).await;

        let err = service.submit_contact(contact_request()).await.unwrap_err();

        assert!(matches!(err, RelayError::Delivery(_)));
        assert_eq!(mailer.attempts(), 1);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn failed_reply_is_reported_after_notification() {
        let mailer = Arc::new(RecordingMailer::failing_on(2));
        let (service, _tmp) = service(mailer.clone()).await;

        let err = service.submit_contact(contact_request()).await.unwrap_err();

        assert!(matches!(err, RelayError::Delivery(_)));
        assert_eq!(mailer.attempts(), 2);
        assert_eq!(mailer.sent().len(), 1);
        assert_eq!(mailer.sent()[0].email.to, "admin@laverse.test");
    }

    #[tokio::test]
    async fn invalid_contact_sends_nothing() {
        let mailer = Arc::new(RecordingMailer::new());
        let (service, _tmp) = service(mailer.clone()).await;

        let request = ContactRequest {
            email: "not-an-email".to_string(),
            ..contact_request()
        };
        let err = service.submit_contact(request).await.unwrap_err();

        assert!(matches!(err, RelayError::InvalidInput(_)));
        assert_eq!(mailer.attempts(), 0);
    }

    #[tokio::test]
    async fn notification_escapes_markup() {
        let mailer = Arc::new(RecordingMailer::new());
        let (service, _tmp) = service(mailer.clone()).await;

        let request = ContactRequest {
            message: "<script>alert('x')</script>".to_string(),
            ..contact_request()
        };
        service.submit_contact(request).await.unwrap();

        let EmailBody::Html(html) = &mailer.sent()[0].email.body else {
            panic!("notification should be HTML");
        };
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[tokio::test]
    async fn career_without_resume_has_no_attachment() {
        let mailer = Arc::new(RecordingMailer::new());
        let (service, _tmp) = service(mailer.clone()).await;

        service.submit_career(career_request(), None).await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].email.subject, "New Job Application — Ada");
        assert!(sent[0].email.attachments.is_empty());
        let EmailBody::Text(reply) = &sent[1].email.body else {
            panic!("reply should be plain text");
        };
        assert!(reply.contains("Thank you for applying to Laverse Digital."));
        assert!(reply.ends_with("— Laverse Digital HR"));
    }

    #[tokio::test]
    async fn career_lists_only_provided_links() {
        let mailer = Arc::new(RecordingMailer::new());
        let (service, _tmp) = service(mailer.clone()).await;

        let request = CareerRequest {
            github: "https://github.com/ada".to_string(),
            ..career_request()
        };
        service.submit_career(request, None).await.unwrap();

        let EmailBody::Html(html) = &mailer.sent()[0].email.body else {
            panic!("notification should be HTML");
        };
        assert!(html.contains("<p><b>GitHub:</b> https://github.com/ada</p>"));
        assert!(!html.contains("LinkedIn"));
        assert!(html.contains("<p><b>Expected Salary:</b> $4,000</p>"));
    }

    #[test]
    fn escape_html_converts_newlines() {
        assert_eq!(escape_html("a & b\nc"), "a &amp; b<br>c");
    }

    #[test]
    fn escape_html_drops_carriage_returns() {
        assert_eq!(escape_html("a\r\nb\rc"), "a<br>bc");
    }
}
