//! Shared helpers for unit and router tests.

use crate::{
    dto::{CareerRequest, ContactRequest},
    mailer::{Mailer, MailerError, OutgoingEmail},
    service::RelayService,
    upload::StagingDir,
};

use async_trait::async_trait;
use axum_test::TestServer;
use lettre::Address;

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub email: OutgoingEmail,
    /// Attachment bytes as they were on disk at send time
    pub attachment_contents: Vec<Vec<u8>>,
}

/// Mailer double that records every successful send and can fail the n-th
/// attempt (1-based).
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    attempts: AtomicUsize,
    fail_on_attempt: Option<usize>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(attempt: usize) -> Self {
        Self {
            fail_on_attempt: Some(attempt),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailerError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_attempt == Some(attempt) {
            let err = "unreachable.mailbox".parse::<Address>().unwrap_err();
            return Err(MailerError::AddressFormat(err));
        }

        let mut attachment_contents = Vec::new();
        for attachment in &email.attachments {
            let content = tokio::fs::read(&attachment.path)
                .await
                .map_err(|source| MailerError::Attachment {
                    filename: attachment.filename.clone(),
                    source,
                })?;
            attachment_contents.push(content);
        }

        self.sent.lock().unwrap().push(SentEmail {
            email,
            attachment_contents,
        });
        Ok(())
    }
}

pub fn contact_request() -> ContactRequest {
    ContactRequest {
        name: "Ada".to_string(),
        email: "ada@x.com".to_string(),
        phone: "1234567890".to_string(),
        service: "Web Development".to_string(),
        budget: "$500 - $1,000".to_string(),
        message: "Need a site".to_string(),
    }
}

pub fn career_request() -> CareerRequest {
    CareerRequest {
        name: "Ada".to_string(),
        email: "ada@x.com".to_string(),
        phone: "1234567890".to_string(),
        position: "Frontend Developer".to_string(),
        experience: "3-5 years".to_string(),
        expected_salary: "$4,000".to_string(),
        message: "I would love to join the team".to_string(),
        ..CareerRequest::default()
    }
}

/// Router under test plus the temp dir backing its staging directory.
pub async fn create_test_app(
    mailer: Arc<dyn Mailer>,
    max_upload_bytes: usize,
) -> (TestServer, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let staging = StagingDir::create(tmp.path()).await.unwrap();
    let service = RelayService::new(
        mailer,
        staging,
        "admin@laverse.test".to_string(),
        "Laverse Digital".to_string(),
    );

    let server = TestServer::new(crate::router(Arc::new(service), max_upload_bytes)).unwrap();
    (server, tmp)
}
