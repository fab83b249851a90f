use crate::config::Config;

use async_trait::async_trait;
use lettre::message::header::{ContentType, ContentTypeErr};
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailBody {
    Html(String),
    Text(String),
}

/// A file on disk to attach under a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub filename: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: EmailBody,
    pub attachments: Vec<FileAttachment>,
}

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("Invalid email address format: {0}")]
    AddressFormat(#[from] lettre::address::AddressError),

    #[error("Failed to build email message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid attachment content type: {0}")]
    ContentType(#[from] ContentTypeErr),

    #[error("Failed to read attachment '{filename}': {source}")]
    Attachment {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    SmtpTransport(#[from] lettre::transport::smtp::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailerError>;
}

pub struct SmtpMailer {
    sender: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Builds the pooled SMTP transport once. No connection is made until the
    /// first send.
    pub fn new(config: &Config) -> Result<Self, MailerError> {
        let sender = Mailbox::new(Some(config.brand_name.clone()), config.email_user.parse()?);

        let builder = if config.email_secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.email_host)?
        } else {
            let tls = TlsParameters::new(config.email_host.clone())?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.email_host)
                .tls(Tls::Opportunistic(tls))
        };

        let transport = builder
            .port(config.email_port)
            .credentials(Credentials::new(
                config.email_user.clone(),
                config.email_pass.clone(),
            ))
            .build();

        Ok(Self { sender, transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailerError> {
        let to = email.to.clone();
        let subject = email.subject.clone();
        let message = build_message(&self.sender, email).await?;

        tracing::info!("Sending email to '{}' with subject '{}'", to, subject);

        self.transport.send(message).await?;

        tracing::info!("Message to {} sent successfully", to);
        Ok(())
    }
}

/// Turns an [`OutgoingEmail`] into a MIME message, reading attachments from
/// disk.
pub async fn build_message(sender: &Mailbox, email: OutgoingEmail) -> Result<Message, MailerError> {
    let builder = Message::builder()
        .from(sender.clone())
        .to(email.to.parse()?)
        .subject(email.subject);

    if email.attachments.is_empty() {
        let message = match email.body {
            EmailBody::Html(html) => builder.header(ContentType::TEXT_HTML).body(html)?,
            EmailBody::Text(text) => builder.header(ContentType::TEXT_PLAIN).body(text)?,
        };
        return Ok(message);
    }

    let mut parts = MultiPart::mixed().singlepart(match email.body {
        EmailBody::Html(html) => SinglePart::html(html),
        EmailBody::Text(text) => SinglePart::plain(text),
    });

    for attachment in email.attachments {
        let content = tokio::fs::read(&attachment.path)
            .await
            .map_err(|source| MailerError::Attachment {
                filename: attachment.filename.clone(),
                source,
            })?;
        let content_type = content_type_for(&attachment.filename)?;
        parts = parts.singlepart(Attachment::new(attachment.filename).body(content, content_type));
    }

    Ok(builder.multipart(parts)?)
}

fn content_type_for(filename: &str) -> Result<ContentType, ContentTypeErr> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let mime = match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("odt") => "application/vnd.oasis.opendocument.text",
        Some("rtf") => "application/rtf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    };

    ContentType::parse(mime)
}
