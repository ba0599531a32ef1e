use crate::config::EmailConfig;
use crate::error::{Error, Result};
use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use secrecy::ExposeSecret;
use std::sync::Arc;

/// Outbound transactional email.
#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send_welcome_email(&self, to_email: &str, first_name: Option<&str>) -> Result<()>;
    async fn send_new_message_email(
        &self,
        to_email: &str,
        sender_name: &str,
        subject: Option<&str>,
    ) -> Result<()>;
    async fn send_password_reset_email(&self, to_email: &str, token: &str) -> Result<()>;
}

/// A rendered email.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailTemplate {
    pub subject: String,
    pub html_body: String,
    /// Link the email points the reader to.
    pub link: String,
}

#[derive(Template)]
#[template(path = "emails/welcome.html")]
struct WelcomeEmail<'a> {
    first_name: Option<&'a str>,
    link: &'a str,
}

#[derive(Template)]
#[template(path = "emails/new_message.html")]
struct NewMessageEmail<'a> {
    sender_name: &'a str,
    subject: Option<&'a str>,
    link: &'a str,
}

#[derive(Template)]
#[template(path = "emails/password_reset.html")]
struct PasswordResetEmail<'a> {
    link: &'a str,
}

fn render(template: &impl Template) -> Result<String> {
    template
        .render()
        .map_err(|e| Error::Email(format!("Failed to render email template: {}", e)))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn welcome_template(first_name: Option<&str>, frontend_url: &str) -> Result<EmailTemplate> {
    let link = format!("{}/books", frontend_url.trim_end_matches('/'));
    let html_body = render(&WelcomeEmail {
        first_name: non_blank(first_name),
        link: &link,
    })?;

    Ok(EmailTemplate {
        subject: "Welcome to Bookineo".to_string(),
        html_body,
        link,
    })
}

pub fn new_message_template(
    sender_name: &str,
    subject: Option<&str>,
    frontend_url: &str,
) -> Result<EmailTemplate> {
    let link = format!("{}/messages", frontend_url.trim_end_matches('/'));
    let html_body = render(&NewMessageEmail {
        sender_name,
        subject: non_blank(subject),
        link: &link,
    })?;

    Ok(EmailTemplate {
        subject: format!("New message from {}", sender_name),
        html_body,
        link,
    })
}

pub fn password_reset_template(token: &str, frontend_url: &str) -> Result<EmailTemplate> {
    let link = format!(
        "{}/reset-password?token={}",
        frontend_url.trim_end_matches('/'),
        token
    );
    let html_body = render(&PasswordResetEmail { link: &link })?;

    Ok(EmailTemplate {
        subject: "Reset your Bookineo password".to_string(),
        html_body,
        link,
    })
}

/// Logs emails instead of sending them. Used when no SMTP host is configured.
pub struct LogEmailService {
    frontend_url: String,
}

impl LogEmailService {
    pub fn new(frontend_url: impl Into<String>) -> Self {
        Self {
            frontend_url: frontend_url.into(),
        }
    }

    fn log(&self, to_email: &str, template: &EmailTemplate) {
        tracing::info!(
            to = %to_email,
            subject = %template.subject,
            link = %template.link,
            "Email delivery disabled, logging email instead"
        );
    }
}

#[async_trait]
impl EmailService for LogEmailService {
    async fn send_welcome_email(&self, to_email: &str, first_name: Option<&str>) -> Result<()> {
        self.log(to_email, &welcome_template(first_name, &self.frontend_url)?);
        Ok(())
    }

    async fn send_new_message_email(
        &self,
        to_email: &str,
        sender_name: &str,
        subject: Option<&str>,
    ) -> Result<()> {
        self.log(
            to_email,
            &new_message_template(sender_name, subject, &self.frontend_url)?,
        );
        Ok(())
    }

    async fn send_password_reset_email(&self, to_email: &str, token: &str) -> Result<()> {
        self.log(to_email, &password_reset_template(token, &self.frontend_url)?);
        Ok(())
    }
}

/// Sends emails through an SMTP relay.
pub struct SmtpEmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    from_name: String,
    frontend_url: String,
}

impl SmtpEmailService {
    pub fn new(config: &EmailConfig, smtp_host: &str) -> Result<Self> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = match config.smtp_encryption.to_lowercase().as_str() {
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)
                .map_err(|e| Error::Email(format!("SMTP relay error: {}", e)))?
                .port(config.smtp_port)
                .credentials(credentials)
                .build(),
            "starttls" => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)
                .map_err(|e| Error::Email(format!("SMTP starttls error: {}", e)))?
                .port(config.smtp_port)
                .credentials(credentials)
                .build(),
            "none" => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host)
                .port(config.smtp_port)
                .credentials(credentials)
                .build(),
            other => {
                return Err(Error::Email(format!(
                    "Invalid smtp_encryption value: {}. Use 'tls', 'starttls', or 'none'",
                    other
                )));
            }
        };

        Ok(Self {
            mailer,
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
            frontend_url: config.frontend_url.clone(),
        })
    }

    async fn deliver(&self, to_email: &str, template: EmailTemplate) -> Result<()> {
        let email = Message::builder()
            .from(
                format!("{} <{}>", self.from_name, self.from_email)
                    .parse()
                    .map_err(|e| Error::Email(format!("Invalid from address: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| Error::Email(format!("Invalid to address: {}", e)))?)
            .subject(template.subject)
            .header(ContentType::TEXT_HTML)
            .body(template.html_body)
            .map_err(|e| Error::Email(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| Error::Email(e.to_string()))?;

        tracing::debug!(to = %to_email, "Email sent");
        Ok(())
    }
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send_welcome_email(&self, to_email: &str, first_name: Option<&str>) -> Result<()> {
        self.deliver(to_email, welcome_template(first_name, &self.frontend_url)?)
            .await
    }

    async fn send_new_message_email(
        &self,
        to_email: &str,
        sender_name: &str,
        subject: Option<&str>,
    ) -> Result<()> {
        self.deliver(
            to_email,
            new_message_template(sender_name, subject, &self.frontend_url)?,
        )
        .await
    }

    async fn send_password_reset_email(&self, to_email: &str, token: &str) -> Result<()> {
        self.deliver(to_email, password_reset_template(token, &self.frontend_url)?)
            .await
    }
}

/// Picks the SMTP sender when a host is configured, the logging one otherwise.
pub fn create_email_service(config: &EmailConfig) -> Result<Arc<dyn EmailService>> {
    match config.smtp_host.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
        Some(host) => {
            tracing::info!(host = %host, port = config.smtp_port, "Using SMTP email delivery");
            Ok(Arc::new(SmtpEmailService::new(config, host)?))
        }
        None => {
            tracing::warn!("No SMTP host configured, emails will only be logged");
            Ok(Arc::new(LogEmailService::new(config.frontend_url.clone())))
        }
    }
}
