use async_trait::async_trait;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use tracing::debug;
use traino_config::SmtpSettings;

use super::templates::EmailContent;
use super::{EmailSender, SendError};

/// SMTP-backed email sender. The transport keeps a connection pool, so one
/// instance is shared for the process lifetime.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, SendError> {
        let from = settings
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| SendError::InvalidAddress(format!("{}: {e}", settings.from_address)))?;

        let mut builder = if settings.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
                .map_err(|e| SendError::Smtp(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };

        builder = builder.port(settings.port);

        if !settings.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(
        &self,
        to_name: &str,
        to_email: &str,
        content: &EmailContent,
    ) -> Result<(), SendError> {
        let address: Address = to_email
            .parse()
            .map_err(|e| SendError::InvalidAddress(format!("{to_email}: {e}")))?;
        let to = Mailbox::new(Some(to_name.to_string()), address);

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&content.subject)
            .multipart(MultiPart::alternative_plain_html(
                content.text.clone(),
                content.html.clone(),
            ))
            .map_err(|e| SendError::Smtp(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| SendError::Smtp(e.to_string()))?;

        debug!(to = %to_email, "Email sent");
        Ok(())
    }
}
