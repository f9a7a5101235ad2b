use async_trait::async_trait;

use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: Message) -> AppResult<()>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: Message) -> AppResult<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "outgoing mail"
        );
        Ok(())
    }
}
