use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, orm_from_pool},
    encryption::Encryptor,
    error::AppResult,
    invoice::InvoiceClient,
    mailer::{LogMailer, Mailer},
    payments::{PaymentGateway, StripeGateway},
    signer::UrlSigner,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub payments: Arc<dyn PaymentGateway>,
    pub invoices: InvoiceClient,
    pub mailer: Arc<dyn Mailer>,
    pub signer: UrlSigner,
    pub encryptor: Encryptor,
}

impl AppState {
    /// Wire the production collaborators around an open pool. Sessions are a
    /// router layer, see [`crate::session::attach_sessions`].
    pub fn from_config(config: AppConfig, pool: DbPool) -> AppResult<Self> {
        let payments = Arc::new(StripeGateway::new(&config.stripe)?);
        let invoices = InvoiceClient::new(config.invoice_url.clone())?;

        Ok(Self {
            orm: orm_from_pool(&pool),
            pool,
            payments,
            invoices,
            mailer: Arc::new(LogMailer),
            signer: UrlSigner::new(&config.secret_key),
            encryptor: Encryptor::new(&config.secret_key),
            config: Arc::new(config),
        })
    }
}
