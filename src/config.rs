use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub key: String,
    pub secret: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub stripe: StripeConfig,
    /// Key material for signed links and the reset-form encryption.
    pub secret_key: String,
    pub front_end: String,
    pub invoice_url: String,
    pub session_backend: SessionBackend,
    pub cookie_secure: bool,
}

pub const DEFAULT_INVOICE_URL: &str = "http://localhost:5000/invoice/create-and-send";

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(4000);

        let secret_key = env::var("SECRET_KEY")
            .map_err(|_| anyhow::anyhow!("SECRET_KEY is not set"))?;
        if secret_key.len() < 32 {
            anyhow::bail!("SECRET_KEY must be at least 32 characters");
        }

        let stripe = StripeConfig {
            key: env::var("STRIPE_KEY").unwrap_or_default(),
            secret: env::var("STRIPE_SECRET").unwrap_or_default(),
            api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
        };

        let front_end =
            env::var("FRONT_END").unwrap_or_else(|_| format!("http://localhost:{port}"));
        let invoice_url =
            env::var("INVOICE_URL").unwrap_or_else(|_| DEFAULT_INVOICE_URL.to_string());

        let session_backend = match env::var("SESSION_BACKEND").as_deref() {
            Ok("memory") => SessionBackend::Memory,
            Ok("postgres") | Err(_) => SessionBackend::Postgres,
            Ok(other) => anyhow::bail!("unknown SESSION_BACKEND {other:?}"),
        };

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            port,
            database_url,
            host,
            stripe,
            secret_key,
            front_end: front_end.trim_end_matches('/').to_string(),
            invoice_url,
            session_backend,
            cookie_secure,
        })
    }
}
