use anyhow::{Context, Result};

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub http_addr: String,
    pub currency: String,
}

impl ServiceConfig {
    /// Without `DATABASE_URL` the service runs on the in-memory store; without
    /// `REDIS_URL` change notifications are not published.
    pub fn from_env(default_http_addr: &str) -> Result<Self> {
        let database_url = optional_var("DATABASE_URL")?;
        let redis_url = optional_var("REDIS_URL")?;
        let http_addr =
            std::env::var("HTTP_ADDR").unwrap_or_else(|_| default_http_addr.to_string());
        let currency = std::env::var("MIZAN_CURRENCY").unwrap_or_else(|_| "EGP".to_string());

        Ok(Self {
            database_url,
            redis_url,
            http_addr,
            currency,
        })
    }
}

fn optional_var(name: &str) -> Result<Option<String>> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("{name} is not valid unicode")),
    }
}
