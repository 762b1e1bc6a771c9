use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};

use super::{AccrualAuthority, AccrualError, AccrualReport};
use crate::db_types::OrderNumber;

pub const DEFAULT_ACCRUAL_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for the accrual authority. Queries `GET {base}/orders/{number}`.
#[derive(Clone)]
pub struct AccrualClient {
    base_url: String,
    timeout: Duration,
    client: Arc<Client>,
}

impl std::fmt::Debug for AccrualClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccrualClient ({})", self.base_url)
    }
}

impl AccrualClient {
    /// Creates a client for the authority at `base_url`. Every request is abandoned after `timeout`.
    ///
    /// A base URL without a scheme, such as `localhost:8080/api`, is assumed to be plain HTTP.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AccrualError> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AccrualError::Configuration(e.to_string()))?;
        Ok(Self { base_url, timeout, client: Arc::new(client) })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn url(&self, number: &OrderNumber) -> String {
        format!("{}/orders/{number}", self.base_url)
    }
}

impl AccrualAuthority for AccrualClient {
    async fn fetch_accrual(&self, number: &OrderNumber) -> Result<AccrualReport, AccrualError> {
        let url = self.url(number);
        trace!("🌐️ GET {url}");
        let response = self.client.get(&url).send().await?;
        match response.status() {
            StatusCode::OK => {
                let report = response.json::<AccrualReport>().await?;
                trace!("🌐️ Order [{number}] is {:?} at the accrual authority", report.status);
                Ok(report)
            },
            StatusCode::NO_CONTENT => Err(AccrualError::NotRegistered(number.to_string())),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(AccrualError::RateLimited { retry_after })
            },
            status => {
                let status = status.as_u16();
                let message = response.text().await.unwrap_or_default();
                Err(AccrualError::UnexpectedStatus { status, message })
            },
        }
    }
}

fn normalize_base_url(base_url: &str) -> Result<String, AccrualError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AccrualError::Configuration("The accrual authority address is empty".into()));
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("http://{trimmed}"))
    }
}
