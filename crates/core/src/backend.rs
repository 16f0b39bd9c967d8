//! Backend calls made during a connect attempt.

use async_trait::async_trait;
use hrlink_protocol::{
	CREATE_LINK_TOKEN_PATH, EXCHANGE_TOKEN_PATH, ErrorBody, ExchangeTokenRequest, HEALTH_PATH,
	HealthStatus, LinkTokenRequest, LinkTokenResponse,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::BACKEND_URL_ENV;
use crate::error::BackendError;
use crate::redact;

/// The two backend calls a connect attempt makes.
///
/// Each call is a single outstanding request; the controller never issues
/// them concurrently.
#[async_trait]
pub trait LinkBackend: Send + Sync {
	/// Issues a short-lived link token for one widget session.
	async fn create_link_token(&self, request: &LinkTokenRequest) -> Result<String, BackendError>;

	/// Exchanges the widget's public token. The result shape is owned by the backend.
	async fn exchange_token(&self, request: &ExchangeTokenRequest) -> Result<Value, BackendError>;
}

/// [`LinkBackend`] over HTTP JSON.
#[derive(Debug, Clone)]
pub struct HttpBackend {
	base_url: Option<String>,
	http: reqwest::Client,
}

impl HttpBackend {
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: Some(base_url.into()),
			http: reqwest::Client::new(),
		}
	}

	/// Reads the base URL from [`BACKEND_URL_ENV`].
	///
	/// A missing value is not an error here; every request then fails with
	/// [`BackendError::Config`].
	pub fn from_env() -> Self {
		Self {
			base_url: std::env::var(BACKEND_URL_ENV).ok(),
			http: reqwest::Client::new(),
		}
	}

	/// Uses a preconfigured client (timeouts, proxies).
	pub fn with_client(mut self, http: reqwest::Client) -> Self {
		self.http = http;
		self
	}

	pub fn base_url(&self) -> Option<&str> {
		self.base_url.as_deref()
	}

	/// Probes `GET /health`.
	pub async fn health(&self) -> Result<HealthStatus, BackendError> {
		let url = self.endpoint(HEALTH_PATH)?;
		let response = self
			.http
			.get(url.clone())
			.send()
			.await
			.map_err(|err| transport(&url, err))?;
		decode(&url, response).await
	}

	fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
		let base = self
			.base_url
			.as_deref()
			.map(str::trim)
			.filter(|base| !base.is_empty())
			.ok_or_else(|| BackendError::Config(format!("{BACKEND_URL_ENV} is not set")))?;

		Url::parse(&format!("{}{path}", base.trim_end_matches('/')))
			.map_err(|err| BackendError::Config(format!("invalid {BACKEND_URL_ENV} '{base}': {err}")))
	}

	async fn post_json<B, T>(&self, url: &Url, body: &B) -> Result<T, BackendError>
	where
		B: Serialize + ?Sized + Sync,
		T: DeserializeOwned,
	{
		debug!(target = "hrlink", url = %url, "POST");
		let response = self
			.http
			.post(url.clone())
			.json(body)
			.send()
			.await
			.map_err(|err| transport(url, err))?;
		decode(url, response).await
	}
}

#[async_trait]
impl LinkBackend for HttpBackend {
	async fn create_link_token(&self, request: &LinkTokenRequest) -> Result<String, BackendError> {
		info!(
			target = "hrlink",
			email = %request.end_user_email_address,
			"requesting link token"
		);
		let url = self.endpoint(CREATE_LINK_TOKEN_PATH)?;
		let response: LinkTokenResponse = self.post_json(&url, request).await?;
		if response.link_token.trim().is_empty() {
			return Err(BackendError::Decode {
				url: url.to_string(),
				message: "empty link_token".into(),
			});
		}
		info!(target = "hrlink", token = %redact(&response.link_token), "received link token");
		Ok(response.link_token)
	}

	async fn exchange_token(&self, request: &ExchangeTokenRequest) -> Result<Value, BackendError> {
		info!(
			target = "hrlink",
			user_id = %request.user_id,
			token = %redact(&request.public_token),
			"exchanging public token"
		);
		let url = self.endpoint(EXCHANGE_TOKEN_PATH)?;
		let payload: Value = self.post_json(&url, request).await?;
		info!(target = "hrlink", "token exchange succeeded");
		Ok(payload)
	}
}

fn transport(url: &Url, err: reqwest::Error) -> BackendError {
	warn!(target = "hrlink", url = %url, error = %err, "backend request failed");
	BackendError::Transport {
		url: url.to_string(),
		message: err.to_string(),
	}
}

async fn decode<T: DeserializeOwned>(url: &Url, response: reqwest::Response) -> Result<T, BackendError> {
	let status = response.status();
	let body = response.text().await.map_err(|err| transport(url, err))?;

	if !status.is_success() {
		let detail = ErrorBody::detail_from(&body);
		warn!(
			target = "hrlink",
			url = %url,
			status = status.as_u16(),
			detail = detail.as_deref().unwrap_or(""),
			"backend returned an error status"
		);
		return Err(BackendError::Status {
			status: status.as_u16(),
			detail,
		});
	}

	serde_json::from_str(&body).map_err(|err| BackendError::Decode {
		url: url.to_string(),
		message: err.to_string(),
	})
}
