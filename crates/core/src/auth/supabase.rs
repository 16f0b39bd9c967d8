//! [`AuthService`] over the hosted database's REST endpoints.
//!
//! - auth: `/auth/v1/token`, `/auth/v1/signup`, `/auth/v1/logout`, `/auth/v1/user`
//! - rows: `/rest/v1/profiles`, `/rest/v1/organizations`

use async_trait::async_trait;
use hrlink_protocol::{NewOrganization, NewProfile, Organization, Profile};
use parking_lot::Mutex;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::{AuthService, AuthUser};
use crate::config::{AuthConfig, with_trailing_slash};
use crate::error::AuthError;

const PROFILES_TABLE: &str = "profiles";
const ORGANIZATIONS_TABLE: &str = "organizations";

#[derive(Debug, Deserialize)]
struct SessionResponse {
	access_token: String,
	user: AuthUser,
}

/// Sign-up answers with a session when email confirmation is off, and with
/// the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
	Session(SessionResponse),
	User(AuthUser),
}

/// Error body shapes used by the hosted auth and REST layers.
#[derive(Debug, Default, Deserialize)]
struct HostedError {
	msg: Option<String>,
	message: Option<String>,
	error_description: Option<String>,
	error: Option<String>,
}

impl HostedError {
	fn message(body: &str) -> String {
		let parsed: HostedError = serde_json::from_str(body).unwrap_or_default();
		parsed
			.msg
			.or(parsed.error_description)
			.or(parsed.message)
			.or(parsed.error)
			.unwrap_or_else(|| body.trim().to_string())
	}
}

#[derive(Serialize)]
struct Credentials<'a> {
	email: &'a str,
	password: &'a str,
}

/// Hosted database client holding the current session's access token.
pub struct SupabaseClient {
	config: AuthConfig,
	http: reqwest::Client,
	access_token: Mutex<Option<String>>,
}

impl SupabaseClient {
	pub fn new(mut config: AuthConfig) -> Self {
		config.url = with_trailing_slash(config.url);
		Self {
			config,
			http: reqwest::Client::new(),
			access_token: Mutex::new(None),
		}
	}

	pub fn is_signed_in(&self) -> bool {
		self.access_token.lock().is_some()
	}

	fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
		self.config.url.join(path).map_err(|err| AuthError::Transport {
			url: format!("{}{path}", self.config.url),
			message: err.to_string(),
		})
	}

	/// Adds the API key and the bearer token (session token, else the anon key).
	fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
		let bearer = self
			.access_token
			.lock()
			.clone()
			.unwrap_or_else(|| self.config.anon_key.clone());
		request
			.header("apikey", &self.config.anon_key)
			.bearer_auth(bearer)
	}

	async fn send(&self, url: &Url, request: RequestBuilder) -> Result<(StatusCode, String), AuthError> {
		let transport = |err: reqwest::Error| AuthError::Transport {
			url: url.to_string(),
			message: err.to_string(),
		};
		let response = self.authorize(request).send().await.map_err(transport)?;
		let status = response.status();
		let body = response.text().await.map_err(transport)?;
		debug!(target = "hrlink", url = %url, status = status.as_u16(), "auth service response");
		Ok((status, body))
	}

	async fn send_json<T: DeserializeOwned>(&self, url: &Url, request: RequestBuilder) -> Result<T, AuthError> {
		let (status, body) = self.send(url, request).await?;
		if !status.is_success() {
			return Err(AuthError::Rejected {
				status: status.as_u16(),
				message: HostedError::message(&body),
			});
		}
		serde_json::from_str(&body).map_err(|err| AuthError::Decode(err.to_string()))
	}

	async fn select_by_id<T: DeserializeOwned>(&self, table: &str, id: &str) -> Result<Option<T>, AuthError> {
		let url = self.endpoint(&format!("rest/v1/{table}"))?;
		let request = self
			.http
			.get(url.clone())
			.query(&[("id", format!("eq.{id}")), ("select", "*".to_string())]);
		let rows: Vec<T> = self.send_json(&url, request).await?;
		Ok(rows.into_iter().next())
	}

	async fn insert_row<B, T>(&self, table: &'static str, row: &B) -> Result<T, AuthError>
	where
		B: Serialize + Sync,
		T: DeserializeOwned,
	{
		let url = self.endpoint(&format!("rest/v1/{table}"))?;
		let request = self
			.http
			.post(url.clone())
			.header("Prefer", "return=representation")
			.json(row);
		let rows: Vec<T> = self.send_json(&url, request).await?;
		rows.into_iter().next().ok_or(AuthError::MissingRow(table))
	}
}

#[async_trait]
impl AuthService for SupabaseClient {
	async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
		let url = self.endpoint("auth/v1/token?grant_type=password")?;
		let request = self.http.post(url.clone()).json(&Credentials { email, password });
		let session: SessionResponse = self.send_json(&url, request).await?;
		*self.access_token.lock() = Some(session.access_token);
		info!(target = "hrlink", user = %session.user.id, "auth session established");
		Ok(session.user)
	}

	async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
		let url = self.endpoint("auth/v1/signup")?;
		let request = self.http.post(url.clone()).json(&Credentials { email, password });
		let (status, body) = self.send(&url, request).await?;
		if !status.is_success() {
			return Err(AuthError::Rejected {
				status: status.as_u16(),
				message: HostedError::message(&body),
			});
		}
		match serde_json::from_str::<SignUpResponse>(&body) {
			Ok(SignUpResponse::Session(session)) => {
				*self.access_token.lock() = Some(session.access_token);
				Ok(session.user)
			}
			Ok(SignUpResponse::User(user)) => Ok(user),
			Err(_) => Err(AuthError::MissingUser),
		}
	}

	async fn sign_out(&self) -> Result<(), AuthError> {
		if !self.is_signed_in() {
			return Ok(());
		}
		let url = self.endpoint("auth/v1/logout")?;
		let result = self.send(&url, self.http.post(url.clone())).await;
		*self.access_token.lock() = None;
		let (status, body) = result?;
		if status.is_success() || status == StatusCode::UNAUTHORIZED {
			Ok(())
		} else {
			Err(AuthError::Rejected {
				status: status.as_u16(),
				message: HostedError::message(&body),
			})
		}
	}

	async fn current_user(&self) -> Result<Option<AuthUser>, AuthError> {
		if !self.is_signed_in() {
			return Ok(None);
		}
		let url = self.endpoint("auth/v1/user")?;
		let (status, body) = self.send(&url, self.http.get(url.clone())).await?;
		match status {
			StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
			status if status.is_success() => serde_json::from_str(&body)
				.map(Some)
				.map_err(|err| AuthError::Decode(err.to_string())),
			status => Err(AuthError::Rejected {
				status: status.as_u16(),
				message: HostedError::message(&body),
			}),
		}
	}

	async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, AuthError> {
		self.select_by_id(PROFILES_TABLE, user_id).await
	}

	async fn fetch_organization(&self, organization_id: &str) -> Result<Option<Organization>, AuthError> {
		self.select_by_id(ORGANIZATIONS_TABLE, organization_id).await
	}

	async fn insert_organization(&self, organization: &NewOrganization) -> Result<Organization, AuthError> {
		self.insert_row(ORGANIZATIONS_TABLE, organization).await
	}

	async fn insert_profile(&self, profile: &NewProfile) -> Result<Profile, AuthError> {
		self.insert_row(PROFILES_TABLE, profile).await
	}
}
