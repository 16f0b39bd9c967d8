//! Request and response bodies for the link-token backend.
//!
//! The backend exposes two calls used by a connect attempt:
//!
//! 1. `POST /create-link-token` with [`LinkTokenRequest`], answered by [`LinkTokenResponse`]
//! 2. `POST /exchange-token` with [`ExchangeTokenRequest`], answered by an opaque JSON object
//!
//! Any non-2xx answer may carry an [`ErrorBody`] whose `detail` is shown to the user verbatim.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Path of the link-token issuance endpoint.
pub const CREATE_LINK_TOKEN_PATH: &str = "/create-link-token";

/// Path of the public-token exchange endpoint.
pub const EXCHANGE_TOKEN_PATH: &str = "/exchange-token";

/// Path of the backend liveness probe.
pub const HEALTH_PATH: &str = "/health";

/// Integration domain a link session is allowed to connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
	/// Human resources information systems.
	Hris,
	/// Applicant tracking systems.
	Ats,
	Accounting,
	Ticketing,
	Crm,
	/// File storage providers.
	Filestorage,
}

impl Category {
	/// Every category, in the order the widget lists them.
	pub const ALL: [Category; 6] = [
		Category::Hris,
		Category::Ats,
		Category::Accounting,
		Category::Ticketing,
		Category::Crm,
		Category::Filestorage,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Category::Hris => "hris",
			Category::Ats => "ats",
			Category::Accounting => "accounting",
			Category::Ticketing => "ticketing",
			Category::Crm => "crm",
			Category::Filestorage => "filestorage",
		}
	}
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Category {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Category::ALL
			.into_iter()
			.find(|category| category.as_str().eq_ignore_ascii_case(s))
			.ok_or_else(|| format!("unknown category: {s}"))
	}
}

/// Body of `POST /create-link-token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTokenRequest {
	/// Stable identifier of the end user in this system.
	pub end_user_origin_id: String,
	pub end_user_organization_name: String,
	pub end_user_email_address: String,
	pub categories: Vec<Category>,
}

/// Response of `POST /create-link-token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTokenResponse {
	/// Short-lived bearer token authorizing one widget session.
	pub link_token: String,
}

/// Body of `POST /exchange-token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeTokenRequest {
	/// Token reported by the widget on success.
	pub public_token: String,
	pub user_id: String,
	pub organization_id: String,
}

/// Error body attached to non-2xx backend responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub detail: Option<String>,
}

impl ErrorBody {
	/// Extracts a non-empty `detail` string from a raw response body.
	///
	/// Returns [`None`] when the body is not JSON, has no `detail`, or the
	/// `detail` is blank.
	pub fn detail_from(body: &str) -> Option<String> {
		serde_json::from_str::<ErrorBody>(body)
			.ok()
			.and_then(|parsed| parsed.detail)
			.filter(|detail| !detail.trim().is_empty())
	}
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
	pub status: String,
}

impl HealthStatus {
	pub fn is_healthy(&self) -> bool {
		self.status == "healthy"
	}
}
