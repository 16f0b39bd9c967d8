//! Inputs of a connect attempt.

use hrlink_protocol::{Category, ExchangeTokenRequest, LinkTokenRequest, Organization, Profile};

use crate::error::LinkError;

/// Who is connecting, and which integration domains they may pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
	/// Sent as `end_user_origin_id` and as the exchange's `user_id`.
	pub end_user_id: String,
	pub organization_name: String,
	pub email: String,
	pub categories: Vec<Category>,
	/// Sent as the exchange's `organization_id`.
	pub organization_id: String,
}

impl ConnectRequest {
	/// Request covering every category for a signed-in member.
	pub fn for_member(profile: &Profile, organization: &Organization, email: impl Into<String>) -> Self {
		Self {
			end_user_id: profile.id.clone(),
			organization_name: organization.name.clone(),
			email: email.into(),
			categories: Category::ALL.to_vec(),
			organization_id: organization.id.clone(),
		}
	}

	/// Rejects empty inputs.
	pub fn validate(&self) -> Result<(), LinkError> {
		let fields = [
			("end user id", self.end_user_id.as_str()),
			("organization name", self.organization_name.as_str()),
			("email address", self.email.as_str()),
			("organization id", self.organization_id.as_str()),
		];
		if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
			return Err(LinkError::InvalidRequest(format!("{name} must not be empty")));
		}
		if self.categories.is_empty() {
			return Err(LinkError::InvalidRequest(
				"at least one integration category is required".into(),
			));
		}
		Ok(())
	}

	pub fn link_token_request(&self) -> LinkTokenRequest {
		LinkTokenRequest {
			end_user_origin_id: self.end_user_id.clone(),
			end_user_organization_name: self.organization_name.clone(),
			end_user_email_address: self.email.clone(),
			categories: self.categories.clone(),
		}
	}

	pub fn exchange_request(&self, public_token: String) -> ExchangeTokenRequest {
		ExchangeTokenRequest {
			public_token,
			user_id: self.end_user_id.clone(),
			organization_id: self.organization_id.clone(),
		}
	}
}
