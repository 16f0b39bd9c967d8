//! Rows of the hosted `profiles` and `organizations` tables.

use serde::{Deserialize, Serialize};

/// Role of a member inside their organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	Admin,
	Member,
}

/// A signed-up user, linked to exactly one [`Organization`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
	/// Same identifier as the hosted auth user.
	pub id: String,
	pub organization_id: String,
	pub full_name: String,
	pub role: Role,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
	pub id: String,
	pub name: String,
	/// Billing plan name, `"free"` for new sign-ups.
	pub plan: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<String>,
}

/// Insert payload for the `organizations` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrganization {
	pub name: String,
	pub plan: String,
}

/// Insert payload for the `profiles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProfile {
	pub id: String,
	pub organization_id: String,
	pub full_name: String,
	pub role: Role,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn profile_deserializes_hosted_row() {
		let row = r#"{
			"id": "u-1",
			"organization_id": "o-1",
			"full_name": "Jo Doe",
			"role": "admin",
			"created_at": "2024-01-01T00:00:00Z"
		}"#;
		let profile: Profile = serde_json::from_str(row).unwrap();
		assert_eq!(profile.role, Role::Admin);
		assert_eq!(profile.organization_id, "o-1");
	}

	#[test]
	fn new_profile_serializes_role_lowercase() {
		let insert = NewProfile {
			id: "u-1".into(),
			organization_id: "o-1".into(),
			full_name: "Jo Doe".into(),
			role: Role::Member,
		};
		let value = serde_json::to_value(&insert).unwrap();
		assert_eq!(value["role"], "member");
	}
}
