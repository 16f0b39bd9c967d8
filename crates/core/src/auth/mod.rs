//! Signed-in member context backed by a hosted database.
//!
//! [`AuthService`] is the seam to the hosted backend; [`SupabaseClient`]
//! implements it over the hosted REST API. [`AuthStore`] caches the two rows
//! that identify a member: their [`Profile`] and its [`Organization`].

mod store;
mod supabase;

use async_trait::async_trait;
use hrlink_protocol::{NewOrganization, NewProfile, Organization, Profile};
use serde::Deserialize;

pub use store::{AuthState, AuthStore};
pub use supabase::SupabaseClient;

use crate::error::AuthError;

/// User record of the hosted auth service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
	pub id: String,
	#[serde(default)]
	pub email: Option<String>,
}

/// Session change pushed by the hosted auth service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
	SignedIn,
	SignedOut,
}

/// Hosted authentication and the `profiles`/`organizations` tables.
#[async_trait]
pub trait AuthService: Send + Sync {
	async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

	/// Returns [`AuthError::MissingUser`] if the service created no user.
	async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

	async fn sign_out(&self) -> Result<(), AuthError>;

	/// The user of the current session, or [`None`] when signed out.
	async fn current_user(&self) -> Result<Option<AuthUser>, AuthError>;

	async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, AuthError>;

	async fn fetch_organization(&self, organization_id: &str) -> Result<Option<Organization>, AuthError>;

	async fn insert_organization(&self, organization: &NewOrganization) -> Result<Organization, AuthError>;

	async fn insert_profile(&self, profile: &NewProfile) -> Result<Profile, AuthError>;
}
