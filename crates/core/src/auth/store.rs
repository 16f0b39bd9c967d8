use std::sync::Arc;

use hrlink_protocol::{NewOrganization, NewProfile, Organization, Profile, Role};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::{AuthEvent, AuthService};
use crate::error::AuthError;

/// Plan assigned to organizations created at sign-up.
pub const DEFAULT_PLAN: &str = "free";

/// Cached member context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
	pub is_loading: bool,
	pub profile: Option<Profile>,
	pub organization: Option<Organization>,
}

impl AuthState {
	/// True only when both rows are loaded and the profile points at the organization.
	pub fn is_authenticated(&self) -> bool {
		match (&self.profile, &self.organization) {
			(Some(profile), Some(organization)) => profile.organization_id == organization.id,
			_ => false,
		}
	}
}

/// Thin cache over an [`AuthService`].
pub struct AuthStore {
	service: Arc<dyn AuthService>,
	state: RwLock<AuthState>,
}

impl AuthStore {
	/// Starts in the loading state until [`load_user_data`](Self::load_user_data) runs.
	pub fn new(service: Arc<dyn AuthService>) -> Self {
		Self {
			service,
			state: RwLock::new(AuthState {
				is_loading: true,
				..AuthState::default()
			}),
		}
	}

	pub fn state(&self) -> AuthState {
		self.state.read().clone()
	}

	pub fn is_authenticated(&self) -> bool {
		self.state.read().is_authenticated()
	}

	pub fn set_profile(&self, profile: Option<Profile>) {
		self.state.write().profile = profile;
	}

	pub fn set_organization(&self, organization: Option<Organization>) {
		self.state.write().organization = organization;
	}

	pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
		let user = self.service.sign_in_with_password(email, password).await?;
		info!(target = "hrlink", user = %user.id, "signed in");
		self.load_user_data().await
	}

	/// Creates the auth user, an organization on the free plan, and an admin
	/// profile linking the two.
	///
	/// Does not load the new rows; the service's sign-in event does that.
	pub async fn sign_up(
		&self,
		email: &str,
		password: &str,
		full_name: &str,
		organization_name: &str,
	) -> Result<(), AuthError> {
		let user = self.service.sign_up(email, password).await?;

		let organization = self
			.service
			.insert_organization(&NewOrganization {
				name: organization_name.to_string(),
				plan: DEFAULT_PLAN.to_string(),
			})
			.await?;

		self.service
			.insert_profile(&NewProfile {
				id: user.id.clone(),
				organization_id: organization.id.clone(),
				full_name: full_name.to_string(),
				role: Role::Admin,
			})
			.await?;

		info!(
			target = "hrlink",
			user = %user.id,
			organization = %organization.id,
			"signed up"
		);
		Ok(())
	}

	pub async fn sign_out(&self) -> Result<(), AuthError> {
		self.service.sign_out().await?;
		self.clear();
		info!(target = "hrlink", "signed out");
		Ok(())
	}

	/// Refreshes the cached rows from the current session.
	///
	/// Clears both rows when nobody is signed in. `is_loading` is cleared on
	/// every exit path, including errors.
	pub async fn load_user_data(&self) -> Result<(), AuthError> {
		self.state.write().is_loading = true;
		let result = self.fetch_user_data().await;
		self.state.write().is_loading = false;
		if let Err(err) = &result {
			warn!(target = "hrlink", error = %err, "failed to load user data");
		}
		result
	}

	async fn fetch_user_data(&self) -> Result<(), AuthError> {
		let Some(user) = self.service.current_user().await? else {
			debug!(target = "hrlink", "no signed-in user");
			self.clear();
			return Ok(());
		};

		// Rows cached for another user never survive into this load
		let switched = self
			.state
			.read()
			.profile
			.as_ref()
			.is_some_and(|profile| profile.id != user.id);
		if switched {
			self.clear();
		}

		let profile = self.service.fetch_profile(&user.id).await?;
		let organization = match &profile {
			Some(profile) => self.service.fetch_organization(&profile.organization_id).await?,
			None => {
				debug!(target = "hrlink", user = %user.id, "no profile for user");
				None
			}
		};
		if profile.is_some() && organization.is_none() {
			debug!(target = "hrlink", user = %user.id, "no organization for profile");
		}

		let mut state = self.state.write();
		state.profile = profile;
		state.organization = organization;
		Ok(())
	}

	/// Reacts to a session change pushed by the service.
	pub async fn handle_auth_event(&self, event: AuthEvent) -> Result<(), AuthError> {
		match event {
			AuthEvent::SignedIn => self.load_user_data().await,
			AuthEvent::SignedOut => {
				self.clear();
				Ok(())
			}
		}
	}

	fn clear(&self) {
		let mut state = self.state.write();
		state.profile = None;
		state.organization = None;
	}
}
