//! Wire types shared between the hrlink controller, its backend, and the
//! hosted record store.
//!
//! # Main Types
//!
//! - [`LinkTokenRequest`] / [`LinkTokenResponse`] - `POST /create-link-token`
//! - [`ExchangeTokenRequest`] - `POST /exchange-token`
//! - [`Category`] - integration domains a link session may cover
//! - [`ErrorBody`] - `{detail}` body returned on non-2xx responses
//! - [`Profile`] / [`Organization`] - hosted records consumed by the auth store

mod link;
mod records;

pub use link::{
	CREATE_LINK_TOKEN_PATH, Category, EXCHANGE_TOKEN_PATH, ErrorBody, ExchangeTokenRequest,
	HEALTH_PATH, HealthStatus, LinkTokenRequest, LinkTokenResponse,
};
pub use records::{NewOrganization, NewProfile, Organization, Profile, Role};
