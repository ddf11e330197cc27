//! Cluster-side helpers for the endpoint controller.
//!
//! - [`provider`] turns an endpoint's provider config reference into an
//!   authenticated [`Session`](crate::accounts::Session).
//! - [`endpoint_secret`] reads, writes and deletes the secret holding the
//!   minted token.

pub mod endpoint_secret;
pub mod provider;

pub use endpoint_secret::{
    create_endpoint_secret, delete_endpoint_secret, get_endpoint_secret, CreateSecretOpts,
    TARGET_KEY, TOKEN_KEY,
};
pub use provider::{
    admin_password_ref, get_config, get_initial_admin_password, use_provider_config,
    ADMIN_USERNAME, ARGOCD_INITIAL_ADMIN_SECRET, BASIC_AUTH_PASSWORD_KEY,
};
