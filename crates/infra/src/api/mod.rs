//! Graph API access
//!
//! - [`classifier`] turns platform error bodies into [`ApiError`](adreach_domain::ApiError)s
//! - [`policy`] decides how each error kind is retried
//! - [`auth`] supplies bearer tokens
//! - [`client`] runs admission, transport and retries for every call

pub mod auth;
pub mod classifier;
pub mod client;
pub mod guard;
pub mod pagination;
pub mod policy;

pub use auth::{AccessTokenProvider, EnvTokenProvider, StaticTokenProvider, ACCESS_TOKEN_VAR};
pub use classifier::{classify, kind_for};
pub use client::{ApiClient, ApiClientBuilder};
pub use guard::{ensure_mutations_allowed, is_mutation_tool};
pub use policy::ApiRetryPolicy;
