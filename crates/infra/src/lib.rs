//! # AdReach Infrastructure
//!
//! Everything that talks to the outside world:
//! - the Graph API client, with rate admission and classified retries
//! - configuration loading from the environment or a file
//! - the `reqwest` transport wrapper
//! - tracing subscriber setup
//!
//! Platform-independent primitives live in `adreach-common`; error and
//! pagination types live in `adreach-domain`.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

pub use api::{
    is_mutation_tool, AccessTokenProvider, ApiClient, ApiClientBuilder, ApiRetryPolicy,
    EnvTokenProvider, StaticTokenProvider,
};
pub use config::{ClientConfig, ConfigError, RetryTuning};
pub use errors::IntoApiError;
pub use http::{HttpClient, HttpClientBuilder, HttpResponse, TransportError};
pub use observability::{init_tracing, LogFormat};
