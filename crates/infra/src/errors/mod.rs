//! Error conversions for the infrastructure layer

pub mod conversions;

pub use conversions::IntoApiError;
