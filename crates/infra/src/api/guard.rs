//! Write protection for tool handlers

use adreach_domain::constants::MUTATION_PREFIXES;
use adreach_domain::ApiError;

pub const MUTATIONS_DISABLED: &str =
    "mutations are disabled; set ALLOW_MUTATIONS=true to enable write operations";

/// Whether a tool name denotes a write operation
pub fn is_mutation_tool(name: &str) -> bool {
    MUTATION_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// `Permission` error unless writes are enabled
///
/// # Errors
///
/// Returns an `ApiError` of kind `Permission` when `allow_mutations` is off.
pub fn ensure_mutations_allowed(allow_mutations: bool) -> Result<(), ApiError> {
    if allow_mutations {
        Ok(())
    } else {
        Err(ApiError::permission(MUTATIONS_DISABLED))
    }
}
