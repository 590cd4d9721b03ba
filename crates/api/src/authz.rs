//! Permission guards for HTTP handlers.
//!
//! Guards run before the business operation. Permissions are resolved from
//! the directory on every call, so role changes apply to the next request.

use depot_auth::{Logical, Permission};
use depot_infra::services::{AuthorizationService, ServiceError};

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

/// Require every permission in `required`.
pub async fn require_all(
    authorization: &AuthorizationService,
    principal: &PrincipalContext,
    required: &[Permission],
) -> Result<(), ApiError> {
    guard(authorization, principal, required, Logical::All).await
}

/// Require at least one permission in `required`.
pub async fn require_any(
    authorization: &AuthorizationService,
    principal: &PrincipalContext,
    required: &[Permission],
) -> Result<(), ApiError> {
    guard(authorization, principal, required, Logical::Any).await
}

async fn guard(
    authorization: &AuthorizationService,
    principal: &PrincipalContext,
    required: &[Permission],
    logical: Logical,
) -> Result<(), ApiError> {
    match authorization.require(principal.principal(), required, logical).await {
        Ok(_) => Ok(()),
        // The token outlived its user.
        Err(ServiceError::NotFound(_)) => Err(ApiError::unauthorized("unknown principal")),
        Err(other) => Err(other.into()),
    }
}
