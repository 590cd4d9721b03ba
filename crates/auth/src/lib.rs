//! `depot-auth`: authentication/authorization boundary.
//!
//! This crate is decoupled from HTTP and storage: it defines directory
//! records, resolves the role/permission graph from loaded grants, checks
//! permission requirements and handles credentials and bearer tokens.

pub mod authorize;
pub mod claims;
pub mod credentials;
pub mod permissions;
pub mod resolve;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, Logical, Principal, authorize};
pub use claims::{Hs256Jwt, JwtClaims, JwtValidator, TokenValidationError, validate_claims};
pub use credentials::{CredentialError, CredentialHash, CredentialRecord};
pub use permissions::{Menu, Permission, menus};
pub use resolve::{AuthorizationInfo, RoleGrant, resolve_authorization};
pub use roles::{Role, RoleRecord};
pub use user::User;
