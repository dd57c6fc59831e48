//! Permission system with type-safe authorization extractors
//!
//! Usage in handlers:
//! ```ignore
//! use crate::middleware::{Authorized, permissions::*};
//!
//! async fn create_company(
//!     Authorized(principal, _): Authorized<ManageCompanies>,
//!     State(state): State<AppState>,
//! ) -> Result<Json<company::Model>> {
//!     // Permission already verified
//! }
//! ```

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::middleware::AuthenticatedPrincipal;
use crate::services::authorization::Principal;
use crate::state::AppState;

/// Trait for permission marker types
pub trait Permission: Send + Sync + 'static {
    /// The permission name as stored in the permissions table
    const NAME: &'static str;
}

/// Creates zero-sized marker types that implement `Permission`
macro_rules! define_permissions {
    ($($(#[$meta:meta])* $name:ident => $perm:expr),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl Permission for $name {
                const NAME: &'static str = $perm;
            }
        )*
    };
}

define_permissions! {
    // Reports
    /// Read financial reports within the caller's scope
    ViewReports => "view_reports",
    /// Create, update and delete financial reports
    ManageReports => "manage_reports",

    // Hierarchy & RBAC
    /// Create, move and deactivate companies
    ManageCompanies => "manage_companies",
    /// Create, update and delete roles and their grants
    ManageRoles => "manage_roles",
}

fn principal_from(parts: &Parts) -> Result<Principal, AppError> {
    parts
        .extensions
        .get::<AuthenticatedPrincipal>()
        .map(|p| p.0.clone())
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
}

/// Extractor that requires a specific permission
///
/// Superadmin-tier principals and holders of `*` always pass. A failed check
/// is a 403 before the handler runs.
#[derive(Debug, Clone)]
pub struct Authorized<P: Permission>(pub Principal, pub PhantomData<P>);

impl<P: Permission> Authorized<P> {
    pub fn principal(&self) -> &Principal {
        &self.0
    }

    pub fn user_id(&self) -> i64 {
        self.0.user_id
    }
}

impl<P: Permission> FromRequestParts<AppState> for Authorized<P> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = principal_from(parts)?;

        if !state.engine.has_permission(&principal, P::NAME) {
            tracing::debug!(
                user_id = principal.user_id,
                permission = P::NAME,
                "Permission check failed"
            );
            return Err(AppError::Forbidden(format!(
                "Permission denied: {} required",
                P::NAME
            )));
        }

        Ok(Authorized(principal, PhantomData))
    }
}

/// Extractor for any authenticated principal (no specific permission required)
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl Authenticated {
    pub fn principal(&self) -> &Principal {
        &self.0
    }

    pub fn user_id(&self) -> i64 {
        self.0.user_id
    }
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Authenticated(principal_from(parts)?))
    }
}

/// Extractor that admits superadmin-tier principals only
#[derive(Debug, Clone)]
pub struct SuperAdmin(pub Principal);

impl FromRequestParts<AppState> for SuperAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = principal_from(parts)?;
        if !state.engine.is_super_admin_like(&principal.role_name) {
            return Err(AppError::access_denied());
        }
        Ok(SuperAdmin(principal))
    }
}
