use serde::Deserialize;

use crate::identity::context::IdentityContext;
use crate::identity::errors::AuthError;
use crate::principal::models::Role;

/// How plain-user routes treat admins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRoutePolicy {
    /// Only non-admin principals pass (creators included).
    #[default]
    ExcludeAdmins,
    /// Every authenticated principal passes.
    AdminImpliesUser,
}

/// Role a route demands of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRequirement {
    Admin,
    Creator,
    User(UserRoutePolicy),
}

impl AccessRequirement {
    /// Decide whether the request may proceed.
    ///
    /// # Errors
    /// * `MissingToken` - The request carries no identity
    /// * `Forbidden` - The identity's role does not satisfy the requirement
    pub fn check(&self, identity: Option<&IdentityContext>) -> Result<(), AuthError> {
        let identity = identity.ok_or(AuthError::MissingToken)?;

        let allowed = match self {
            AccessRequirement::Admin => identity.role == Role::Admin,
            AccessRequirement::Creator => identity.role == Role::Creator,
            AccessRequirement::User(UserRoutePolicy::ExcludeAdmins) => identity.role != Role::Admin,
            AccessRequirement::User(UserRoutePolicy::AdminImpliesUser) => true,
        };

        if allowed {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}
