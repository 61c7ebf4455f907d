use crate::identity::models::ProviderId;
use crate::principal::models::Admin;
use crate::principal::models::PrincipalId;
use crate::principal::models::Role;
use crate::principal::models::User;

/// Identity attached to a request once its bearer token has been validated.
///
/// Handlers receive it through request extensions; it is never built from
/// unvalidated input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    pub principal_id: PrincipalId,
    pub email: String,
    pub phone_no: Option<String>,
    pub name: Option<String>,
    pub provider_id: ProviderId,
    pub is_active: bool,
    pub role: Role,
}

impl IdentityContext {
    pub fn for_user(user: &User, provider_id: ProviderId) -> Self {
        Self {
            principal_id: user.id,
            email: user.email.as_str().to_string(),
            phone_no: user.phone_no.clone(),
            name: user.name.clone(),
            provider_id,
            is_active: user.is_active,
            role: user.role(),
        }
    }

    pub fn for_admin(admin: &Admin, provider_id: ProviderId) -> Self {
        Self {
            principal_id: admin.id,
            email: admin.email.as_str().to_string(),
            phone_no: None,
            name: admin.name.clone(),
            provider_id,
            is_active: admin.is_active,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_creator(&self) -> bool {
        self.role == Role::Creator
    }

    pub fn scope(&self) -> &'static str {
        self.role.as_scope()
    }

    /// Scope-string check: exact match against the derived role.
    pub fn has_scope(&self, scope: &str) -> bool {
        Role::from_scope(scope) == Some(self.role)
    }
}
