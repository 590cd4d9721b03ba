use depot_auth::Principal;

/// Authenticated identity of a request.
///
/// Inserted by the auth middleware; every protected handler receives it and
/// passes the wrapped [`Principal`] explicitly into the services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}
