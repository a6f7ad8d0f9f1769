use crease_core::SessionToken;

/// Scoring session presented by the caller.
///
/// Inserted by the session middleware and required by every mutating route.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionContext {
    token: SessionToken,
}

impl SessionContext {
    pub fn new(token: SessionToken) -> Self {
        Self { token }
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }
}
