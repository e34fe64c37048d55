//! Authentication seam for callable procedures.
//!
//! The payment service never reads a global "current user". Instead an
//! [`AuthProvider`] is injected at construction and asked for the signed-in
//! user before every call; that user then mints a fresh [`AuthToken`].
//!
//! [`StaticAuthProvider`] wraps a fixed uid and token, which is what the CLI
//! and the tests use.

use std::fmt;
use std::sync::Arc;

use crate::error::AuthError;

/// A short-lived bearer credential for the signed-in user.
///
/// The token is fetched immediately before each remote call and never cached
/// by this crate. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wraps a raw bearer token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for use in an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// A signed-in user able to mint bearer tokens.
#[async_trait::async_trait]
pub trait SignedInUser: Send + Sync {
    /// Stable user identifier, used for logging only.
    fn uid(&self) -> &str;

    /// Mints (or refreshes) an ID token for the user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the provider cannot produce a token.
    async fn id_token(&self) -> Result<AuthToken, AuthError>;
}

/// Source of the currently signed-in user.
pub trait AuthProvider: Send + Sync {
    /// Returns the signed-in user, or `None` when nobody is signed in.
    fn current_user(&self) -> Option<Arc<dyn SignedInUser>>;
}

/// [`SignedInUser`] with a fixed uid and token.
#[derive(Debug, Clone)]
struct StaticUser {
    uid: String,
    token: AuthToken,
}

#[async_trait::async_trait]
impl SignedInUser for StaticUser {
    fn uid(&self) -> &str {
        &self.uid
    }

    async fn id_token(&self) -> Result<AuthToken, AuthError> {
        Ok(self.token.clone())
    }
}

/// [`AuthProvider`] that always reports the same user, or nobody.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthProvider {
    user: Option<Arc<StaticUser>>,
}

impl StaticAuthProvider {
    /// Creates a provider with a signed-in user holding `token`.
    #[must_use]
    pub fn signed_in(uid: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: Some(Arc::new(StaticUser {
                uid: uid.into(),
                token: AuthToken::new(token),
            })),
        }
    }

    /// Creates a provider with nobody signed in.
    #[must_use]
    pub fn signed_out() -> Self {
        Self::default()
    }
}

impl AuthProvider for StaticAuthProvider {
    fn current_user(&self) -> Option<Arc<dyn SignedInUser>> {
        let user: Arc<StaticUser> = Arc::clone(self.user.as_ref()?);
        Some(user)
    }
}

impl<T: AuthProvider + ?Sized> AuthProvider for Arc<T> {
    fn current_user(&self) -> Option<Arc<dyn SignedInUser>> {
        (**self).current_user()
    }
}
