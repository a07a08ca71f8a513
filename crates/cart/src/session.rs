//! Session capability consumed by the cart pages.
//!
//! Authentication itself happens elsewhere; the cart only needs to know
//! whether there is a bearer token and who the current user is. Both are kept
//! in the same storage origin as the cart, under [`keys::ACCESS_TOKEN`] and
//! [`keys::USER`].
//!
//! The cart store never looks at the session. These helpers decide page
//! access and checkout, and tear the session down on logout.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tienda_core::{Price, Role, UserId};

use crate::storage::{CartStorage, StorageError};
use crate::store::CartStore;

/// Storage keys for session data.
pub mod keys {
    /// Key for the bearer token.
    pub const ACCESS_TOKEN: &str = "access_token";

    /// Key for the JSON-encoded current user.
    pub const USER: &str = "user";
}

/// Profile details attached to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Name from the user's profile.
    #[serde(default)]
    pub full_name: Option<String>,
}

/// The signed-in user as returned by the login endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User ID, numeric or string.
    #[serde(default)]
    pub id: Option<UserId>,
    /// Sign-in email.
    #[serde(default)]
    pub email: Option<String>,
    /// Name stored on the user record itself.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Profile details, when the login response includes them.
    #[serde(default)]
    pub profile: Option<Profile>,
    /// Role assigned by the user manager.
    #[serde(default)]
    pub role: Option<Role>,
}

impl CurrentUser {
    /// Name shown in the navbar: email, then full name, then profile name,
    /// then "User".
    #[must_use]
    pub fn display_name(&self) -> &str {
        let profile_name = self
            .profile
            .as_ref()
            .and_then(|profile| profile.full_name.as_deref());
        [self.email.as_deref(), self.full_name.as_deref(), profile_name]
            .into_iter()
            .flatten()
            .find(|name| !name.trim().is_empty())
            .unwrap_or("User")
    }
}

/// Source of the current token and user.
pub trait SessionProvider {
    /// Bearer token, if signed in.
    fn bearer_token(&self) -> Option<SecretString>;

    /// Current user, if known.
    fn current_user(&self) -> Option<CurrentUser>;
}

/// Session data read from a storage origin.
pub struct StorageSession<S> {
    storage: S,
}

impl<S: CartStorage> StorageSession<S> {
    /// Create a session view over `storage`.
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Persist a token and user after a successful login.
    ///
    /// # Errors
    ///
    /// Returns an error if either entry cannot be written.
    pub fn sign_in(&self, token: &SecretString, user: &CurrentUser) -> crate::Result<()> {
        let user_json = serde_json::to_string(user)?;
        self.storage
            .set(keys::ACCESS_TOKEN, token.expose_secret())?;
        self.storage.set(keys::USER, &user_json)?;
        tracing::info!(user = user.display_name(), "session stored");
        Ok(())
    }

    /// Remove the token and user.
    ///
    /// # Errors
    ///
    /// Returns an error if either entry cannot be removed.
    pub fn sign_out(&self) -> Result<(), StorageError> {
        self.storage.remove(keys::ACCESS_TOKEN)?;
        self.storage.remove(keys::USER)?;
        Ok(())
    }
}

impl<S: CartStorage> SessionProvider for StorageSession<S> {
    fn bearer_token(&self) -> Option<SecretString> {
        match self.storage.get(keys::ACCESS_TOKEN) {
            Ok(Some(token)) if !token.trim().is_empty() => Some(SecretString::from(token)),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "session token unreadable");
                None
            }
        }
    }

    fn current_user(&self) -> Option<CurrentUser> {
        let raw = match self.storage.get(keys::USER) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "session user unreadable");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .inspect_err(|e| tracing::warn!(error = %e, "malformed session user"))
            .ok()
    }
}

impl<S> std::fmt::Debug for StorageSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageSession")
            .field("storage", &"[REDACTED]")
            .finish()
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The page may be shown.
    Granted,
    /// No session; send the user to the login page.
    RedirectToLogin,
}

/// Whether the cart page may be shown. The cart page requires a token.
pub fn cart_page_access(session: &impl SessionProvider) -> Access {
    if session.bearer_token().is_some() {
        Access::Granted
    } else {
        Access::RedirectToLogin
    }
}

/// Reasons checkout cannot start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// No bearer token.
    #[error("Session expired, please sign in again")]
    SessionExpired,
    /// Nothing to check out.
    #[error("The cart is empty")]
    EmptyCart,
}

/// Result of a checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckoutOutcome {
    /// Payments are not available yet; the cart is left as is.
    NotAvailable {
        /// Units in the cart.
        item_count: u64,
        /// Cart total.
        total: Price,
    },
}

/// Start checkout for the current cart.
///
/// # Errors
///
/// Returns [`CheckoutError::SessionExpired`] without a token and
/// [`CheckoutError::EmptyCart`] when there is nothing to buy.
pub fn checkout<S: CartStorage>(
    store: &CartStore<S>,
    session: &impl SessionProvider,
) -> Result<CheckoutOutcome, CheckoutError> {
    if session.bearer_token().is_none() {
        return Err(CheckoutError::SessionExpired);
    }
    let lines = store.read();
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let item_count = lines.iter().map(|line| u64::from(line.quantity)).sum();
    let total = Price::from(lines.iter().map(|line| line.line_total().amount()).sum::<f64>());
    tracing::info!(item_count, total = total.amount(), "checkout requested, payments unavailable");
    Ok(CheckoutOutcome::NotAvailable { item_count, total })
}

/// Logout teardown: forget the session and clear the cart.
///
/// The cart is cleared through the store so its subscribers are notified.
///
/// # Errors
///
/// Returns an error if the session entries or the cart cannot be removed.
pub fn end_session<S, T>(session: &StorageSession<T>, store: &CartStore<S>) -> crate::Result<()>
where
    S: CartStorage,
    T: CartStorage,
{
    session.sign_out()?;
    store.clear()?;
    tracing::info!("session ended");
    Ok(())
}
