//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! tienda session login --token abc123 --email ana@example.com -r vendedor
//! tienda session whoami
//! tienda session logout
//! ```

use std::io::Write;

use secrecy::SecretString;

use tienda_cart::session::{self, CurrentUser, SessionProvider};
use tienda_core::{Role, UserId};

use super::{CommandError, Context};

/// Login details given on the command line.
pub struct Login {
    pub token: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: String,
    pub user_id: Option<String>,
}

/// Store a session.
pub fn login(ctx: &Context, out: &mut impl Write, login: Login) -> Result<(), CommandError> {
    if login.token.trim().is_empty() {
        return Err(CommandError::InvalidArgument(
            "token must not be empty".to_string(),
        ));
    }
    let id = login
        .user_id
        .as_deref()
        .map(UserId::parse)
        .transpose()
        .map_err(|e| CommandError::InvalidArgument(format!("user id: {e}")))?;

    let user = CurrentUser {
        id,
        email: login.email,
        full_name: login.full_name,
        profile: None,
        role: Some(Role::new(&login.role)),
    };
    ctx.session
        .sign_in(&SecretString::from(login.token), &user)?;
    writeln!(out, "Signed in as {}", user.display_name())?;
    Ok(())
}

/// Sign out and clear the cart.
pub fn logout(ctx: &Context, out: &mut impl Write) -> Result<(), CommandError> {
    session::end_session(&ctx.session, &ctx.store)?;
    writeln!(out, "Signed out")?;
    Ok(())
}

/// Print the current user.
pub fn whoami(ctx: &Context, out: &mut impl Write) -> Result<(), CommandError> {
    if ctx.session.bearer_token().is_none() {
        writeln!(out, "Not signed in")?;
        return Ok(());
    }
    match ctx.session.current_user() {
        Some(user) => {
            let role = user.role.as_ref().map_or("none", Role::as_str);
            writeln!(out, "{} (role: {role})", user.display_name())?;
        }
        None => writeln!(out, "Signed in, user details unavailable")?,
    }
    Ok(())
}
