//! Bearer-token lifecycle for authenticated catalog providers.
//!
//! A [`TokenStore`] owns the token for exactly one provider: it hands out
//! only fresh tokens, refreshes through an [`Authenticator`] when needed,
//! and persists the result so restarts don't re-authenticate.

mod store;
mod twitch;

pub use store::{Authenticator, TokenStore, EXPIRY_MARGIN_SECS};
pub use twitch::TwitchAuthenticator;
