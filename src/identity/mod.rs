//! Signed-in identity and the session store contract

mod local;
mod store;

pub use local::LocalSessionStore;
pub use store::{AuthError, Identity, SessionStore, UserId};
