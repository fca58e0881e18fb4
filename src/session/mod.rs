//! Session ownership: persisted token, default auth header and teardown.
//!
//! SYSTEM CONTEXT
//! ==============
//! `store` persists the bearer token, `navigator` performs login redirects,
//! and `context` is the one accessor every other layer goes through to read
//! or change session state.

pub mod context;
pub mod navigator;
pub mod store;

pub use context::{AuthFailurePolicy, ClearReason, SessionContext, SessionEvent, SessionTeardown};
pub use navigator::{LogNavigator, Navigator};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
