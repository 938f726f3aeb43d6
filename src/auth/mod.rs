//! Authentication for the EduConnect backend
//!
//! Password-grant sign-in/sign-up against the hosted auth service, plus
//! the session bridge that keeps the current user's profile published
//! while auth state changes.

pub mod service;
pub mod session;
pub mod tokens;

pub use service::{AuthApi, AuthEvent, AuthService, AuthSession};
pub use session::{SessionBridge, SessionState};
pub use tokens::{SessionStore, StoredToken};
