//! The API endpoints URIs.

/// Reports whether the server is up.
pub const HEALTH: &str = "/health";
/// Creates a new user account.
pub const REGISTER: &str = "/auth/register";
/// Exchanges an email and password for a session token.
pub const LOG_IN: &str = "/auth/login";
/// Ends the session of the presented token.
pub const LOG_OUT: &str = "/auth/logout";
/// Reads or updates the logged in user's profile.
pub const PROFILE: &str = "/auth/profile";
/// Changes the logged in user's password.
pub const CHANGE_PASSWORD: &str = "/auth/change-password";
/// Lists or creates the logged in user's transactions.
pub const TRANSACTIONS: &str = "/transactions";
