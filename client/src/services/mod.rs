pub mod api;
pub mod attendance;
pub mod auth;
pub mod date_utils;
pub mod logging;
pub mod reminders;
pub mod session;
