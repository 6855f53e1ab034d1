//! Client core for the Taskly academic organizer.
//!
//! [`services::session`] keeps the one session identifier on disk,
//! [`services::api::ApiClient`] issues one HTTP request per remote
//! operation, and [`services::auth::AuthService`] ties the two together for
//! sign-up, login and logout.

pub mod config;
pub mod error;
pub mod services;

pub use config::ClientConfig;
pub use error::{ApiError, ErrorKind};
pub use services::api::ApiClient;
pub use services::auth::AuthService;
pub use services::session::{MemorySessionStore, SessionStorage, YamlSessionStore};
