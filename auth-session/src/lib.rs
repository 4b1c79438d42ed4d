//! Session lifecycle for the surveillance portal
//!
//! A [`SessionManager`] owns one user's session: it logs in and out through
//! the authentication service, verifies the session on a throttled schedule,
//! tracks activity for idle expiry and mirrors the identity into a
//! [`SessionCache`] so a restart does not lose it.
//!
//! # Example
//!
//! ```rust,no_run
//! use auth_identity::{AuthServiceConfig, Credentials, HttpAuthService};
//! use auth_session::{MemorySessionCache, SessionConfig, SessionManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = Arc::new(HttpAuthService::new(&AuthServiceConfig::default())?);
//!     let manager = Arc::new(SessionManager::new(
//!         service,
//!         Arc::new(MemorySessionCache::new()),
//!         SessionConfig::default(),
//!     ));
//!     let _refresh = manager.spawn_silent_refresh();
//!
//!     manager.login(&Credentials::new("nurse1", "password")).await?;
//!     manager.touch_activity();
//!     let identity = manager.verify().await?;
//!     manager.logout().await;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod manager;

pub use cache::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use manager::*;
