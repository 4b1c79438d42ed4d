//! Identity model and authentication service client for the surveillance portal
//!
//! This module provides:
//! - The `Identity` principal and the closed `Role` enumeration
//! - Login credentials held as secrets
//! - The `AuthenticationService` contract (login, logout, refresh, verify,
//!   profile, change password)
//! - `HttpAuthService`, whose private cookie jar is the credential store
//!
//! # Example
//!
//! ```rust,no_run
//! use auth_identity::{AuthServiceConfig, AuthenticationService, Credentials, HttpAuthService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = HttpAuthService::new(&AuthServiceConfig::default())?;
//!     let identity = service.login(&Credentials::new("nurse1", "password")).await?;
//!     println!("signed in as {}", identity.display_name());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod service;

pub use client::*;
pub use config::*;
pub use error::*;
pub use models::*;
pub use service::*;
