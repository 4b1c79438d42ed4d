//! Common error handling utilities for the surveillance portal
//!
//! Every crate of the authentication core classifies its errors into one
//! shared taxonomy so that the route guard and the portal can react the same
//! way regardless of where a failure originated.
//!
//! # Error Categories
//!
//! - **InvalidCredentials**: login rejected, shown to the user
//! - **SessionInvalidated**: verify/refresh rejected, forces a local logout
//! - **TransientFailure**: network/service trouble, logged and retried later
//! - **AuthorizationDenied**: guard denial, redirect to the unauthorized page
//! - **MalformedCache**: unreadable session cache, treated as a cache miss
//!
//! # Example
//!
//! ```rust
//! use error_common::{Classified, FailureKind};
//!
//! struct Denied;
//!
//! impl Classified for Denied {
//!     fn kind(&self) -> FailureKind {
//!         FailureKind::AuthorizationDenied
//!     }
//! }
//!
//! assert_eq!(Denied.kind().code(), "AUTHZ_3001");
//! ```

pub mod codes;
pub mod types;

pub use types::*;
