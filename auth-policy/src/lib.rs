//! Role-based authorization engine for the surveillance portal
//!
//! Decisions are pure functions of a role id (and, where relevant, a target
//! role or a hospital code). No I/O, no state.
//!
//! - **Capability**: closed set of actions, granted per role by a static table
//! - **Manage user**: explicit relation between an acting and a target role
//! - **Organization scope**: staff only see their own hospital
//! - **Rank**: total order over roles for "X or higher" checks
//!
//! # Example
//!
//! ```rust
//! use auth_policy::{can_manage_user, has_capability, Capability};
//!
//! assert!(has_capability(3, Capability::RecordVisits));
//! assert!(!has_capability(2, Capability::RecordVisits));
//! assert!(can_manage_user(2, 3));
//! ```

pub mod capability;
pub mod engine;
pub mod error;

pub use capability::*;
pub use engine::*;
pub use error::*;
