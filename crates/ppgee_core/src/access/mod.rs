//! Role-gated view routing and the current-user session.
//!
//! # Responsibility
//! - Map `(role, requested view)` to the view actually reached.
//! - Issue `ViewGrant`s that mutating synchronizer handlers require.
//! - Track the single active user and view.
//!
//! # Invariants
//! - The capability tables in `router` are the only place role and view
//!   permissions are decided.
//! - A `ViewGrant` can only be obtained from `ViewRouter::route`.

mod router;
mod session;
mod view;

pub use router::{AccessError, Operation, ViewGrant, ViewRouter};
pub use session::Session;
pub use view::{View, ViewError};
