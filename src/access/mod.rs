//! Access resolution for cloudrive.
//!
//! Three independent sources decide whether a principal may act on an object:
//! - Ownership, read from the object's owner field (full access)
//! - Direct role grants on the object itself
//! - Share links, which bypass principals entirely (see [`crate::share`])
//!
//! Direct grants do not cascade from a folder to its contents. A grant on a folder
//! governs the folder row only.

mod ancestry;
mod grants;
mod resolver;
mod role;

pub use ancestry::{ancestry_of, folder_depth, subtree_height, Ancestry};
pub use grants::{Grant, GrantService, NewGrant};
pub use resolver::{Access, AccessResolver};
pub use role::{permits, Action, Role};
