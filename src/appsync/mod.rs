//! Resolver context and helper utilities.

pub mod context;
pub mod util;

pub use context::{ctx, Context, ErrorContext, Groups, Identity, GROUPS_CLAIM};
pub use util::Util;
