//! Expression compilers and request envelopes for the key/attribute store.

pub mod alias;
pub mod condition;
pub mod request;
pub mod ttl;
pub mod update;

pub use alias::{Collector, NameAliases, Resolved, ValueAliases};
pub use condition::{Comparator, Condition, KeyCondition, Operand, Path, MAX_IN_ALTERNATIVES};
pub use request::{invoke, DeleteItem, GetItem, PutItem, Query, UpdateItem};
pub use ttl::Ttl;
pub use update::{SetValue, Update};
