//! Permission groups: remote service, built-in defaults and the catalogue

pub mod catalogue;
pub mod defaults;
pub mod service;

pub use catalogue::{GROUPS_CACHE_KEY, GroupCatalogue};
pub use defaults::default_groups;
pub use service::{GroupService, HttpGroupService};
