//! BizDesk Client - remote-backed services of the authorization core
//!
//! Permission groups and subscription packages are read from the BizDesk API
//! first, mirrored into a local cache, and served from the cache or built-in
//! defaults when the API is unreachable.

pub mod cache;
pub mod config;
pub mod error;
pub mod groups;
pub mod http;
pub mod logger;
pub mod package;
pub mod resilient;

pub use cache::{CacheStore, FileCache, MemoryCache};
pub use config::ClientConfig;
pub use error::{CatalogueError, ClientError, ClientResult, RemoteError, StorageError};
pub use groups::{GroupCatalogue, GroupService, HttpGroupService, default_groups};
pub use http::{HttpClient, NetworkHttpClient};
pub use package::{HttpPackageRemote, PackageRemote, PackageService};
pub use resilient::{ReadCancelled, ReadSource, Resolved, ResilientRead};
