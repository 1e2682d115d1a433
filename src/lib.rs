//! azrm - Azure Resource Manager reconciliation
//!
//! A library for reconciling declared Azure resources with their live state: resource ID
//! parsing, authenticated ARM clients, and create/read/update/delete mapping for Linux web apps.

pub mod context;
pub mod output;
pub mod providers;
pub mod resource;
pub mod schema;
pub mod terraform;

mod error;

pub use context::Context;
pub use error::AzrmError;
pub use providers::azure::{AzureError, AzureProvider, ClientOptions, ResourceId, WebAppId};
pub use providers::{Provider, ProviderError, get_provider, import_block};
pub use resource::Resource;
