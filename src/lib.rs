pub mod client;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod humanize;
pub mod ident;
pub mod observability;
pub mod registry;
pub mod resources;
pub mod retry;
pub mod timewindow;

pub use client::ZendutyClient;
pub use error::{Diagnostic, Diagnostics, ProviderError, Result};
pub use registry::{Operation, Outcome, Provider, ResourceKind};
