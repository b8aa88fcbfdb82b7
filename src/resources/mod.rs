//! Resource lifecycle adapters.
//!
//! Each resource kind owns a typed configuration struct and a [`Resource`]
//! implementation that builds API payloads from it and copies API records back
//! into it. The free functions in this module drive those implementations and
//! apply the behavior every kind shares: handle bookkeeping, import decoding
//! and the "resource is gone" treatment of 404 reads.

pub mod account_role;
pub mod alert_rule;
pub mod escalation_policy;
pub mod incident;
pub mod integration;
pub mod invite;
pub mod maintenance_window;
pub mod member;
pub mod notification_rule;
pub mod outgoing_rule;
pub mod post_incident_task;
pub mod priority;
pub mod role;
pub mod role_assignment;
pub mod router;
pub mod routing_rule;
pub mod schedule;
pub mod service;
pub mod sla;
pub mod tag;
pub mod task_template;
pub mod task_template_task;
pub mod team;
pub mod user;
pub mod validate;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::{info, warn};

use crate::client::ZendutyClient;
use crate::error::{ProviderError, Result};
use crate::ident;

/// What the host runtime persists for one resource instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState<C> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub config: C,
}

impl<C> ResourceState<C> {
    pub fn new(config: C) -> Self {
        Self { id: None, config }
    }

    fn handle(&self) -> Result<&str> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::validation("id", "resource has not been created"))
    }
}

#[async_trait]
pub trait Resource {
    type Config: Serialize + DeserializeOwned + Default + Clone + Debug + Send + Sync;

    /// Resource type name, e.g. `zenduty_teams`.
    const KIND: &'static str;

    /// Positional names of the import id. A single name means the id is the
    /// handle itself and is not checked.
    const IMPORT_FIELDS: &'static [&'static str];

    /// Validate, submit and return the new handle. Computed fields returned by
    /// the API are written into `config`.
    async fn create(client: &ZendutyClient, config: &mut Self::Config) -> Result<String>;

    async fn read(client: &ZendutyClient, id: &str, config: &mut Self::Config) -> Result<()>;

    async fn update(client: &ZendutyClient, id: &str, config: &mut Self::Config) -> Result<()>;

    async fn delete(client: &ZendutyClient, id: &str, config: &Self::Config) -> Result<()>;

    /// Write the scope segments of a decoded import id into `config`.
    fn apply_scope(_scope: &[String], _config: &mut Self::Config) {}

    /// Turn an operator supplied import id into initial state.
    fn import(id: &str) -> Result<ResourceState<Self::Config>> {
        let mut config = Self::Config::default();
        if Self::IMPORT_FIELDS.len() <= 1 {
            return Ok(ResourceState {
                id: Some(id.to_string()),
                config,
            });
        }

        let mut segments = ident::decode(id, Self::IMPORT_FIELDS)?;
        let handle = segments.pop().unwrap_or_default();
        Self::apply_scope(&segments, &mut config);
        Ok(ResourceState {
            id: Some(handle),
            config,
        })
    }
}

pub async fn create<R: Resource>(
    client: &ZendutyClient,
    state: &mut ResourceState<R::Config>,
) -> Result<()> {
    let id = R::create(client, &mut state.config).await?;
    info!(kind = R::KIND, id = %id, "Created resource");
    state.id = Some(id);
    Ok(())
}

/// Refresh `state` from the API. A 404 clears the handle instead of failing.
pub async fn read<R: Resource>(
    client: &ZendutyClient,
    state: &mut ResourceState<R::Config>,
) -> Result<()> {
    let id = state.handle()?.to_string();
    match R::read(client, &id, &mut state.config).await {
        Ok(()) => Ok(()),
        Err(err) if err.is_not_found() => {
            warn!(kind = R::KIND, id = %id, "Resource no longer exists, clearing handle");
            client.metrics().handle_cleared();
            state.id = None;
            Ok(())
        }
        Err(err) => Err(err),
    }
}

pub async fn update<R: Resource>(
    client: &ZendutyClient,
    state: &mut ResourceState<R::Config>,
) -> Result<()> {
    let id = state.handle()?.to_string();
    R::update(client, &id, &mut state.config).await?;
    info!(kind = R::KIND, id = %id, "Updated resource");
    Ok(())
}

pub async fn delete<R: Resource>(
    client: &ZendutyClient,
    state: &mut ResourceState<R::Config>,
) -> Result<()> {
    let id = state.handle()?.to_string();
    R::delete(client, &id, &state.config).await?;
    info!(kind = R::KIND, id = %id, "Deleted resource");
    state.id = None;
    Ok(())
}

/// Decode `import_id` and read the remote object into fresh state.
pub async fn import<R: Resource>(
    client: &ZendutyClient,
    import_id: &str,
) -> Result<ResourceState<R::Config>> {
    let mut state = R::import(import_id)?;
    let id = state.handle()?.to_string();
    R::read(client, &id, &mut state.config).await?;
    info!(kind = R::KIND, id = %id, "Imported resource");
    Ok(state)
}
