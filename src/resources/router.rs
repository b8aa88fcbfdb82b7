use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Resource, validate};
use crate::client::ZendutyClient;
use crate::error::Result;

pub(crate) const ROUTERS_PATH: &str = "/api/v2/account/events/router/";

pub(crate) fn router_path(router_id: &str) -> String {
    format!("{}{}/", ROUTERS_PATH, router_id)
}

/// Account level event router. Events sent to its integration key are
/// dispatched to integrations by routing rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    pub name: String,
    pub description: String,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_key: Option<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            is_enabled: true,
            integration_key: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_id: String,
    pub name: String,
    pub description: String,
    pub is_enabled: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub integration_key: String,
}

impl RouterConfig {
    fn to_record(&self) -> Result<RouterRecord> {
        validate::required("name", &self.name)?;
        validate::required("description", &self.description)?;
        Ok(RouterRecord {
            name: self.name.clone(),
            description: self.description.clone(),
            is_enabled: self.is_enabled,
            ..RouterRecord::default()
        })
    }

    fn apply(&mut self, record: RouterRecord) {
        if !record.name.is_empty() {
            self.name = record.name;
        }
        self.description = record.description;
        self.is_enabled = record.is_enabled;
        self.integration_key = validate::non_empty(record.integration_key);
    }
}

pub struct RouterResource;

#[async_trait]
impl Resource for RouterResource {
    type Config = RouterConfig;
    const KIND: &'static str = "zenduty_globalrouter";
    const IMPORT_FIELDS: &'static [&'static str] = &["router_id"];

    async fn create(client: &ZendutyClient, config: &mut RouterConfig) -> Result<String> {
        let payload = config.to_record()?;
        let created: RouterRecord = client.post(ROUTERS_PATH, &payload).await?;
        let id = created.unique_id.clone();
        config.apply(created);
        Ok(id)
    }

    async fn read(client: &ZendutyClient, id: &str, config: &mut RouterConfig) -> Result<()> {
        let record: RouterRecord = client.get(&router_path(id)).await?;
        config.apply(record);
        Ok(())
    }

    async fn update(client: &ZendutyClient, id: &str, config: &mut RouterConfig) -> Result<()> {
        let payload = config.to_record()?;
        let updated: RouterRecord = client.put(&router_path(id), &payload).await?;
        config.apply(updated);
        Ok(())
    }

    async fn delete(client: &ZendutyClient, id: &str, _config: &RouterConfig) -> Result<()> {
        client.delete(&router_path(id)).await?;
        Ok(())
    }
}
