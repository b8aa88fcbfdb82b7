//! Read-only lookups.
//!
//! Unlike resource reads, a missing object here is an error: there is no
//! handle to clear.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::ZendutyClient;
use crate::error::{ProviderError, Result};
use crate::resources::alert_rule::{AlertRuleRecord, alert_rules_path};
use crate::resources::escalation_policy::{EscalationPolicyRecord, policies_path};
use crate::resources::incident::INCIDENTS_PATH;
use crate::resources::integration::{IntegrationRecord, integrations_path};
use crate::resources::maintenance_window::{
    MaintenanceWindowConfig, MaintenanceWindowRecord, maintenance_path,
};
use crate::resources::member::{MemberRecord, members_path};
use crate::resources::priority::{PriorityRecord, priorities_path};
use crate::resources::role::{RoleRecord, roles_path};
use crate::resources::router::{ROUTERS_PATH, RouterRecord};
use crate::resources::routing_rule::{RoutingRuleRecord, rules_path};
use crate::resources::schedule::{ScheduleConfig, ScheduleRecord, schedules_path};
use crate::resources::service::{ServiceRecord, services_path};
use crate::resources::tag::{TagRecord, tags_path};
use crate::resources::team::{TEAMS_PATH, team_path};
use crate::resources::user::{USERS_PATH, user_path};
use crate::resources::validate;

/// A listed object: its handle plus the same fields a resource of that kind
/// would carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listed<C> {
    pub unique_id: String,
    #[serde(flatten)]
    pub config: C,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamSummary {
    pub unique_id: String,
    pub name: String,
    pub account: String,
    pub creation_date: String,
    pub owner: String,
    pub roles: Vec<TeamRoleSummary>,
    pub members: Vec<TeamMemberSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamRoleSummary {
    pub unique_id: String,
    pub title: String,
    pub description: String,
    pub creation_date: String,
    pub rank: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamMemberSummary {
    pub unique_id: String,
    pub team: String,
    pub joining_date: String,
    pub role: i64,
    pub user: MemberUser,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountUser {
    pub unique_id: String,
    pub user: MemberUser,
    pub role: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactMethod {
    pub unique_id: String,
    pub name: String,
    /// 1 email, 2 SMS, 3 phone, 4 Slack, 5 push
    pub contact_type: i64,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentSummary {
    pub unique_id: String,
    pub incident_number: i64,
    pub title: String,
    pub summary: String,
    pub status: i64,
    pub urgency: i64,
    pub incident_key: String,
    pub creation_date: String,
    pub service: String,
    pub team_priority: Option<String>,
    pub service_object: Option<IncidentService>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentService {
    pub unique_id: String,
    pub name: String,
    pub team: String,
    pub escalation_policy: String,
    pub sla: Option<String>,
    pub task_template: Option<String>,
    pub collation: i64,
    pub collation_time: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IncidentPage {
    results: Vec<IncidentSummary>,
}

/// All teams of the account, or only `team_id` when given.
pub async fn teams(client: &ZendutyClient, team_id: Option<&str>) -> Result<Vec<TeamSummary>> {
    match team_id.filter(|id| !id.is_empty()) {
        Some(id) => {
            validate::uuid("team_id", id)?;
            let team: TeamSummary = client.get(&team_path(id)).await?;
            Ok(vec![team])
        }
        None => {
            let teams: Vec<TeamSummary> = client.get(TEAMS_PATH).await?;
            debug!(count = teams.len(), "Listed teams");
            Ok(teams)
        }
    }
}

pub async fn services(client: &ZendutyClient, team_id: &str) -> Result<Vec<ServiceRecord>> {
    validate::uuid("team_id", team_id)?;
    let services: Vec<ServiceRecord> = client.get(&services_path(team_id)).await?;
    debug!(team_id, count = services.len(), "Listed services");
    Ok(services)
}

/// Schedules with layer and override times shown in each schedule's zone.
/// Times that fail to convert are left unset.
pub async fn schedules(
    client: &ZendutyClient,
    team_id: &str,
) -> Result<Vec<Listed<ScheduleConfig>>> {
    validate::uuid("team_id", team_id)?;
    let records: Vec<ScheduleRecord> = client.get(&schedules_path(team_id)).await?;
    Ok(records
        .into_iter()
        .map(|record| Listed {
            unique_id: record.unique_id.clone(),
            config: ScheduleConfig::from_record(team_id, record),
        })
        .collect())
}

pub async fn maintenance_windows(
    client: &ZendutyClient,
    team_id: &str,
) -> Result<Vec<Listed<MaintenanceWindowConfig>>> {
    validate::uuid("team_id", team_id)?;
    let records: Vec<MaintenanceWindowRecord> =
        client.get(&maintenance_path(team_id)).await?;
    Ok(records
        .into_iter()
        .map(|record| Listed {
            unique_id: record.unique_id.clone(),
            config: MaintenanceWindowConfig::from_record(team_id, record),
        })
        .collect())
}

pub async fn roles(client: &ZendutyClient, team_id: &str) -> Result<Vec<RoleRecord>> {
    validate::uuid("team_id", team_id)?;
    let roles: Vec<RoleRecord> = client.get(&roles_path(team_id)).await?;
    debug!(team_id, count = roles.len(), "Listed incident roles");
    Ok(roles)
}

/// The whole `collection`, or a one-element list holding `{collection}{id}/`.
async fn list_or_one<T: DeserializeOwned>(
    client: &ZendutyClient,
    collection: &str,
    field: &str,
    id: Option<&str>,
) -> Result<Vec<T>> {
    match id.filter(|id| !id.is_empty()) {
        Some(id) => {
            validate::uuid(field, id)?;
            let one: T = client.get(&format!("{}{}/", collection, id)).await?;
            Ok(vec![one])
        }
        None => Ok(client.get(collection).await?),
    }
}

/// Integrations of a service, or only `integration_id` when given.
pub async fn integrations(
    client: &ZendutyClient,
    team_id: &str,
    service_id: &str,
    integration_id: Option<&str>,
) -> Result<Vec<IntegrationRecord>> {
    validate::uuid("team_id", team_id)?;
    validate::uuid("service_id", service_id)?;
    let collection = integrations_path(team_id, service_id);
    list_or_one(client, &collection, "integration_id", integration_id).await
}

pub async fn escalation_policies(
    client: &ZendutyClient,
    team_id: &str,
    esp_id: Option<&str>,
) -> Result<Vec<EscalationPolicyRecord>> {
    validate::uuid("team_id", team_id)?;
    list_or_one(client, &policies_path(team_id), "esp_id", esp_id).await
}

pub async fn members(
    client: &ZendutyClient,
    team_id: &str,
    member_id: Option<&str>,
) -> Result<Vec<MemberRecord>> {
    validate::uuid("team_id", team_id)?;
    list_or_one(client, &members_path(team_id), "member_id", member_id).await
}

pub async fn global_routers(
    client: &ZendutyClient,
    router_id: Option<&str>,
) -> Result<Vec<RouterRecord>> {
    list_or_one(client, ROUTERS_PATH, "router_id", router_id).await
}

pub async fn global_routing_rules(
    client: &ZendutyClient,
    router_id: &str,
    rule_id: Option<&str>,
) -> Result<Vec<RoutingRuleRecord>> {
    validate::uuid("router_id", router_id)?;
    list_or_one(client, &rules_path(router_id), "rule_id", rule_id).await
}

/// Account users whose email matches, ignoring case. No match is an error.
pub async fn users(client: &ZendutyClient, email: &str) -> Result<Vec<AccountUser>> {
    validate::required("email", email)?;
    let all: Vec<AccountUser> = client.get(USERS_PATH).await?;
    let matched: Vec<AccountUser> = all
        .into_iter()
        .filter(|u| u.user.email.eq_ignore_ascii_case(email))
        .collect();
    if matched.is_empty() {
        return Err(ProviderError::NotFound(format!("no users found with email {}", email)));
    }
    Ok(matched)
}

pub async fn alert_rules(
    client: &ZendutyClient,
    team_id: &str,
    service_id: &str,
    integration_id: &str,
    alert_rule_id: Option<&str>,
) -> Result<Vec<AlertRuleRecord>> {
    validate::uuid("team_id", team_id)?;
    validate::uuid("service_id", service_id)?;
    validate::uuid("integration_id", integration_id)?;
    let collection = alert_rules_path(team_id, service_id, integration_id);
    list_or_one(client, &collection, "alert_rule_id", alert_rule_id).await
}

pub async fn tags(client: &ZendutyClient, team_id: &str) -> Result<Vec<TagRecord>> {
    validate::uuid("team_id", team_id)?;
    Ok(client.get(&tags_path(team_id)).await?)
}

pub async fn priorities(client: &ZendutyClient, team_id: &str) -> Result<Vec<PriorityRecord>> {
    validate::uuid("team_id", team_id)?;
    Ok(client.get(&priorities_path(team_id)).await?)
}

/// Incidents from the first page of the account's incident list, optionally
/// narrowed to one number or status.
pub async fn incidents(
    client: &ZendutyClient,
    number: Option<i64>,
    status: Option<i64>,
) -> Result<Vec<IncidentSummary>> {
    if let Some(status) = status {
        validate::range("status", status, 1, 3)?;
    }
    let page: IncidentPage = client.get(INCIDENTS_PATH).await?;
    let listed: Vec<IncidentSummary> = page
        .results
        .into_iter()
        .filter(|i| number.is_none_or(|n| i.incident_number == n))
        .filter(|i| status.is_none_or(|s| i.status == s))
        .collect();
    debug!(count = listed.len(), "Listed incidents");
    Ok(listed)
}

/// First contact method of `username` with the given type, and `value` when
/// one is given.
pub async fn user_contact(
    client: &ZendutyClient,
    username: &str,
    contact_type: i64,
    value: Option<&str>,
) -> Result<ContactMethod> {
    validate::required("username", username)?;
    validate::range("contact_type", contact_type, 1, 5)?;
    let path = format!("{}contacts/", user_path(username));
    let methods: Vec<ContactMethod> = client.get(&path).await?;

    let wanted = value.filter(|v| !v.is_empty());
    methods
        .into_iter()
        .find(|m| m.contact_type == contact_type && wanted.is_none_or(|v| m.value == v))
        .ok_or_else(|| match wanted {
            Some(v) => ProviderError::NotFound(format!(
                "no contact method of type {} with value {}",
                contact_type, v
            )),
            None => ProviderError::NotFound(format!("no contact method of type {}", contact_type)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryApi;
    use crate::resources::escalation_policy::policy_path;
    use crate::resources::integration::integration_path;
    use crate::resources::router::router_path;
    use serde_json::json;
    use std::sync::Arc;

    const TEAM: &str = "11111111-1111-4111-8111-111111111111";

    fn client(api: &InMemoryApi) -> ZendutyClient {
        ZendutyClient::new(Arc::new(api.clone()))
    }

    #[tokio::test]
    async fn test_teams_all_and_one() {
        let api = InMemoryApi::new();
        api.seed(
            &team_path(TEAM),
            json!({
                "unique_id": TEAM,
                "name": "SRE",
                "roles": [{ "unique_id": "r1", "title": "Commander", "rank": 1 }],
                "members": [{ "unique_id": "m1", "role": 2, "user": { "username": "jdoe42" } }],
            }),
        );
        let client = client(&api);

        let all = teams(&client, None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].members[0].user.username, "jdoe42");

        let one = teams(&client, Some(TEAM)).await.unwrap();
        assert_eq!(one[0].roles[0].title, "Commander");
    }

    #[tokio::test]
    async fn test_missing_team_is_an_error() {
        let api = InMemoryApi::new();
        let err = teams(&client(&api), Some(TEAM)).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_schedule_times_are_lenient() {
        let api = InMemoryApi::new();
        api.seed(
            &format!("{}s1/", schedules_path(TEAM)),
            json!({
                "unique_id": "s1",
                "name": "primary",
                "time_zone": "Asia/Kolkata",
                "layers": [{
                    "name": "",
                    "shift_length": 86400,
                    "rotation_start_time": "2024-01-15T03:30:00Z",
                    "rotation_end_time": "not a time",
                    "users": [{ "user": "jdoe42" }],
                }],
            }),
        );

        let listed = schedules(&client(&api), TEAM).await.unwrap();
        let layer = &listed[0].config.layers[0];
        assert_eq!(listed[0].unique_id, "s1");
        assert_eq!(layer.name, "Layer-1");
        assert_eq!(layer.rotation_start_time.as_deref(), Some("2024-01-15 09:00"));
        assert!(layer.rotation_end_time.is_none());
    }

    #[tokio::test]
    async fn test_maintenance_windows_local_times() {
        let api = InMemoryApi::new();
        api.seed(
            &format!("{}w1/", maintenance_path(TEAM)),
            json!({
                "unique_id": "w1",
                "name": "db upgrade",
                "start_time": "2024-01-15T03:30:00Z",
                "end_time": "2024-01-15T06:00:00Z",
                "time_zone": "Asia/Kolkata",
                "services": [{ "service": "22222222-2222-4222-9222-222222222222" }],
            }),
        );

        let listed = maintenance_windows(&client(&api), TEAM).await.unwrap();
        assert_eq!(listed[0].config.start_time, "2024-01-15 09:00");
        assert_eq!(listed[0].config.end_time, "2024-01-15 11:30");
        assert_eq!(listed[0].config.team_id, TEAM);
    }

    #[tokio::test]
    async fn test_services_need_valid_team() {
        let api = InMemoryApi::new();
        assert!(services(&client(&api), "sre").await.is_err());
        assert!(api.requests().is_empty());
    }

    const SERVICE: &str = "22222222-2222-4222-8222-222222222222";
    const INTEGRATION: &str = "33333333-3333-4333-8333-333333333333";

    #[tokio::test]
    async fn test_integration_list_and_single() {
        let api = InMemoryApi::new();
        api.seed(
            &integration_path(TEAM, SERVICE, INTEGRATION),
            json!({ "unique_id": INTEGRATION, "name": "prometheus", "integration_key": "k1" }),
        );
        let client = client(&api);

        let all = integrations(&client, TEAM, SERVICE, None).await.unwrap();
        assert_eq!(all.len(), 1);
        let one = integrations(&client, TEAM, SERVICE, Some(INTEGRATION)).await.unwrap();
        assert_eq!(one[0].integration_key, "k1");
        assert!(integrations(&client, TEAM, SERVICE, Some("x")).await.is_err());
    }

    #[tokio::test]
    async fn test_alert_rules_under_integration() {
        let api = InMemoryApi::new();
        let collection = alert_rules_path(TEAM, SERVICE, INTEGRATION);
        api.seed(
            &format!("{}a1/", collection),
            json!({ "unique_id": "a1", "description": "page", "rule_json": "{}", "actions": [] }),
        );

        let rules = alert_rules(&client(&api), TEAM, SERVICE, INTEGRATION, None).await.unwrap();
        assert_eq!(rules[0].description, "page");
    }

    #[tokio::test]
    async fn test_team_scoped_lists() {
        let api = InMemoryApi::new();
        api.seed(
            &format!("{}t1/", tags_path(TEAM)),
            json!({ "unique_id": "t1", "name": "db", "color": "red" }),
        );
        api.seed(
            &format!("{}p1/", priorities_path(TEAM)),
            json!({ "unique_id": "p1", "name": "P1", "color": "red" }),
        );
        api.seed(
            &format!("{}r1/", roles_path(TEAM)),
            json!({ "unique_id": "r1", "title": "Scribe", "rank": 2 }),
        );
        api.seed(
            &policy_path(TEAM, INTEGRATION),
            json!({ "unique_id": INTEGRATION, "name": "default", "rules": [] }),
        );
        let client = client(&api);

        assert_eq!(tags(&client, TEAM).await.unwrap()[0].name, "db");
        assert_eq!(priorities(&client, TEAM).await.unwrap()[0].name, "P1");
        assert_eq!(roles(&client, TEAM).await.unwrap()[0].rank, 2);
        let esp = escalation_policies(&client, TEAM, Some(INTEGRATION)).await.unwrap();
        assert_eq!(esp[0].name, "default");
    }

    #[tokio::test]
    async fn test_users_by_email() {
        let api = InMemoryApi::new();
        api.seed(
            &user_path("jdoe42"),
            json!({
                "unique_id": "u1",
                "role": 3,
                "user": { "username": "jdoe42", "email": "Jane@Example.com" },
            }),
        );
        let client = client(&api);

        let found = users(&client, "jane@example.com").await.unwrap();
        assert_eq!(found[0].user.username, "jdoe42");

        let err = users(&client, "nobody@example.com").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_incidents_filters() {
        let api = InMemoryApi::new();
        api.seed(
            INCIDENTS_PATH,
            json!({ "results": [
                { "incident_number": 1, "status": 1, "title": "a" },
                { "incident_number": 2, "status": 3, "title": "b" },
            ]}),
        );
        let client = client(&api);

        assert_eq!(incidents(&client, None, None).await.unwrap().len(), 2);
        let resolved = incidents(&client, None, Some(3)).await.unwrap();
        assert_eq!(resolved[0].title, "b");
        assert_eq!(incidents(&client, Some(1), None).await.unwrap()[0].title, "a");
        assert!(incidents(&client, None, Some(9)).await.is_err());
    }

    #[tokio::test]
    async fn test_user_contact_lookup() {
        let api = InMemoryApi::new();
        let contacts = format!("{}contacts/", user_path("jdoe42"));
        api.seed(
            &format!("{}c1/", contacts),
            json!({ "unique_id": "c1", "name": "work", "contact_type": 1, "value": "j@x.io" }),
        );
        api.seed(
            &format!("{}c2/", contacts),
            json!({ "unique_id": "c2", "name": "cell", "contact_type": 2, "value": "+100" }),
        );
        let client = client(&api);

        let sms = user_contact(&client, "jdoe42", 2, None).await.unwrap();
        assert_eq!(sms.unique_id, "c2");
        let email = user_contact(&client, "jdoe42", 1, Some("j@x.io")).await.unwrap();
        assert_eq!(email.name, "work");

        let err = user_contact(&client, "jdoe42", 1, Some("other@x.io")).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
        assert!(user_contact(&client, "jdoe42", 6, None).await.is_err());
    }

    #[tokio::test]
    async fn test_members_and_routers() {
        let api = InMemoryApi::new();
        api.seed(
            &format!("{}{}/", members_path(TEAM), SERVICE),
            json!({ "unique_id": SERVICE, "team": TEAM, "user": "jdoe42", "role": 2 }),
        );
        api.seed(
            &router_path(INTEGRATION),
            json!({ "unique_id": INTEGRATION, "name": "edge", "is_enabled": true }),
        );
        api.seed(
            &format!("{}r1/", rules_path(INTEGRATION)),
            json!({ "unique_id": "r1", "name": "drop noise", "rule_json": "{}" }),
        );
        let client = client(&api);

        let one = members(&client, TEAM, Some(SERVICE)).await.unwrap();
        assert_eq!(one[0].user, "jdoe42");
        assert_eq!(global_routers(&client, None).await.unwrap()[0].name, "edge");
        let rules = global_routing_rules(&client, INTEGRATION, None).await.unwrap();
        assert_eq!(rules[0].name, "drop noise");
        assert!(global_routing_rules(&client, "edge", None).await.is_err());
    }
}
