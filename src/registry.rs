//! Resource kind table and the JSON facade over the typed lifecycle drivers.
//!
//! The host hands over opaque JSON state (`{"id": ..., "config": {...}}`) and
//! a kind name. [`Provider`] decodes it into the kind's typed config, runs the
//! operation and hands back the new state with its diagnostics.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::client::ZendutyClient;
use crate::error::{Diagnostic, Diagnostics, ProviderError, Result};
use crate::resources::account_role::AccountRoleResource;
use crate::resources::alert_rule::AlertRuleResource;
use crate::resources::escalation_policy::EscalationPolicyResource;
use crate::resources::incident::IncidentResource;
use crate::resources::integration::IntegrationResource;
use crate::resources::invite::InviteResource;
use crate::resources::maintenance_window::MaintenanceWindowResource;
use crate::resources::member::MemberResource;
use crate::resources::notification_rule::NotificationRuleResource;
use crate::resources::outgoing_rule::OutgoingRuleResource;
use crate::resources::post_incident_task::PostIncidentTaskResource;
use crate::resources::priority::PriorityResource;
use crate::resources::role::RoleResource;
use crate::resources::role_assignment::RoleAssignmentResource;
use crate::resources::router::RouterResource;
use crate::resources::routing_rule::RoutingRuleResource;
use crate::resources::schedule::ScheduleResource;
use crate::resources::service::ServiceResource;
use crate::resources::sla::SlaResource;
use crate::resources::tag::TagResource;
use crate::resources::task_template::TaskTemplateResource;
use crate::resources::task_template_task::TemplateTaskResource;
use crate::resources::team::TeamResource;
use crate::resources::user::UserResource;
use crate::resources::{self, Resource, ResourceState};

const KIND_PREFIX: &str = "zenduty_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Team,
    Role,
    Service,
    Integration,
    EscalationPolicy,
    Schedule,
    AlertRule,
    OutgoingRule,
    Router,
    RoutingRule,
    MaintenanceWindow,
    Sla,
    Tag,
    Priority,
    TaskTemplate,
    PostIncidentTask,
    AccountRole,
    User,
    NotificationRule,
    Member,
    Incident,
    Invite,
    RoleAssignment,
    TemplateTask,
}

/// Bind `$r` to the resource type behind `$kind` and evaluate `$body`.
macro_rules! with_resource {
    ($kind:expr, $r:ident => $body:expr) => {
        match $kind {
            ResourceKind::Team => {
                type $r = TeamResource;
                $body
            }
            ResourceKind::Role => {
                type $r = RoleResource;
                $body
            }
            ResourceKind::Service => {
                type $r = ServiceResource;
                $body
            }
            ResourceKind::Integration => {
                type $r = IntegrationResource;
                $body
            }
            ResourceKind::EscalationPolicy => {
                type $r = EscalationPolicyResource;
                $body
            }
            ResourceKind::Schedule => {
                type $r = ScheduleResource;
                $body
            }
            ResourceKind::AlertRule => {
                type $r = AlertRuleResource;
                $body
            }
            ResourceKind::OutgoingRule => {
                type $r = OutgoingRuleResource;
                $body
            }
            ResourceKind::Router => {
                type $r = RouterResource;
                $body
            }
            ResourceKind::RoutingRule => {
                type $r = RoutingRuleResource;
                $body
            }
            ResourceKind::MaintenanceWindow => {
                type $r = MaintenanceWindowResource;
                $body
            }
            ResourceKind::Sla => {
                type $r = SlaResource;
                $body
            }
            ResourceKind::Tag => {
                type $r = TagResource;
                $body
            }
            ResourceKind::Priority => {
                type $r = PriorityResource;
                $body
            }
            ResourceKind::TaskTemplate => {
                type $r = TaskTemplateResource;
                $body
            }
            ResourceKind::PostIncidentTask => {
                type $r = PostIncidentTaskResource;
                $body
            }
            ResourceKind::AccountRole => {
                type $r = AccountRoleResource;
                $body
            }
            ResourceKind::User => {
                type $r = UserResource;
                $body
            }
            ResourceKind::NotificationRule => {
                type $r = NotificationRuleResource;
                $body
            }
            ResourceKind::Member => {
                type $r = MemberResource;
                $body
            }
            ResourceKind::Incident => {
                type $r = IncidentResource;
                $body
            }
            ResourceKind::Invite => {
                type $r = InviteResource;
                $body
            }
            ResourceKind::RoleAssignment => {
                type $r = RoleAssignmentResource;
                $body
            }
            ResourceKind::TemplateTask => {
                type $r = TemplateTaskResource;
                $body
            }
        }
    };
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 24] = [
        ResourceKind::Team,
        ResourceKind::Role,
        ResourceKind::Service,
        ResourceKind::Integration,
        ResourceKind::EscalationPolicy,
        ResourceKind::Schedule,
        ResourceKind::AlertRule,
        ResourceKind::OutgoingRule,
        ResourceKind::Router,
        ResourceKind::RoutingRule,
        ResourceKind::MaintenanceWindow,
        ResourceKind::Sla,
        ResourceKind::Tag,
        ResourceKind::Priority,
        ResourceKind::TaskTemplate,
        ResourceKind::PostIncidentTask,
        ResourceKind::AccountRole,
        ResourceKind::User,
        ResourceKind::NotificationRule,
        ResourceKind::Member,
        ResourceKind::Incident,
        ResourceKind::Invite,
        ResourceKind::RoleAssignment,
        ResourceKind::TemplateTask,
    ];

    pub fn name(self) -> &'static str {
        with_resource!(self, R => R::KIND)
    }

    /// Import id layout, e.g. `<team_id>/<service_id>`.
    pub fn import_format(self) -> String {
        with_resource!(self, R => crate::ident::expected_pattern(R::IMPORT_FIELDS))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the full type name (`zenduty_teams`) or the bare suffix (`teams`).
impl FromStr for ResourceKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        ResourceKind::ALL
            .into_iter()
            .find(|kind| {
                let name = kind.name();
                name == wanted || name.strip_prefix(KIND_PREFIX) == Some(wanted)
            })
            .ok_or_else(|| {
                ProviderError::validation("kind", format!("unknown resource kind {:?}", s))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Result of one lifecycle callback. `state` is absent only when the input
/// could not be decoded.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
    pub diagnostics: Diagnostics,
}

impl Outcome {
    fn failed(err: ProviderError) -> Self {
        Self {
            state: None,
            diagnostics: err.into(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Kind-agnostic entry point used by the binary and by hosts that speak JSON.
#[derive(Clone)]
pub struct Provider {
    client: ZendutyClient,
}

impl Provider {
    pub fn new(client: ZendutyClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ZendutyClient {
        &self.client
    }

    pub async fn apply(&self, kind: ResourceKind, op: Operation, state: Value) -> Outcome {
        with_resource!(kind, R => run::<R>(&self.client, op, state).await)
    }

    pub async fn import(&self, kind: ResourceKind, import_id: &str) -> Outcome {
        with_resource!(kind, R => import::<R>(&self.client, import_id).await)
    }
}

async fn run<R: Resource>(client: &ZendutyClient, op: Operation, raw: Value) -> Outcome {
    let mut state: ResourceState<R::Config> = match serde_json::from_value(raw) {
        Ok(state) => state,
        Err(err) => {
            return Outcome::failed(ProviderError::validation("state", err.to_string()));
        }
    };

    let had_handle = state.id.is_some();
    let result = match op {
        Operation::Create => resources::create::<R>(client, &mut state).await,
        Operation::Read => resources::read::<R>(client, &mut state).await,
        Operation::Update => resources::update::<R>(client, &mut state).await,
        Operation::Delete => resources::delete::<R>(client, &mut state).await,
    };

    let mut diagnostics = Diagnostics::new();
    match result {
        Ok(()) if op == Operation::Read && had_handle && state.id.is_none() => {
            diagnostics.push(Diagnostic::warning(
                "Resource no longer exists",
                format!("{} was removed remotely and will be recreated on the next apply", R::KIND),
            ));
        }
        Ok(()) => {}
        Err(err) => {
            warn!(kind = R::KIND, %op, code = err.code(), error = %err, "Lifecycle operation failed");
            diagnostics.push(err);
        }
    }

    Outcome {
        state: serde_json::to_value(&state).ok(),
        diagnostics,
    }
}

async fn import<R: Resource>(client: &ZendutyClient, import_id: &str) -> Outcome {
    match resources::import::<R>(client, import_id).await {
        Ok(state) => Outcome {
            state: serde_json::to_value(&state).ok(),
            diagnostics: Diagnostics::new(),
        },
        Err(err) => {
            warn!(kind = R::KIND, import_id, code = err.code(), error = %err, "Import failed");
            Outcome::failed(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryApi;
    use crate::error::Severity;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn provider(api: &InMemoryApi) -> Provider {
        Provider::new(ZendutyClient::new(Arc::new(api.clone())))
    }

    #[test]
    fn test_kind_names_are_unique_and_parse() {
        let names: HashSet<_> = ResourceKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), ResourceKind::ALL.len());

        for kind in ResourceKind::ALL {
            assert_eq!(kind.name().parse::<ResourceKind>().unwrap(), kind);
            assert!(kind.name().starts_with(KIND_PREFIX));
        }
        assert_eq!("esp".parse::<ResourceKind>().unwrap(), ResourceKind::EscalationPolicy);
        assert!("zenduty_widgets".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_import_format() {
        assert_eq!(
            ResourceKind::AlertRule.import_format(),
            "<team_id>/<service_id>/<integration_id>/<alert_rule_id>"
        );
        assert_eq!(ResourceKind::Team.import_format(), "<team_id>");
    }

    #[test]
    fn test_workflow_kinds_parse() {
        assert_eq!("incidents".parse::<ResourceKind>().unwrap(), ResourceKind::Incident);
        assert_eq!("zenduty_invite".parse::<ResourceKind>().unwrap(), ResourceKind::Invite);
        assert_eq!(
            "assign_account_role".parse::<ResourceKind>().unwrap(),
            ResourceKind::RoleAssignment
        );
        assert_eq!(
            ResourceKind::TemplateTask.import_format(),
            "<team_id>/<task_template_id>/<task_id>"
        );
    }

    #[tokio::test]
    async fn test_create_then_read_json() {
        let api = InMemoryApi::new();
        let provider = provider(&api);

        let created = provider
            .apply(ResourceKind::Team, Operation::Create, json!({ "config": { "name": "SRE" } }))
            .await;
        assert!(created.diagnostics.is_empty());
        let state = created.state.unwrap();
        assert!(state["id"].is_string());

        let read = provider.apply(ResourceKind::Team, Operation::Read, state).await;
        assert!(!read.has_errors());
        assert_eq!(read.state.unwrap()["config"]["name"], "SRE");
    }

    #[tokio::test]
    async fn test_vanished_resource_warns() {
        let api = InMemoryApi::new();
        let outcome = provider(&api)
            .apply(
                ResourceKind::Tag,
                Operation::Read,
                json!({
                    "id": "22222222-2222-4222-9222-222222222222",
                    "config": {
                        "team_id": "11111111-1111-4111-8111-111111111111",
                        "name": "db",
                        "color": "red",
                    },
                }),
            )
            .await;

        assert!(!outcome.has_errors());
        let diag = outcome.diagnostics.iter().next().unwrap();
        assert_eq!(diag.severity, Severity::Warning);
        assert!(outcome.state.unwrap().get("id").is_none());
    }

    #[tokio::test]
    async fn test_validation_error_becomes_diagnostic() {
        let api = InMemoryApi::new();
        let outcome = provider(&api)
            .apply(
                ResourceKind::Role,
                Operation::Create,
                json!({
                    "config": { "team": "not-a-uuid", "title": "Scribe", "description": "Takes notes" },
                }),
            )
            .await;

        assert!(outcome.has_errors());
        assert!(outcome.state.is_some());
        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_state() {
        let api = InMemoryApi::new();
        let outcome = provider(&api)
            .apply(ResourceKind::Team, Operation::Create, json!({ "config": { "name": 7 } }))
            .await;
        assert!(outcome.has_errors());
        assert!(outcome.state.is_none());
    }

    #[tokio::test]
    async fn test_import_bad_id() {
        let api = InMemoryApi::new();
        let outcome = provider(&api).import(ResourceKind::Service, "abc/def").await;
        let diag = outcome.diagnostics.iter().next().unwrap();
        assert_eq!(diag.summary, "Invalid UUID");
        assert!(api.requests().is_empty());
    }
}
