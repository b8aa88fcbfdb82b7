mod cli;

use clap::Parser;
use cli::{Cli, Commands, DataArgs, DataSource, ImportArgs, StateArgs};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::process::ExitCode;
use tracing::info;

use zenduty_provider::config::{Config, Overrides};
use zenduty_provider::error::Diagnostics;
use zenduty_provider::observability::init_tracing;
use zenduty_provider::{
    Operation, Outcome, Provider, ResourceKind, ZendutyClient, data_sources, timewindow,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<ExitCode, BoxError> {
    let cli = Cli::parse();

    let overrides = Overrides {
        config_path: cli.config.clone(),
        token: cli.token.clone(),
        base_url: cli.base_url.clone(),
    };

    match cli.command {
        Commands::Kinds => {
            for kind in ResourceKind::ALL {
                println!("{:<32} {}", kind.name(), kind.import_format());
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::ToUtc(args) => convert(timewindow::to_utc(&args.time, &args.timezone)),
        Commands::FromUtc(args) => convert(timewindow::from_utc(&args.time, &args.timezone)),
        command => {
            let config = Config::load(&overrides)?;
            init_tracing(&config.logging.filter);
            info!(base_url = %config.provider.base_url, "Loaded configuration");

            let provider = Provider::new(ZendutyClient::from_config(&config)?);
            let code = match command {
                Commands::Create(args) => apply(&provider, Operation::Create, args).await?,
                Commands::Read(args) => apply(&provider, Operation::Read, args).await?,
                Commands::Update(args) => apply(&provider, Operation::Update, args).await?,
                Commands::Delete(args) => apply(&provider, Operation::Delete, args).await?,
                Commands::Import(args) => import(&provider, args).await?,
                Commands::Data(args) => lookup(provider.client(), args).await?,
                Commands::Kinds | Commands::ToUtc(_) | Commands::FromUtc(_) => ExitCode::SUCCESS,
            };

            if cli.verbose {
                let snapshot = provider.client().metrics().snapshot();
                eprintln!(
                    "requests={} failures={} retries={} handles_cleared={}",
                    snapshot.api_requests,
                    snapshot.api_failures,
                    snapshot.retries,
                    snapshot.handles_cleared
                );
            }
            Ok(code)
        }
    }
}

async fn apply(provider: &Provider, op: Operation, args: StateArgs) -> Result<ExitCode, BoxError> {
    let kind: ResourceKind = args.kind.parse()?;
    let state: Value = serde_json::from_str(&std::fs::read_to_string(&args.file)?)?;

    let outcome = provider.apply(kind, op, state).await;
    if let Some(state) = &outcome.state {
        write_json(&args.file, state)?;
    }
    Ok(report(&outcome))
}

async fn import(provider: &Provider, args: ImportArgs) -> Result<ExitCode, BoxError> {
    let kind: ResourceKind = args.kind.parse()?;
    let outcome = provider.import(kind, &args.id).await;
    if let Some(state) = &outcome.state {
        match &args.out {
            Some(path) => write_json(path, state)?,
            None => println!("{}", serde_json::to_string_pretty(state)?),
        }
    }
    Ok(report(&outcome))
}

async fn lookup(client: &ZendutyClient, args: DataArgs) -> Result<ExitCode, BoxError> {
    let team = args.team_id.as_deref().unwrap_or_default();
    let service = args.service_id.as_deref().unwrap_or_default();
    let integration = args.integration_id.as_deref().unwrap_or_default();
    let id = args.id.as_deref();
    let result = match args.source {
        DataSource::Teams => data_sources::teams(client, args.team_id.as_deref())
            .await
            .and_then(to_json),
        DataSource::Services => data_sources::services(client, team).await.and_then(to_json),
        DataSource::Schedules => data_sources::schedules(client, team).await.and_then(to_json),
        DataSource::MaintenanceWindows => {
            data_sources::maintenance_windows(client, team)
                .await
                .and_then(to_json)
        }
        DataSource::Roles => data_sources::roles(client, team).await.and_then(to_json),
        DataSource::Integrations => data_sources::integrations(client, team, service, id)
            .await
            .and_then(to_json),
        DataSource::Esp => data_sources::escalation_policies(client, team, id)
            .await
            .and_then(to_json),
        DataSource::User => {
            data_sources::users(client, args.email.as_deref().unwrap_or_default())
                .await
                .and_then(to_json)
        }
        DataSource::Alertrules => {
            data_sources::alert_rules(client, team, service, integration, id)
                .await
                .and_then(to_json)
        }
        DataSource::Tags => data_sources::tags(client, team).await.and_then(to_json),
        DataSource::Priorities => data_sources::priorities(client, team).await.and_then(to_json),
        DataSource::Incidents => data_sources::incidents(client, args.incident_number, args.status)
            .await
            .and_then(to_json),
        DataSource::Usercontact => {
            let username = args.username.as_deref().unwrap_or_default();
            data_sources::user_contact(client, username, args.contact_type, args.value.as_deref())
                .await
                .and_then(to_json)
        }
        DataSource::Members => data_sources::members(client, team, id).await.and_then(to_json),
        DataSource::Globalrouter => data_sources::global_routers(client, args.router_id.as_deref())
            .await
            .and_then(to_json),
        DataSource::GlobalRoutingRules => {
            let router = args.router_id.as_deref().unwrap_or_default();
            data_sources::global_routing_rules(client, router, id)
                .await
                .and_then(to_json)
        }
    };

    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Ok(print_diagnostics(&Diagnostics::from(err))),
    }
}

fn convert(result: zenduty_provider::Result<String>) -> Result<ExitCode, BoxError> {
    match result {
        Ok(converted) => {
            println!("{}", converted);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Ok(print_diagnostics(&Diagnostics::from(err))),
    }
}

fn to_json<T: Serialize>(items: T) -> zenduty_provider::Result<Value> {
    serde_json::to_value(items)
        .map_err(|err| zenduty_provider::ProviderError::validation("output", err.to_string()))
}

fn write_json(path: &Path, value: &Value) -> Result<(), BoxError> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    std::fs::write(path, text)?;
    Ok(())
}

fn report(outcome: &Outcome) -> ExitCode {
    print_diagnostics(&outcome.diagnostics)
}

/// One diagnostic per line; failure exit code when any is an error.
fn print_diagnostics(diagnostics: &Diagnostics) -> ExitCode {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic);
    }
    if diagnostics.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
