use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "zenduty")]
#[command(about = "Manage Zenduty resources from JSON state files", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $ZENDUTY_CONFIG or config/zenduty.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API token, overrides every other source
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Print request counters when done
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the resource described by a state file and write back its id
    Create(StateArgs),
    /// Refresh a state file from the API
    Read(StateArgs),
    /// Push the configuration in a state file to the API
    Update(StateArgs),
    /// Delete the resource referenced by a state file
    Delete(StateArgs),
    /// Import an existing resource and print its state
    Import(ImportArgs),
    /// Look up existing objects
    Data(DataArgs),
    /// List resource kinds and their import id formats
    Kinds,
    /// Convert a local `YYYY-MM-DD HH:MM` time to UTC
    ToUtc(ConvertArgs),
    /// Convert a UTC timestamp to local `YYYY-MM-DD HH:MM`
    FromUtc(ConvertArgs),
}

#[derive(clap::Args, Debug)]
pub struct StateArgs {
    /// Resource kind, e.g. `zenduty_teams` or `teams`
    pub kind: String,

    /// JSON state file: {"id": ..., "config": {...}}
    #[arg(long, short)]
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    pub kind: String,

    /// Composite import id, see `zenduty kinds`
    pub id: String,

    /// Write the imported state here instead of stdout
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct DataArgs {
    pub source: DataSource,

    /// Team scope; optional for `teams`, required for team-scoped sources
    #[arg(long)]
    pub team_id: Option<String>,

    #[arg(long)]
    pub service_id: Option<String>,

    #[arg(long)]
    pub integration_id: Option<String>,

    #[arg(long)]
    pub router_id: Option<String>,

    /// Narrow a list source to one object
    #[arg(long)]
    pub id: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub username: Option<String>,

    /// 1 email, 2 SMS, 3 phone, 4 Slack, 5 push
    #[arg(long, default_value_t = 1)]
    pub contact_type: i64,

    #[arg(long)]
    pub value: Option<String>,

    #[arg(long)]
    pub incident_number: Option<i64>,

    #[arg(long)]
    pub status: Option<i64>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataSource {
    Teams,
    Services,
    Schedules,
    MaintenanceWindows,
    Roles,
    Integrations,
    Esp,
    User,
    Alertrules,
    Tags,
    Priorities,
    Incidents,
    Usercontact,
    Members,
    Globalrouter,
    GlobalRoutingRules,
}

#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    pub time: String,

    /// IANA timezone name, e.g. `Asia/Kolkata`
    pub timezone: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_state_command() {
        let cli = Cli::try_parse_from([
            "zenduty",
            "--base-url",
            "http://localhost:8080",
            "create",
            "teams",
            "--file",
            "team.json",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:8080"));
        assert!(matches!(cli.command, Commands::Create(ref args) if args.kind == "teams"));
    }

    #[test]
    fn test_parse_data_source() {
        let cli = Cli::try_parse_from([
            "zenduty",
            "data",
            "maintenance-windows",
            "--team-id",
            "11111111-1111-4111-8111-111111111111",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Data(DataArgs { source: DataSource::MaintenanceWindows, .. })
        ));
    }

    #[test]
    fn test_parse_contact_lookup() {
        let cli = Cli::try_parse_from([
            "zenduty",
            "data",
            "usercontact",
            "--username",
            "jdoe42",
            "--contact-type",
            "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Data(args) => {
                assert_eq!(args.source, DataSource::Usercontact);
                assert_eq!(args.username.as_deref(), Some("jdoe42"));
                assert_eq!(args.contact_type, 2);
                assert!(args.value.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
