use crate::client::Client;
use crate::config::Config;
use crate::location::GeoPoint;
use crate::logging::{setup_logging, LogLevel};
use crate::registry::Database;
use crate::services::{active_alerts, add_city, report, AlertQuery};
use crate::sink::ConsoleSink;
use anyhow::{anyhow, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

fn default(path: &Path) -> String {
    format!("[default: {}]", path.as_os_str().to_string_lossy())
}
/// National Weather Service alert tool
#[derive(Parser, Debug, Serialize, Deserialize)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, value_name = "DIR", help = default(&Config::default_dirs().state)) ]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,

    #[arg(short, long = "config", value_name = "FILE", help = default(&Config::default_path()))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,

    /// [default: info]
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    #[serde(skip)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the database and write a config file
    Init,
    /// Store a state and its two letter code
    AddState { code: String, name: String },
    /// Forget a state
    RemoveState { name: String },
    /// Store the coordinates of a city
    AddLocation {
        city: String,
        state_code: String,
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
    },
    /// Look up and store the county a known city is in
    AddCity { city: String, state: String },
    /// Forget the county of a city
    RemoveCity { city: String },
    /// Print the county code for a point
    Zone {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
    },
    /// Print the active warnings for an area
    Alerts(AlertArgs),
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("area").required(true).args(["city", "state", "county"])))]
struct AlertArgs {
    /// A city added with add-city
    #[arg(long)]
    city: Option<String>,
    /// A state added with add-state
    #[arg(long)]
    state: Option<String>,
    /// An NWS county or zone code e.g. ILC143
    #[arg(long)]
    county: Option<String>,
}

impl AlertArgs {
    fn query(&self) -> Result<AlertQuery> {
        if let Some(city) = &self.city {
            Ok(AlertQuery::City(city.clone()))
        } else if let Some(state) = &self.state {
            Ok(AlertQuery::State(state.clone()))
        } else if let Some(county) = &self.county {
            Ok(AlertQuery::County(county.clone()))
        } else {
            Err(anyhow!("You must provide at least 1 argument"))
        }
    }
}

pub fn cli() -> Result<()> {
    let args = Cli::parse();

    let mut config = Config::from_cli(&args)?;
    if let Some(level) = args.log_level {
        config.main.logging.console_level = level;
        config.main.logging.file_level = level;
    }
    config.ensure_state_dir()?;
    let _guard = setup_logging(&config.main.logging, &config.main.state_dir);
    debug!("Command line arguments: {:#?}", &args);
    debug!("Config: {:#?}", &config);

    match &args.command {
        Some(Commands::Init) => init(&config)?,
        Some(Commands::AddState { code, name }) => {
            let database = open_database(&config)?;
            if database.add_state(code, name)? {
                info!("State {name} added with code {code}");
            } else {
                info!("State {name} was already known");
            }
        }
        Some(Commands::RemoveState { name }) => {
            let removed = open_database(&config)?.remove_state(name)?;
            info!("Removed {removed} state(s) named {name}");
        }
        Some(Commands::AddLocation {
            city,
            state_code,
            latitude,
            longitude,
        }) => {
            let point = GeoPoint::new(*latitude, *longitude);
            open_database(&config)?.add_location(city, state_code, point)?;
            info!("Stored {city}, {state_code} at {point}");
        }
        Some(Commands::AddCity { city, state }) => {
            let client = Client::new(&config.main.client);
            let zone = add_city(&client, &open_database(&config)?, city, state)?;
            println!("{zone}");
        }
        Some(Commands::RemoveCity { city }) => {
            let removed = open_database(&config)?.remove_county(city)?;
            info!("Removed {removed} county mapping(s) for {city}");
        }
        Some(Commands::Zone {
            latitude,
            longitude,
        }) => {
            let client = Client::new(&config.main.client);
            let zone = client.resolve_zone(GeoPoint::new(*latitude, *longitude))?;
            println!("{zone}");
        }
        Some(Commands::Alerts(alert_args)) => print_alerts(&config, alert_args)?,
        None => {}
    }
    Ok(())
}

fn init(config: &Config) -> Result<()> {
    config.get_database()?.init()?;
    if !config.config_path.exists() {
        config.write_config_file()?;
    }
    Ok(())
}

fn open_database(config: &Config) -> Result<Database> {
    let database = config.get_database()?;
    if !database.path().exists() {
        return Err(anyhow!(
            "No database at {}. Run init first",
            database.path().display()
        ));
    }
    Ok(database)
}

fn print_alerts(config: &Config, alert_args: &AlertArgs) -> Result<()> {
    let query = alert_args.query()?;
    let client = Client::new(&config.main.client);
    let database = open_database(config)?;
    let alerts = active_alerts(&client, &database, &query)?;
    if report(&alerts, &ConsoleSink) == 0 {
        println!("No active warnings found.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn alerts_requires_exactly_one_area() {
        assert!(Cli::try_parse_from(["nws-alerts", "alerts"]).is_err());
        assert!(
            Cli::try_parse_from(["nws-alerts", "alerts", "--state", "Illinois", "--county", "ILC143"])
                .is_err()
        );
        let cli = Cli::try_parse_from(["nws-alerts", "alerts", "--county", "ILC143"]).unwrap();
        let Some(Commands::Alerts(args)) = cli.command else {
            panic!("expected alerts command");
        };
        assert_eq!(args.query().unwrap(), AlertQuery::County("ILC143".into()));
    }

    #[test]
    fn negative_coordinates_parse() {
        let cli = Cli::try_parse_from(["nws-alerts", "zone", "40.69", "-89.59"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Zone { longitude, .. }) if longitude == -89.59
        ));
    }
}
