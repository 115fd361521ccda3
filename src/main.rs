use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use floodsense_lib::api::{parse_factors, NewAlert, RiskAssessmentInput, WeatherReading};
use floodsense_lib::auth::{GuardDecision, Location};
use floodsense_lib::risk::{
    self, filter_by_risk, sort_by_risk_level, HasRiskLevel, RiskLevel, UnknownRiskLevel,
};
use floodsense_lib::{AppConfig, ClientError, FloodSense, VERSION};

/// Session file used when neither a flag nor the config file names one
const DEFAULT_SESSION_FILE: &str = "floodsense-session.json";

#[derive(Parser, Debug)]
#[command(name = "floodsense", version, about = "FloodSense admin console")]
struct Cli {
    /// Base URL of the FloodSense API
    #[arg(long, global = true, env = "FLOODSENSE_API_URL")]
    api_url: Option<String>,

    /// Session file, kept between invocations [default: floodsense-session.json]
    #[arg(long, global = true, env = "FLOODSENSE_STORAGE_PATH")]
    storage: Option<PathBuf>,

    /// JSON configuration file; flags override it
    #[arg(long, global = true, env = "FLOODSENSE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in as an administrator
    Login {
        username: String,
        #[arg(long, env = "FLOODSENSE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show who is signed in
    Status,
    /// List monitored locations, most at risk first
    Locations {
        #[arg(long, value_parser = parse_risk_level)]
        risk: Option<RiskLevel>,
        #[arg(long)]
        district: Option<String>,
    },
    /// Show one location with its current readings
    Location { id: i64 },
    /// List alerts
    Alerts {
        /// Only alerts that are still active
        #[arg(long)]
        active: bool,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Publish a public flood alert
    Broadcast {
        location_id: i64,
        #[arg(value_parser = parse_risk_level)]
        level: RiskLevel,
        message: String,
    },
    /// List public alert subscriptions
    Subscriptions,
    /// Enable or disable a subscription
    ToggleSubscription { id: i64, state: Toggle },
    /// Record a manual weather reading
    Weather {
        location_id: i64,
        #[arg(long)]
        rainfall: f64,
        #[arg(long)]
        temperature: f64,
        #[arg(long)]
        humidity: f64,
        #[arg(long)]
        wind_speed: f64,
    },
    /// Record a manual risk assessment
    Assess {
        location_id: i64,
        #[arg(value_parser = parse_risk_level)]
        level: RiskLevel,
        /// Comma separated contributing factors
        #[arg(long, default_value = "")]
        factors: String,
    },
    /// Dashboard overview
    Summary,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Toggle {
    On,
    Off,
}

fn parse_risk_level(raw: &str) -> std::result::Result<RiskLevel, UnknownRiskLevel> {
    raw.parse()
}

/// Build the configuration: file or environment first, then flags on top
async fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path).await?,
        None => AppConfig::from_env(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    match &cli.storage {
        Some(path) => config.storage.path = Some(path.clone()),
        None if config.storage.path.is_none() => {
            config.storage.path = Some(PathBuf::from(DEFAULT_SESSION_FILE));
        }
        None => {}
    }
    Ok(config)
}

/// Navigate to an admin route and stop unless the guard lets us in
fn enter(app: &FloodSense, route: &str) -> Result<()> {
    app.navigator().navigate(Location::new(route));
    match app.guard().enforce(app.session(), app.navigator().as_ref(), route) {
        GuardDecision::Render => Ok(()),
        GuardDecision::Redirect { to, from } => {
            bail!("Sign in required for {from}; redirected to {to}. Run `floodsense login <username>`.")
        }
        GuardDecision::Waiting => bail!("Session check has not finished"),
    }
}

/// Turn an API failure into a message for the operator
fn explain(error: ClientError, fallback: &str) -> anyhow::Error {
    let message = error.user_message(fallback);
    debug!(kind = %error.category(), "Command failed");
    anyhow!(error).context(message)
}

fn print_level(raw: Option<&str>) -> String {
    match raw.and_then(|r| r.parse::<RiskLevel>().ok()) {
        Some(level) => format!("{} ({})", level.label(), level.color()),
        None => "Unknown".to_string(),
    }
}

async fn run(app: &FloodSense, command: Command) -> Result<()> {
    let session = app.session();

    match command {
        Command::Login { username, password } => {
            let password = password
                .ok_or_else(|| anyhow!("Password required: pass --password or set FLOODSENSE_PASSWORD"))?;
            let body = session
                .login(&username, &password)
                .await
                .map_err(|e| explain(e, "Invalid credentials or server error"))?;
            let target = app.guard().post_login_target(app.navigator().as_ref());
            app.navigator().navigate(Location::new(target.clone()));
            println!("Signed in as {}", body.user.username);
            println!("Continue at {target}");
        }
        Command::Logout => {
            session.logout();
            println!("Signed out");
        }
        Command::Status => {
            let state = session.state();
            match state.user() {
                Some(user) => {
                    println!("Signed in as {}", user.username);
                    if let Some(role) = &user.role {
                        println!("Role: {role}");
                    }
                }
                None => println!("Not signed in ({state})"),
            }
            println!("API: {}", app.client().base_url());
        }
        Command::Locations { risk, district } => {
            enter(app, "/admin/locations")?;
            let listing = match &district {
                Some(district) => app.locations.by_district(district).await,
                None => app.locations.list().await,
            }
            .map_err(|e| explain(e, "Failed to load locations"))?;

            let shown = sort_by_risk_level(&filter_by_risk(&listing.items, risk));
            for location in &shown {
                println!(
                    "{:>5}  {:<28} {:<14} {}",
                    location.id,
                    risk::truncate_text(&location.name, 28),
                    location.district,
                    print_level(location.raw_risk_level())
                );
            }
            println!("{} of {} locations", shown.len(), listing.count);
        }
        Command::Location { id } => {
            enter(app, "/admin/locations")?;
            let details = app
                .locations
                .get(id)
                .await
                .map_err(|e| explain(e, "Failed to load location"))?;
            let location = &details.location;
            println!("{} ({})", location.name, location.district);

            if let Some(weather) = &details.current_weather {
                println!("  Rainfall     {}", risk::format_rainfall(weather.rainfall_mm));
                println!("  Temperature  {}", risk::format_temperature(weather.temperature));
                println!("  Humidity     {}", risk::format_percentage(weather.humidity));
                println!("  Wind         {}", risk::format_wind_speed(weather.wind_speed));
            }
            let level = details.current_risk.as_ref().and_then(|r| r.risk_level());
            match level {
                Some(level) => {
                    println!("  Risk         {}", level.label());
                    println!("  Advice       {}", level.action());
                }
                None => println!("  Risk         No assessment yet"),
            }
        }
        Command::Alerts { active, limit } => {
            enter(app, "/admin/alerts")?;
            let alerts = if active {
                app.alerts.active().await
            } else {
                app.alerts.recent(limit).await
            }
            .map_err(|e| explain(e, "Failed to load alerts"))?;

            for alert in &alerts.items {
                println!(
                    "[{}] {} - {}",
                    alert.risk_level.as_deref().unwrap_or("INFO"),
                    alert.location_name.as_deref().unwrap_or("Unknown Location"),
                    risk::truncate_text(&alert.message, 60)
                );
            }
            if alerts.is_empty() {
                println!("No alerts");
            }
        }
        Command::Broadcast {
            location_id,
            level,
            message,
        } => {
            enter(app, "/admin/alerts")?;
            app.alerts
                .broadcast(&NewAlert::new(location_id, level, message))
                .await
                .map_err(|e| explain(e, "Failed to trigger alert"))?;
            println!("{} alert sent for location {location_id}", level.label());
        }
        Command::Subscriptions => {
            enter(app, "/admin/subscriptions")?;
            let subs = app
                .subscriptions
                .list()
                .await
                .map_err(|e| explain(e, "Failed to load subscriptions"))?;
            for sub in &subs.items {
                println!(
                    "{:>5}  {:<20} {:<28} {:<16} {}",
                    sub.id,
                    sub.display_name(),
                    sub.email.as_deref().unwrap_or("-"),
                    sub.location_name(),
                    if sub.is_active { "active" } else { "paused" }
                );
            }
            println!("{} subscribers", subs.count);
        }
        Command::ToggleSubscription { id, state } => {
            enter(app, "/admin/subscriptions")?;
            let is_active = matches!(state, Toggle::On);
            app.subscriptions
                .toggle(id, is_active)
                .await
                .map_err(|e| explain(e, "Failed to update subscription"))?;
            println!("Subscription {id} {}", if is_active { "enabled" } else { "disabled" });
        }
        Command::Weather {
            location_id,
            rainfall,
            temperature,
            humidity,
            wind_speed,
        } => {
            enter(app, "/admin/weather")?;
            let reading = WeatherReading::now(location_id, rainfall, temperature, humidity, wind_speed);
            app.readings
                .submit_weather(&reading)
                .await
                .map_err(|e| explain(e, "Failed to submit weather data"))?;
            println!("Weather data submitted");
        }
        Command::Assess {
            location_id,
            level,
            factors,
        } => {
            enter(app, "/admin/risk")?;
            let input = RiskAssessmentInput::manual(location_id, level, parse_factors(&factors));
            app.readings
                .submit_risk(&input)
                .await
                .map_err(|e| explain(e, "Failed to create risk assessment"))?;
            println!("Risk assessment recorded (score {})", input.risk_score);
        }
        Command::Summary => {
            enter(app, "/admin/dashboard")?;
            let overview = app
                .dashboard
                .overview()
                .await
                .map_err(|e| explain(e, "Failed to load dashboard data"))?;

            println!("Monitored locations  {}", overview.locations.count);
            println!("Recent alerts        {}", overview.alerts.count);
            println!(
                "Highest risk         {}",
                overview.highest_risk().map_or("Low", |level| level.label())
            );
            match overview.last_updated() {
                Some(at) => println!("Last updated         {}", at.format("%b %d, %Y %H:%M")),
                None => println!("Last updated         N/A"),
            }
            for slice in overview.summary.risk_distribution.chart_slices() {
                println!("  {:<10} {:>4}  {}", slice.label, slice.value, slice.color);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    let env_file_path = dotenvy::dotenv().ok();

    // Logs go to stderr so command output stays clean
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                "floodsense_lib=debug,floodsense=debug,warn".into()
            } else {
                "floodsense_lib=info,floodsense=info,warn".into()
            }
        }))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    match env_file_path {
        Some(path) => debug!("Loaded environment variables from {}", path.display()),
        None => debug!("No .env file found. Using existing environment variables."),
    };

    let cli = Cli::parse();
    info!(version = VERSION, "FloodSense console starting");

    let config = load_config(&cli).await.context("Invalid configuration")?;
    let app = FloodSense::new(config).context("Failed to start FloodSense client")?;

    // Every invocation starts by checking the stored session, like a page load
    let state = app.session().initialize().await;
    debug!(%state, "Startup session check finished");

    run(&app, cli.command).await
}
