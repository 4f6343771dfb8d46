use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::runtime::Handle;

use weathernow_core::{Config, Location};
use weathernow_weather::{CandidateLocation, LoadOutcome};

mod app;
mod render;

use app::App;

#[derive(Parser)]
#[command(name = "weathernow")]
#[command(about = "WeatherNow - current, hourly, and daily weather for saved locations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// City search filters shared by `search` and `add`
#[derive(clap::Args)]
struct Query {
    /// City name, or a zipcode with --zip
    query: String,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    country: Option<String>,
    /// Treat the query as a zipcode
    #[arg(long)]
    zip: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved locations
    List,
    /// Search for a location
    Search(Query),
    /// Search and save a result
    Add {
        #[command(flatten)]
        query: Query,
        /// Which search result to save (1-based)
        #[arg(long, default_value_t = 1)]
        pick: usize,
    },
    /// Delete a saved location by its position in `list`
    Remove { position: usize },
    /// Show weather for a saved location (defaults to the first)
    Weather { position: Option<usize> },
    /// Log in and load the account's saved locations
    Login { email: String, password: String },
    /// Create an account
    Register { email: String, password: String },
    /// Log out and forget the session token
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    weathernow_core::init()?;

    let cli = Cli::parse();
    let (config, _) = Config::load_validated().context("Failed to load configuration")?;

    let app = App::new(config, Handle::current())?;
    app.initialize();

    tracing::info!(
        "WeatherNow started, data in {}",
        app.config().storage.data_dir.display()
    );

    let result = run(&app, cli.command.unwrap_or(Commands::Weather { position: None })).await;

    app.shutdown().await;
    result
}

async fn run(app: &App, command: Commands) -> Result<()> {
    match command {
        Commands::List => list(app),
        Commands::Search(query) => {
            let results = search(app, &query).await?;
            if results.is_empty() {
                println!("No matches found");
            }
            print_lines(render::candidates(&results));
            Ok(())
        }
        Commands::Add { query, pick } => {
            let results = search(app, &query).await?;
            let Some(candidate) = pick.checked_sub(1).and_then(|i| results.get(i)) else {
                bail!("No search result #{} ({} found)", pick, results.len());
            };

            let location = Location::from(candidate.clone());
            match app.session().add_location(location) {
                Ok(true) => println!("Saved {}", candidate.label()),
                Ok(false) => println!("{} is already saved", candidate.label()),
                Err(e) => bail!(e.user_message()),
            }
            Ok(())
        }
        Commands::Remove { position } => {
            let location = saved_at(app, position)?;
            app.session().delete_location(&location);
            println!("Removed {}", render::location_header(&location));
            Ok(())
        }
        Commands::Weather { position } => weather(app, position.unwrap_or(1)).await,
        Commands::Login { email, password } => {
            app.login(&email, &password)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Logged in as {}", email);
            list(app)
        }
        Commands::Register { email, password } => {
            let user = app
                .register(&email, &password)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Registered {}. Log in to continue.", user.email);
            Ok(())
        }
        Commands::Logout => {
            app.logout();
            println!("Logged out");
            Ok(())
        }
    }
}

async fn search(app: &App, query: &Query) -> Result<Vec<CandidateLocation>> {
    let results = if query.zip {
        app.search()
            .search_by_zipcode(&query.query, query.country.as_deref())
            .await
    } else {
        app.search()
            .search_by_city(&query.query, query.state.as_deref(), query.country.as_deref())
            .await
    };
    results.map_err(|e| anyhow::anyhow!(e.user_message()))
}

fn list(app: &App) -> Result<()> {
    let session = app.session().snapshot();
    if let Some(user) = &session.user {
        println!("Signed in as {}", user);
    }
    if session.locations.is_empty() {
        println!("No saved locations. Try `weathernow add <city>`.");
    }
    for (i, location) in session.locations.iter().enumerate() {
        println!("{:>2}. {}", i + 1, render::location_header(location));
    }
    Ok(())
}

fn saved_at(app: &App, position: usize) -> Result<Location> {
    let locations = app.session().locations();
    position
        .checked_sub(1)
        .and_then(|i| locations.get(i).cloned())
        .with_context(|| format!("No saved location #{} ({} saved)", position, locations.len()))
}

async fn weather(app: &App, position: usize) -> Result<()> {
    let location = saved_at(app, position)?;
    let loader = app.weather_loader();

    match loader.load(&location).await {
        LoadOutcome::Loaded(snapshot) => {
            print_lines(render::alerts(&snapshot));
            print_lines(render::current(&location, &snapshot));
            println!();
            print_lines(render::hourly(&snapshot));
            println!();
            print_lines(render::daily(&snapshot));
            Ok(())
        }
        LoadOutcome::Failed(e) => bail!(e.user_message()),
        LoadOutcome::Superseded | LoadOutcome::Cancelled => Ok(()),
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}
