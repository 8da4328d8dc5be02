use std::sync::Arc;

use clap::{Parser, Subcommand};
use session_gate::app::Shell;
use session_gate::config::{ConfigError, ShellConfig};
use session_gate::net::api::{ApiError, HttpSessionClient};
use session_gate::router::{Route, RoutePolicy, RouteTable, RouterError};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("session client error: {0}")]
    Api(#[from] ApiError),
    #[error("navigation failed: {0}")]
    Router(#[from] RouterError),
}

#[derive(Parser, Debug)]
#[command(name = "session-gate", about = "Boot the session shell against an API and drive navigation")]
struct Cli {
    /// Overrides `API_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Session cookie to start with, as `name=value`.
    #[arg(long, env = "API_SESSION_COOKIE")]
    session_cookie: Option<String>,

    /// Extra paths registered as requiring authentication.
    #[arg(long = "protect", value_name = "PATH")]
    protected: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the restored identity, if any.
    Whoami,
    /// Navigate to each path in order and print where the guard sent you.
    Navigate {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// End the session and follow the redirect home.
    Logout,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ShellConfig::from_env()?;
    if let Some(url) = cli.base_url.as_deref() {
        config = config.with_base_url(url)?;
    }

    let client = HttpSessionClient::new(&config, cli.session_cookie.as_deref())?;
    let routes = cli.protected.iter().fold(RouteTable::default(), |table, path| {
        table.with_route(Route::new(path.trim_start_matches('/'), path.as_str(), RoutePolicy::RequiresAuth))
    });
    let shell = Shell::boot_with_routes(&config, Arc::new(client), routes).await;

    if let Some(notice) = shell.notifications().current() {
        eprintln!("[{:?}] {}", notice.severity, notice.message);
    }

    match cli.command {
        Command::Whoami => match shell.session().identity() {
            Some(identity) => println!("{} ({})", identity.display_name, identity.id),
            None => println!("not signed in"),
        },
        Command::Navigate { paths } => {
            for path in &paths {
                let nav = shell.navigate(path).await?;
                match nav.redirected_from {
                    Some(from) => println!("{} -> {} (redirected)", from.path, nav.route.path),
                    None => println!("{}", nav.route.path),
                }
            }
        }
        Command::Logout => {
            if let Some(nav) = shell.logout().await? {
                println!("signed out; now at {}", nav.route.path);
            }
        }
    }

    Ok(())
}
