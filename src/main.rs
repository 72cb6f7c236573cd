use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notekeeper::{api, config::AppConfig, db::Database, models::SignupForm};

#[derive(Parser)]
#[command(name = "notekeeper")]
#[command(about = "Personal notes addressed by slug, one author per note")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind to
        #[arg(short, long)]
        bind: Option<IpAddr>,

        /// SQLite database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
    /// Apply pending schema migrations and exit
    Migrate {
        /// SQLite database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
    /// Create a user account
    CreateUser {
        username: String,

        #[arg(long, env = "NOTEKEEPER_PASSWORD", hide_env_values = true)]
        password: String,

        /// SQLite database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "notekeeper=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn open_database(path: Option<PathBuf>) -> anyhow::Result<Database> {
    let db = match path {
        Some(path) => Database::open(path)?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let db = open_database(config.database.clone())?;
    let app = api::create_router_with_config(db, &config);

    let addr = SocketAddr::new(config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("notekeeper listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = AppConfig::from_env();

    match cli.command {
        Some(Commands::Serve {
            port,
            bind,
            database,
        }) => {
            config.port = port.unwrap_or(config.port);
            config.bind = bind.unwrap_or(config.bind);
            config.database = database.or(config.database);
            serve(config).await?;
        }
        Some(Commands::Migrate { database }) => {
            open_database(database.or(config.database))?;
            tracing::info!("Migrations applied");
        }
        Some(Commands::CreateUser {
            username,
            password,
            database,
        }) => {
            let account = SignupForm {
                username,
                password1: password.clone(),
                password2: password,
            }
            .validate()
            .map_err(|errors| anyhow::anyhow!("{errors}"))?;

            let db = open_database(database.or(config.database))?;
            let hash = api::hash_password(&account.password)
                .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
            let user = db.create_user(&account.username, &hash)?;
            println!("Created user {} ({})", user.username, user.id);
        }
        None => serve(config).await?,
    }

    Ok(())
}
