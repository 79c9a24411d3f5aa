use clap::{Parser, Subcommand};

use lectern_api::database::manager::DatabaseManager;

#[derive(Parser)]
#[command(name = "lectern-api", about = "Course marketplace backend API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Listen port; falls back to LECTERN_API_PORT, PORT, then 3000
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply pending database migrations
    Migrate,
    /// Ping the database and exit non-zero when unreachable
    Health,
}

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = lectern_api::config::config();
    tracing::info!("Starting Lectern API in {:?} mode", config.environment);

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(port).await,
        Command::Migrate => migrate().await,
        Command::Health => health().await,
    }
}

async fn serve(port: Option<u16>) {
    // A missing database keeps the server up; /health reports degraded and
    // handlers answer 503 until the pool comes back at restart.
    if let Err(e) = DatabaseManager::init().await {
        tracing::warn!("database pool not available at startup: {}", e);
    }

    let app = lectern_api::app();

    let port = port
        .or_else(|| {
            std::env::var("LECTERN_API_PORT")
                .ok()
                .or_else(|| std::env::var("PORT").ok())
                .and_then(|s| s.parse::<u16>().ok())
        })
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("Lectern API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

async fn migrate() {
    if let Err(e) = try_migrate().await {
        eprintln!("migration failed: {}", e);
        std::process::exit(1);
    }
    println!("migrations applied");
}

async fn try_migrate() -> Result<(), lectern_api::database::manager::DatabaseError> {
    DatabaseManager::init().await?;
    DatabaseManager::migrate().await
}

async fn health() {
    let result = async {
        DatabaseManager::init().await?;
        DatabaseManager::health_check().await
    }
    .await;

    match result {
        Ok(_) => println!("ok"),
        Err(e) => {
            eprintln!("database unreachable: {}", e);
            std::process::exit(1);
        }
    }
}
