use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
}

impl TestServer {
    /// Boot the router in-process on a dedicated runtime thread so it
    /// outlives each test's own runtime.
    fn spawn() -> Result<Self> {
        // Must land before the config singleton is first touched.
        if std::env::var("JWT_SECRET").is_err() {
            std::env::set_var("JWT_SECRET", "integration-test-secret");
        }

        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<()>();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().expect("test runtime");
            rt.block_on(async move {
                // Pool + migrations only when a database was provided; the
                // no-database suites still exercise the 401/400 taxonomy.
                if std::env::var("DATABASE_URL").is_ok() {
                    use lectern_api::database::manager::DatabaseManager;
                    if DatabaseManager::init().await.is_ok() {
                        let _ = DatabaseManager::migrate().await;
                    }
                }

                let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
                    .await
                    .expect("bind test listener");
                let _ = ready_tx.send(());
                axum::serve(listener, lectern_api::app()).await.expect("server");
            });
        });

        ready_rx
            .recv_timeout(Duration::from_secs(10))
            .context("server thread did not come up")?;

        Ok(Self { port, base_url })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                // Ready on ok or degraded; degraded just means no database.
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to start test server"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

pub fn db_available() -> bool {
    std::env::var("DATABASE_URL").is_ok()
}

/// Direct pool for seeding and existence assertions, separate from the
/// server's own pool.
pub async fn test_pool() -> Result<sqlx::PgPool> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .context("failed to connect test pool")
}

/// Mint a bearer token the way the login endpoint would.
pub fn mint_token(user_id: i64, email: &str) -> String {
    let claims = lectern_api::auth::Claims::new(user_id, email.to_string());
    lectern_api::auth::generate_jwt(&claims).expect("JWT_SECRET set by ensure_server")
}

/// Register a fresh user through the API and log in; returns (id, token).
pub async fn register_and_login(
    client: &reqwest::Client,
    base_url: &str,
    label: &str,
) -> Result<(i64, String)> {
    let email = format!("{}-{}@lectern.test", label, uuid::Uuid::new_v4().simple());

    let created: serde_json::Value = client
        .post(format!("{}/auth/register", base_url))
        .json(&serde_json::json!({
            "email": email,
            "password": "correct horse battery",
            "display_name": label,
        }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let user_id = created["id"].as_i64().context("register response misses id")?;

    let login: serde_json::Value = client
        .post(format!("{}/auth/login", base_url))
        .json(&serde_json::json!({
            "email": email,
            "password": "correct horse battery",
        }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let token = login["token"].as_str().context("login response misses token")?;

    Ok((user_id, token.to_string()))
}
