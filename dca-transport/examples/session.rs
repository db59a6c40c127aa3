//! Session example: sign in, fetch the profile, sign out.
//!
//! Run with: cargo run -p dca-transport --example session
//!
//! Requires .env file with:
//! - DCA_API_ORIGIN (e.g. https://app.example.com)
//! - DCA_EMAIL
//! - DCA_PASSWORD
//!
//! Optional: DCA_API_BASE_PATH, DCA_API_TIMEOUT_MS, DCA_CSRF_COOKIE,
//! DCA_CSRF_HEADER. Logs go to `dca-session.log`.

use std::env;
use std::fs::File;
use std::sync::Arc;

use dca_transport::RequestConfig;
use dca_transport::TransportClient;
use dca_transport::TransportConfig;
use dca_transport::navigate::LogNavigator;
use dca_transport::storage::SessionStore;
use dca_transport::storage::SqliteStore;
use serde_json::Value;
use serde_json::json;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::WriteLogger;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let log_file = File::create("dca-session.log")?;
    WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)?;

    let origin = env::var("DCA_API_ORIGIN").expect("DCA_API_ORIGIN not set");
    let email = env::var("DCA_EMAIL").expect("DCA_EMAIL not set");
    let password = env::var("DCA_PASSWORD").expect("DCA_PASSWORD not set");

    let session = Arc::new(SessionStore::new(SqliteStore::open("dca-session.db").await?));
    let client = TransportClient::builder()
        .origin(origin)
        .credentials(session.clone())
        .navigator(LogNavigator)
        .config(TransportConfig::from_env()?)
        .build()?;

    if session.is_authenticated().await? {
        println!("Reusing stored session");
    } else {
        println!("Signing in...");
        let request =
            RequestConfig::post("/auth/login").json(json!({"email": email, "password": password}));
        let login = client.send(request).await?;
        let token = login
            .data()
            .and_then(|data| data.get("token"))
            .and_then(Value::as_str)
            .ok_or("login response carries no token")?;
        let user = login.data().and_then(|data| data.get("user")).cloned().unwrap_or(Value::Null);
        session.login(token, &user).await?;
    }

    match client.get("/user/info").await {
        Ok(profile) => println!("Profile: {}", profile.data().cloned().unwrap_or(Value::Null)),
        Err(e) if e.requires_reauth() => {
            println!("Session expired ({}), signing out", e);
            session.logout().await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
