//! Login walkthrough.
//!
//! Selects a transport for the users endpoint, connects and performs one
//! `auth_request`. With no backend running, the simulated transport answers.
//!
//! Run with: cargo run --example login -- [url] [username] [password]
//! Verbose logs: RUST_LOG=ws_fallback=debug

use std::env;
use std::time::Duration;

use tokio::time::timeout;
use tracing_subscriber::EnvFilter;
use ws_fallback::{AuthResponse, DEFAULT_ENDPOINT, Message, TransportFactory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ws_fallback=info")),
        )
        .init();

    let mut args = env::args().skip(1);
    let url = args.next().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    let username = args.next().unwrap_or_else(|| "admin".to_string());
    let password = args.next().unwrap_or_else(|| "password".to_string());

    let factory = TransportFactory::new();
    let transport = factory.create_service(&url).await?;

    if factory.is_simulated() {
        println!("Backend at {url} is unreachable. Running in demo mode.");
        println!("Demo credentials: admin / password");
    }

    transport.connect().await?;
    println!("Connected ({})", transport.state());

    let mut messages = transport.messages();
    transport.send(Message::auth_request(username, password))?;

    let response = timeout(Duration::from_secs(10), async {
        while let Some(message) = messages.recv().await {
            if let Ok(response) = AuthResponse::from_message(&message) {
                return Some(response);
            }
        }
        None
    })
    .await?;

    match response {
        Some(response) if response.success => {
            let user = response.user.map(|u| u.username).unwrap_or_default();
            println!("Logged in as {user}");
            println!("Token: {}", response.token.unwrap_or_default());
        }
        Some(response) => {
            println!(
                "Login rejected: {}",
                response.message.unwrap_or_else(|| "no reason given".to_string())
            );
        }
        None => println!("Connection ended before a response arrived"),
    }

    transport.disconnect();
    Ok(())
}
