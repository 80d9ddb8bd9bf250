use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use terroir_client::config::ClientConfig;
use terroir_client::{ClientError, GameSession};
use terroir_core::store::View;

mod commands;
mod render;

use commands::Command;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "terroir_cli=info,terroir_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- Configuration ---
    let config = ClientConfig::from_env();
    tracing::info!(
        backend = %config.backend_url,
        timeout_secs = config.request_timeout.as_secs(),
        "Loaded client configuration"
    );

    // --- Session ---
    let mut session = GameSession::from_config(&config)?;
    if let Err(e) = session.resume().await {
        tracing::warn!(error = %e, "Could not resume previous session");
    }

    println!("Terroir & Time. Type 'help' for commands.\n");
    println!("{}", render::render_view(session.store()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            // Also carries the generated `help` text.
            Err(e) => {
                println!("{}", e.to_string().trim_end());
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Status => println!("{}", render::render_view(session.store())),
            Command::Regions => {
                println!("{}", render::render_regions(&session.store().reference().regions))
            }
            Command::Vessels => println!(
                "{}",
                render::render_vessel_types(&session.store().reference().vessel_types)
            ),
            other => run(&mut session, other).await,
        }
    }

    tracing::info!("Goodbye");
    Ok(())
}

/// Run a backend command and print whatever it changed.
async fn run(session: &mut GameSession, command: Command) {
    let shows_view = matches!(
        command,
        Command::Login { .. } | Command::Logout | Command::Refresh | Command::Advance
    );
    let view_before = session.store().view();

    let outcome = commands::execute(session, command).await;

    for notice in session.store_mut().drain_notices() {
        println!("{}", render::render_notice(&notice));
    }

    match outcome {
        // Validation and login problems are not posted as notices.
        Err(e @ (ClientError::Core(_) | ClientError::NotLoggedIn)) => {
            println!("{}", e.user_message());
        }
        Err(e) => tracing::debug!(error = %e, "Command failed"),
        Ok(()) => {}
    }

    let view_after = session.store().view();
    if shows_view || view_after != view_before || view_after != View::Game {
        println!("{}", render::render_view(session.store()));
    }
}
