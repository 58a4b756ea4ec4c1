//! StaySpot - rental chat client
//!
//! Terminal front end for StaySpot conversations between listing owners
//! and interested renters.

use std::io::{self, BufRead, Write};

use stayspot_core::{Error, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stayspot_app::cli::{Args, Command};
use stayspot_app::config::AppConfig;
use stayspot_app::render::{self, TranscriptPrinter};
use stayspot_app::state::AppState;
use stayspot_app::viewmodel::{self, auth, ChatSession, SendOutcome};

const QUIT: &str = "/quit";

fn main() {
    // Logs go to stderr, the transcript to stdout
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = <Args as clap::Parser>::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        eprintln!("error: {e}");
        if e.requires_login() {
            eprintln!("hint: run `stayspot login <email>` first");
        }
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = AppConfig::load()?;
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }

    // Prompt before the runtime starts; stdin is read synchronously here
    let command = match args.command {
        Command::Login { email, password } => Command::Login {
            password: Some(password_or_prompt(password)?),
            email,
        },
        Command::Register {
            name,
            email,
            password,
        } => Command::Register {
            password: Some(password_or_prompt(password)?),
            name,
            email,
        },
        other => other,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let state = AppState::new(config)?;
    runtime.block_on(dispatch(&state, command))
}

async fn dispatch(state: &AppState, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let user = auth::login(state, &email, password.as_deref().unwrap_or_default()).await?;
            println!("Logged in as {} <{}>", user.name, user.email);
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            let user =
                auth::register(state, &name, &email, password.as_deref().unwrap_or_default())
                    .await?;
            println!("Welcome, {}", user.name);
        }
        Command::Logout => {
            auth::logout(state)?;
            println!("Logged out");
        }
        Command::Whoami => {
            let user = auth::whoami(state).await?;
            println!("{} <{}> (id {})", user.name, user.email, user.id);
        }
        Command::Conversations => {
            if !state.is_logged_in() {
                return Err(Error::NotAuthenticated);
            }
            let rows = viewmodel::load_conversations(state).await?;
            if rows.is_empty() {
                println!("No conversations yet.");
            }
            for row in &rows {
                println!("{}", render::conversation_line(row));
            }
        }
        Command::Chat { conversation_id } => chat(state, conversation_id).await?,
    }
    Ok(())
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Interactive chat until `/quit` or end of input
async fn chat(state: &AppState, conversation_id: i64) -> Result<()> {
    if !state.is_logged_in() {
        return Err(Error::NotAuthenticated);
    }

    let session = ChatSession::new(
        conversation_id,
        state.api.clone(),
        state.identity.clone(),
        state.config.sync_config(),
    );
    // subscribe first so the initial load is seen as a change
    let mut view_rx = session.subscribe();
    session.start();
    let mut printer = TranscriptPrinter::new(io::stdout());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut header_shown = false;

    eprintln!("Type a message and press Enter. {QUIT} to leave.");

    loop {
        tokio::select! {
            changed = view_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = view_rx.borrow_and_update().clone();

                if !header_shown {
                    if let Some(rental_id) = view.messages().find_map(|m| m.rental_id) {
                        header_shown = true;
                        match state.api.fetch_listing(rental_id).await {
                            Ok(listing) => println!("{}", render::listing_header(&listing)),
                            Err(e) => tracing::warn!(rental_id, error = %e, "Could not load listing"),
                        }
                    }
                }

                printer.render(&view)?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim() == QUIT {
                    break;
                }
                match session.send(&line).await {
                    Ok(SendOutcome::Sent(_)) | Ok(SendOutcome::Empty) => {}
                    Ok(SendOutcome::Busy) => eprintln!("Still sending the previous message"),
                    Err(e) => eprintln!("Failed to send: {e}"),
                }
            }
        }
    }

    session.close();
    Ok(())
}
