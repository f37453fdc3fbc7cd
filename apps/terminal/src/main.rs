use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::Result;
use clap::Parser;
use client_core::{CartClient, CartHandle, ClientEvent, EditSession, HttpRemoteStore};
use shared::domain::CartItem;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
    task::JoinSet,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod command;
mod config;
mod render;
mod selection;

use command::{parse, Command, HELP};
use config::{load_settings, validate_store_url};
use render::{render_edit, render_snapshot};
use selection::InventorySelection;

#[derive(Parser, Debug)]
#[command(about = "Terminal front end for the remote shopping cart")]
struct Args {
    /// Base URL of the cart store; overrides cart.toml and the environment.
    #[arg(long)]
    store_url: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(url) = args.store_url {
        settings.store_url = validate_store_url(&url)?;
    }
    info!(store_url = %settings.store_url, "starting cart terminal");

    let client = CartClient::new(Arc::new(HttpRemoteStore::new(settings.store_url)));
    let selection = Arc::new(Mutex::new(InventorySelection::default()));

    let render_selection = Arc::clone(&selection);
    client
        .state()
        .subscribe(move |snapshot| match render_selection.lock() {
            Ok(selection) => println!("{}", render_snapshot(snapshot, &selection)),
            Err(_) => warn!("selection lock poisoned; skipping render"),
        })
        .await;

    let mut events = client.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event printer lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    client.load_data().await;
    println!("{HELP}");

    let handle: Arc<dyn CartHandle> = client;
    let mut in_flight = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => {
                dispatch(&handle, &selection, &mut in_flight, command).await
            }
            Ok(None) => {}
            Err(message) => eprintln!("{message}"),
        }
    }
    drain_in_flight(&mut in_flight).await;
    handle.state().clear_subscribers().await;
    Ok(())
}

fn print_event(event: ClientEvent) {
    match event {
        ClientEvent::EditStarted { item } => {
            println!("{}", render_edit(&EditSession::begin(&item)))
        }
        ClientEvent::EditCancelled { id } => println!("edit of [{id}] cancelled"),
        ClientEvent::CheckoutCompleted { requested, failed } => {
            println!("checkout finished: {requested} requested, {failed} failed")
        }
        ClientEvent::ActionFailed { action, message } => eprintln!("{action} failed: {message}"),
    }
}

/// Waits for every spawned intent to finish before the runtime shuts down.
async fn drain_in_flight(in_flight: &mut JoinSet<()>) {
    while let Some(result) = in_flight.join_next().await {
        if let Err(err) = result {
            warn!(error = %err, "cart intent task failed");
        }
    }
}

/// Runs one command. Anything that reaches the remote store is spawned onto
/// `in_flight` so the prompt stays responsive while requests are pending.
async fn dispatch(
    handle: &Arc<dyn CartHandle>,
    selection: &Arc<Mutex<InventorySelection>>,
    in_flight: &mut JoinSet<()>,
    command: Command,
) {
    let state = handle.state();
    match command {
        Command::Select { id, step } => {
            if state.inventory().await.iter().all(|item| item.id != id) {
                eprintln!("no inventory item [{id}]");
                return;
            }
            let amount = match selection.lock() {
                Ok(mut selection) => selection.step(id, step),
                Err(_) => return,
            };
            println!("selected {amount} of [{id}]");
        }
        Command::Add { id } => {
            let Some(inventory_item) = state
                .inventory()
                .await
                .into_iter()
                .find(|item| item.id == id)
            else {
                eprintln!("no inventory item [{id}]");
                return;
            };
            let taken = selection.lock().ok().and_then(|mut s| s.take(id));
            let Some(amount) = taken else {
                eprintln!("select an amount first with 'plus {id}'");
                return;
            };
            let item = CartItem::from_inventory(&inventory_item, amount);
            let handle = Arc::clone(handle);
            in_flight.spawn(async move { handle.add_to_cart(item).await });
        }
        Command::Delete { id } => {
            let handle = Arc::clone(handle);
            in_flight.spawn(async move { handle.delete_cart_item(id).await });
        }
        Command::Edit { id } => {
            if !handle.edit_cart_item(id).await {
                eprintln!("no cart item [{id}] to edit");
            }
        }
        Command::StepEdit(step) => match handle.adjust_edit(step).await {
            Some(amount) => println!("draft amount {amount}"),
            None => eprintln!("no edit in progress"),
        },
        Command::Save => {
            let handle = Arc::clone(handle);
            in_flight.spawn(async move {
                if !handle.save_edit().await {
                    eprintln!("no edit in progress");
                }
            });
        }
        Command::Update { id, amount } => {
            let handle = Arc::clone(handle);
            in_flight.spawn(async move { handle.update_cart_item(id, amount).await });
        }
        Command::Cancel => handle.cancel_edit().await,
        Command::Checkout => {
            let handle = Arc::clone(handle);
            in_flight.spawn(async move { handle.checkout().await });
        }
        Command::Show => state.republish().await,
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
