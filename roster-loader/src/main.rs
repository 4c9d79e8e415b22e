//! ROSTER entry point.
//!
//! Opens one list session against the configured subject and drives it from
//! line commands on stdin: `all`, `local`, `tag <value>`, `more`, `quit`.

use roster_loader::config::RosterConfig;
use roster_loader::driver::SessionDriver;
use roster_loader::error::LoaderError;
use roster_loader::events::SessionCommand;
use roster_loader::session::{tab_counts, SessionSnapshot, TabCount};
use roster_loader::telemetry::init_tracing;
use roster_loader::{InMemoryDirectory, RestPageSource};
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), LoaderError> {
    let config = RosterConfig::load()?;
    init_tracing(&config.log)?;

    let source = Arc::new(RestPageSource::new(&config)?);
    tracing::info!(subject_id = %source.subject_id(), "Opening reactions list");
    let directory = InMemoryDirectory::with_actors(config.local_actors());
    let (driver, mut snapshots) = SessionDriver::open(
        source,
        config.loader_config(),
        config.initial_filter(),
        &config.available_tags(),
        config.local_list(),
        directory,
    );

    print_tabs(&tab_counts(&config.tag_counts(), config.local_actors.len()));
    print_snapshot(&snapshots.borrow_and_update());

    let (command_tx, command_rx) = mpsc::channel::<SessionCommand>(32);
    spawn_input_reader(command_tx);
    let driver_task = tokio::spawn(driver.run(command_rx));

    // The sender lives in the driver; `changed` fails once it stops.
    while snapshots.changed().await.is_ok() {
        print_snapshot(&snapshots.borrow_and_update());
    }

    match driver_task.await {
        Ok(last) => tracing::info!(rows = last.rows.len(), "Session closed"),
        Err(err) => tracing::error!(error = %err, "Session driver failed"),
    }
    Ok(())
}

fn spawn_input_reader(sender: mpsc::Sender<SessionCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<SessionCommand>() {
                Ok(command) => {
                    let shutdown = command == SessionCommand::Shutdown;
                    if sender.blocking_send(command).is_err() || shutdown {
                        break;
                    }
                }
                Err(err) => eprintln!("{}", err),
            }
        }
        // Dropping the sender on EOF stops the driver.
    });
}

fn print_tabs(tabs: &[TabCount]) {
    let labels: Vec<String> = tabs
        .iter()
        .map(|tab| match tab.filter.wire_name() {
            "" => format!("all ({})", tab.count),
            name => format!("{} ({})", name, tab.count),
        })
        .collect();
    println!("tabs: {}", labels.join(" | "));
}

fn print_snapshot(snapshot: &SessionSnapshot) {
    let mut status = String::new();
    if snapshot.loading {
        status.push_str(" loading");
    }
    if snapshot.exhausted {
        status.push_str(" end");
    }
    println!("[{}] {} rows{}", snapshot.active, snapshot.rows.len(), status);
    for row in &snapshot.rows {
        if row.tag.is_empty() {
            println!("  {}", row.actor.display_name);
        } else {
            println!("  {} {}", row.actor.display_name, row.tag);
        }
    }
}
