use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use hush_bridge::{ReceiveBridge, ReceptionManager};
use hush_core::Alphabet;
use hush_linux::{config, LinuxClock, TcpPulseAcceptor};
use log::{info, warn};

#[derive(Parser)]
struct Cli {
    /// Listen endpoints, in bridge order. Must match the sender's --bridge order.
    #[arg(long = "listen", default_value = "0.0.0.0:50003")] listen: Vec<String>,
    /// TOML alphabet; the built-in table when omitted.
    #[arg(long)] alphabet: Option<PathBuf>,
    /// Completion polling interval.
    #[arg(long, default_value_t = 1000)] poll_ms: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let alphabet = Arc::new(match &cli.alphabet {
        Some(path) => config::load_alphabet(path)?,
        None => Alphabet::standard(),
    });

    let mut manager = ReceptionManager::new(Duration::from_millis(cli.poll_ms));
    for addr in &cli.listen {
        let acceptor = TcpPulseAcceptor::bind(addr)?;
        manager.add_bridge(ReceiveBridge::new(alphabet.clone(), Box::new(acceptor), Arc::new(LinuxClock::new())));
    }

    let statuses: Vec<_> = manager.statuses().to_vec();
    ctrlc::set_handler(move || {
        warn!("Signal received. Stopping...");
        for status in &statuses {
            status.force_quit();
        }
    })?;

    manager.start_listening();
    info!("Listening on {} bridges", cli.listen.len());

    let message = manager.wait_for_message();
    println!("\nThe message is: {}", message.bold().green());
    Ok(())
}
