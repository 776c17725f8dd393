use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use hush_bridge::{TransmissionManager, TransmitBridge};
use hush_core::Alphabet;
use hush_linux::{config, LinuxClock, TcpPulseEmitter};
use log::info;

#[derive(Parser)]
struct Cli {
    /// Receiver endpoints, in bridge order. Must match the receiver's --listen order.
    #[arg(long = "bridge", required = true)] bridges: Vec<String>,
    #[arg(long)] message: Option<String>,
    /// TOML alphabet; the built-in table when omitted.
    #[arg(long)] alphabet: Option<PathBuf>,
}

fn read_message() -> anyhow::Result<String> {
    print!("Please provide the message to send: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    println!();
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let alphabet = Arc::new(match &cli.alphabet {
        Some(path) => config::load_alphabet(path)?,
        None => Alphabet::standard(),
    });

    let mut manager = TransmissionManager::new();
    for target in &cli.bridges {
        let emitter = TcpPulseEmitter::new(target)?;
        manager.add_bridge(TransmitBridge::new(Box::new(emitter), alphabet.clone(), Arc::new(LinuxClock::new())));
    }

    let message = match cli.message {
        Some(m) => m,
        None => read_message()?,
    };
    manager.assign(&message);
    info!("Sending {} characters over {} bridges", message.chars().count(), cli.bridges.len());

    let reports = manager.send_all();
    let failed = reports.iter().filter(|r| r.result.is_err()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} bridges failed to deliver", failed, reports.len());
    }
    Ok(())
}
