use neuromem::{Autosaver, Brain, Gateway, MemoryConfig};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match MemoryConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let (brain, outcome) = Brain::open(config);
    let brain = Arc::new(brain);
    info!(
        ?outcome,
        neurons = brain.neuron_count(),
        associations = brain.association_count(),
        "memory ready"
    );

    let autosaver = match Autosaver::spawn(Arc::clone(&brain)) {
        Ok(handle) => handle,
        Err(e) => {
            error!(error = %e, "could not start autosave");
            return ExitCode::FAILURE;
        }
    };

    let gateway = Gateway::new(brain);
    println!("Waiting for your signal. Type 'exit' to quit.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let text = match line {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "failed to read input");
                break;
            }
        };
        let text = text.trim();
        if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
            break;
        }
        if text.is_empty() {
            continue;
        }

        let reply = gateway.receive(text);
        if writeln!(stdout, "{reply}").and_then(|_| stdout.flush()).is_err() {
            break;
        }
    }

    autosaver.stop();
    ExitCode::SUCCESS
}
