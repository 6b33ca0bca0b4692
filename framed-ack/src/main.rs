//! Entry point for `framed-ack`.
//!
//! Connects, reads one line from stdin, delivers it until acknowledged,
//! waits for the operator to press enter, then closes the connection.
//! `main.rs` owns only process setup (logging, argument parsing, runtime,
//! stdio).

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use time::UtcOffset;

use framed_ack::config::Config;
use framed_ack::exchanger::Exchanger;
use framed_ack::input;
use framed_ack::message::local_offset;

fn main() -> Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cfg = Config::parse();

    // Still single-threaded here; the offset lookup fails once workers exist.
    let offset = local_offset();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting runtime")?
        .block_on(session(cfg, offset))
}

async fn session(cfg: Config, offset: UtcOffset) -> Result<()> {
    let mut endpoint = framed_ack::connect(&cfg.host, cfg.port)
        .await
        .with_context(|| format!("connecting to {}:{}", cfg.host, cfg.port))?;

    let outcome = run(&cfg, offset, &mut endpoint).await;

    // Close on every path; an exchange failure takes precedence.
    let closed = endpoint.close().await;
    outcome?;
    closed.context("closing connection")?;
    Ok(())
}

async fn run(cfg: &Config, offset: UtcOffset, endpoint: &mut framed_ack::Endpoint) -> Result<()> {
    let line = input::off_runtime(|| {
        input::read_message(&mut io::stdin().lock(), &mut io::stdout())
    })
    .await
    .context("reading message")?;
    let message = cfg.message_for(line, offset);

    let mut exchanger = Exchanger::new(endpoint.stream_mut())
        .with_policy(cfg.retry_policy())
        .with_recv_capacity(cfg.recv_capacity);

    println!("Sending {} to {}", message.describe(), cfg.host);
    let report = exchanger
        .exchange(&message)
        .await
        .context("delivering message")?;
    println!(
        "Acknowledged after {} attempt(s), {} bytes sent",
        report.attempts, report.bytes_sent
    );

    input::off_runtime(|| input::wait_for_confirmation(&mut io::stdin().lock(), &mut io::stdout()))
        .await
        .context("waiting for confirmation")?;
    Ok(())
}
