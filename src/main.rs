// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Command-line front end for the EBICS client.
//!
//! One invocation performs one batch of operations: optionally enroll or
//! load the configured subscriber, then run the requested key-management
//! and file-transfer orders. Dirty identity state is saved and the trace
//! cache cleared before the process exits, whatever happened in between.

use std::fs;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use chrono::NaiveDate;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ebics_client::wire::GatewayTransport;
use ebics_client::{Config, DownloadOutcome, EbicsClient, Error, OrderType, Result};
use ebics_client::storage::TraceManager;

/// EBICS client command line.
#[derive(Parser)]
#[command(name = "ebics-client")]
#[command(about = "EBICS corporate-banking client", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file path (defaults to <client home>/ebics.toml)
    #[arg(long, env = "EBICS_CLIENT_CONFIG")]
    config: Option<PathBuf>,

    /// Create and initialize a new EBICS user
    #[arg(long)]
    create: bool,

    /// Re-render the enrollment letters
    #[arg(long)]
    letters: bool,

    /// Send INI request (signature key)
    #[arg(long)]
    ini: bool,

    /// Send HIA request (encryption and authentication keys)
    #[arg(long)]
    hia: bool,

    /// Send HPB request (fetch bank keys)
    #[arg(long)]
    hpb: bool,

    /// Send SPR request (lock subscriber)
    #[arg(long)]
    spr: bool,

    /// Fetch STA file (MT940 statement)
    #[arg(long)]
    sta: bool,

    /// Fetch VMK file (MT942 interim report)
    #[arg(long)]
    vmk: bool,

    /// Fetch camt.052 file
    #[arg(long)]
    c52: bool,

    /// Fetch camt.053 file
    #[arg(long)]
    c53: bool,

    /// Fetch camt.054 file
    #[arg(long)]
    c54: bool,

    /// Fetch C5N file (zip with camt.054 documents)
    #[arg(long)]
    c5n: bool,

    /// Fetch CIZ file
    #[arg(long)]
    ciz: bool,

    /// Fetch ZDF file (zip with documents)
    #[arg(long)]
    zdf: bool,

    /// Fetch ZB6 file
    #[arg(long)]
    zb6: bool,

    /// Fetch client protocol file (TXT)
    #[arg(long)]
    ptk: bool,

    /// Fetch client protocol file (XML)
    #[arg(long)]
    hac: bool,

    /// Fetch Z01 file
    #[arg(long)]
    z01: bool,

    /// Fetch CRC file
    #[arg(long)]
    crc: bool,

    /// Fetch CRJ file
    #[arg(long)]
    crj: bool,

    /// Fetch CRZ file
    #[arg(long)]
    crz: bool,

    /// Fetch HAA file
    #[arg(long)]
    haa: bool,

    /// Fetch HTD file
    #[arg(long)]
    htd: bool,

    /// Send payment order file (DTA format)
    #[arg(long)]
    xkd: bool,

    /// Send payment order file (any format)
    #[arg(long)]
    ful: bool,

    /// Send XCT file (any format)
    #[arg(long)]
    xct: bool,

    /// Send XE2 file (any format)
    #[arg(long)]
    xe2: bool,

    /// Send CCT file (any format)
    #[arg(long)]
    cct: bool,

    /// Send CIP file (any format)
    #[arg(long)]
    cip: bool,

    /// Input file for uploads
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Output file for downloads
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Start date (YYYY-MM-DD)
    #[arg(short = 's', long)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(short = 'e', long)]
    end: Option<NaiveDate>,

    /// Request test data for downloads
    #[arg(long)]
    test: bool,

    /// Skip a number of order ids
    #[arg(long)]
    skip_order: Option<u32>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// First requested download order, in catalog order.
    fn download_order(&self) -> Option<OrderType> {
        let catalog = [
            (self.sta, OrderType::STA),
            (self.vmk, OrderType::VMK),
            (self.c52, OrderType::C52),
            (self.c53, OrderType::C53),
            (self.c54, OrderType::C54),
            (self.c5n, OrderType::C5N),
            (self.ciz, OrderType::CIZ),
            (self.zdf, OrderType::ZDF),
            (self.zb6, OrderType::ZB6),
            (self.ptk, OrderType::PTK),
            (self.hac, OrderType::HAC),
            (self.z01, OrderType::Z01),
            (self.crc, OrderType::CRC),
            (self.crj, OrderType::CRJ),
            (self.crz, OrderType::CRZ),
            (self.haa, OrderType::HAA),
            (self.htd, OrderType::HTD),
        ];
        catalog.into_iter().find(|(flag, _)| *flag).map(|(_, t)| t)
    }

    /// First requested upload order, in catalog order.
    fn upload_order(&self) -> Option<OrderType> {
        let catalog = [
            (self.xkd, OrderType::XKD),
            (self.ful, OrderType::FUL),
            (self.xct, OrderType::XCT),
            (self.xe2, OrderType::XE2),
            (self.cct, OrderType::CCT),
            (self.cip, OrderType::CIP),
        ];
        catalog.into_iter().find(|(flag, _)| *flag).map(|(_, t)| t)
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    if let Err(e) = run(cli) {
        error!("{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = Config::default_root()?;
    let config = match &cli.config {
        Some(path) => Config::load(root, path)?,
        None => Config::load_default(root)?,
    };

    let traces = Rc::new(TraceManager::new());
    let key_exchange = GatewayTransport::new(config.bank_url().clone(), traces.clone())?;
    let transfer = GatewayTransport::new(config.bank_url().clone(), traces.clone())?;
    let mut client = EbicsClient::new(config, Box::new(key_exchange), Box::new(transfer), traces);

    let password = {
        let secret = client.config().password().to_string();
        move || secret.clone()
    };
    let user_id = client.config().user_id().to_string();

    if cli.create {
        client.create_configured_user(&password)?;
    } else {
        client.load_configured_user(&password)?;
    }

    // Save whatever changed and drop the trace cache even when an
    // operation failed; an advanced order counter must survive the exit.
    let result = execute(&cli, &mut client, &user_id);
    client.quit();
    result
}

fn execute(cli: &Cli, client: &mut EbicsClient, user_id: &str) -> Result<()> {
    if cli.letters {
        client.write_letters(user_id)?;
    }

    if cli.ini {
        client.send_ini(user_id)?;
    }
    if cli.hia {
        client.send_hia(user_id)?;
    }
    if cli.hpb {
        client.send_hpb(user_id)?;
    }
    if cli.spr {
        client.revoke_subscriber(user_id)?;
    }

    if let Some(order_type) = cli.download_order() {
        let output = cli
            .output
            .as_deref()
            .ok_or_else(|| Error::configuration("output file not set"))?;
        let outcome =
            client.download_to_file(user_id, order_type, cli.test, cli.start, cli.end, output)?;
        match outcome {
            DownloadOutcome::Data(data) => {
                info!(output = %output.display(), bytes = data.len(), "download written");
            }
            DownloadOutcome::NoData => {
                info!(order_type = %order_type, "no download data available for the requested period");
            }
        }
    }

    if let Some(order_type) = cli.upload_order() {
        let input = cli
            .input
            .as_deref()
            .ok_or_else(|| Error::configuration("input file not set"))?;
        let payload = fs::read(input)?;
        let order_id = client.upload(user_id, &payload, order_type, None)?;
        info!(order_type = %order_type, order_id, "upload accepted");
    }

    if let Some(n) = cli.skip_order {
        client.skip_order_ids(user_id, n)?;
    }

    Ok(())
}
