#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use std::io::{self, BufWriter, Write};

use anyhow::Context;
use clap::Parser;
use config::{CliArgs, Command, DecodeArgs, KeyConfig, LimitsArgs, RangeConfig, Window};
use serde::Serialize;
use telemetry::init_telemetry;
use yauid::{
    Key, NODE_ID_BITS, SEQUENCE_BITS, TIMESTAMP_BITS, compute_range_by_datetime,
    compute_range_by_timestamp,
};

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    init_telemetry()?;

    let stdout = io::stdout().lock();
    let mut out = BufWriter::new(stdout);
    match args.command {
        Command::Key(args) => issue_keys(&mut out, KeyConfig::try_from(args)?)?,
        Command::Decode(args) => decode_keys(&mut out, &args)?,
        Command::Range(args) => print_range(&mut out, &RangeConfig::try_from(args)?)?,
        Command::Limits(args) => print_limits(&mut out, &args)?,
    }
    out.flush()?;
    Ok(())
}

#[cfg(unix)]
fn issue_keys(out: &mut impl Write, config: KeyConfig) -> anyhow::Result<()> {
    use crate::config::NodeSource;
    use yauid::{Generator, RetryPolicy};

    tracing::debug!(?config, "issuing keys");

    let mut generator = match &config.node {
        NodeSource::Id(id) => Generator::open(&config.state_file, None)?.with_node_id(*id)?,
        NodeSource::File(path) => Generator::open(&config.state_file, Some(path.as_path()))
            .with_context(|| format!("can't load node id from {}", path.display()))?,
    }
    .with_retry_policy(RetryPolicy::new(config.retry_sleep, config.max_attempts));
    generator.set_sync_writes(config.sync);

    for issued in 0..config.count {
        let key = if config.once {
            generator.get_key_once()
        } else {
            generator.get_key()
        }
        .with_context(|| {
            format!(
                "{} (code {}) after {issued} of {} keys",
                generator.last_error(),
                u32::from(generator.last_error()),
                config.count
            )
        })?;

        if config.decode {
            write_decoded(out, key)?;
        } else {
            writeln!(out, "{key}")?;
        }
    }

    generator.close();
    Ok(())
}

#[cfg(not(unix))]
fn issue_keys(_out: &mut impl Write, _config: KeyConfig) -> anyhow::Result<()> {
    anyhow::bail!("issuing keys requires flock and is only supported on Unix platforms");
}

#[derive(Serialize)]
struct Decoded {
    key: Key,
    timestamp: u64,
    node_id: u64,
    sequence: u64,
}

impl From<Key> for Decoded {
    fn from(key: Key) -> Self {
        Self {
            key,
            timestamp: key.timestamp(),
            node_id: key.node_id(),
            sequence: key.sequence(),
        }
    }
}

fn write_decoded(out: &mut impl Write, key: Key) -> io::Result<()> {
    writeln!(
        out,
        "{key}\t{}\t{}\t{}",
        key.timestamp(),
        key.node_id(),
        key.sequence()
    )
}

fn decode_keys(out: &mut impl Write, args: &DecodeArgs) -> anyhow::Result<()> {
    for key in args.keys.iter().copied().map(Key::from_raw) {
        if args.json {
            serde_json::to_writer(&mut *out, &Decoded::from(key))?;
            writeln!(out)?;
        } else {
            write_decoded(out, key)?;
        }
    }
    Ok(())
}

fn print_range(out: &mut impl Write, config: &RangeConfig) -> anyhow::Result<()> {
    let range = match &config.window {
        Window::Timestamps { from, to } => {
            compute_range_by_timestamp(*from, *to, config.from_node, config.to_node)
        }
        Window::Datetimes { from, to } => {
            compute_range_by_datetime(from, to.as_deref(), config.from_node, config.to_node)
        }
    };

    if !range.is_valid() {
        tracing::warn!(
            min = %range.min,
            max = %range.max,
            "window or node ids don't fit the key layout"
        );
    }

    if config.json {
        serde_json::to_writer(&mut *out, &range)?;
        writeln!(out)?;
    } else {
        writeln!(out, "min\t{}", range.min)?;
        writeln!(out, "max\t{}", range.max)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct Limits {
    timestamp_bits: u32,
    node_id_bits: u32,
    sequence_bits: u32,
    max_timestamp: u64,
    min_node_id: u64,
    max_node_id: u64,
    max_sequence: u64,
}

fn print_limits(out: &mut impl Write, args: &LimitsArgs) -> anyhow::Result<()> {
    let limits = Limits {
        timestamp_bits: TIMESTAMP_BITS,
        node_id_bits: NODE_ID_BITS,
        sequence_bits: SEQUENCE_BITS,
        max_timestamp: Key::max_timestamp(),
        min_node_id: Key::min_node_id(),
        max_node_id: Key::max_node_id(),
        max_sequence: Key::max_sequence(),
    };

    if args.json {
        serde_json::to_writer(&mut *out, &limits)?;
        writeln!(out)?;
    } else {
        writeln!(out, "timestamp_bits\t{}", limits.timestamp_bits)?;
        writeln!(out, "node_id_bits\t{}", limits.node_id_bits)?;
        writeln!(out, "sequence_bits\t{}", limits.sequence_bits)?;
        writeln!(out, "max_timestamp\t{}", limits.max_timestamp)?;
        writeln!(out, "min_node_id\t{}", limits.min_node_id)?;
        writeln!(out, "max_node_id\t{}", limits.max_node_id)?;
        writeln!(out, "max_sequence\t{}", limits.max_sequence)?;
    }
    Ok(())
}
