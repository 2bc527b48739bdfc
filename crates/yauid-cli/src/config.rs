use std::{path::PathBuf, time::Duration};

use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use yauid::Key;

/// Command-line interface of the `yauid` binary.
///
/// Options of `yauid key` can also come from environment variables, and a
/// `.env` file in the working directory is loaded first.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "yauid",
    version,
    about = "Issue, decode and range-query node-local 64-bit keys"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Issue keys from a shared state file, one per line.
    Key(KeyArgs),
    /// Split keys into timestamp, node id and sequence.
    Decode(DecodeArgs),
    /// Print the smallest and largest key of a time window.
    Range(RangeArgs),
    /// Print the key layout.
    Limits(LimitsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct KeyArgs {
    /// State file shared by every issuer on this node. Created if missing.
    ///
    /// Environment variable: `YAUID_STATE_FILE`
    #[arg(long, env = "YAUID_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Node id embedded in the keys.
    ///
    /// Environment variable: `YAUID_NODE_ID`
    #[arg(long, env = "YAUID_NODE_ID")]
    pub node_id: Option<u64>,

    /// File holding the node id; its decimal digits, in order, form the id.
    ///
    /// Environment variable: `YAUID_NODE_ID_FILE`
    #[arg(long, env = "YAUID_NODE_ID_FILE")]
    pub node_id_file: Option<PathBuf>,

    /// Number of keys to issue.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: u64,

    /// Pause between attempts while a second is exhausted, in microseconds.
    ///
    /// Environment variable: `YAUID_RETRY_SLEEP_US`
    #[arg(long, env = "YAUID_RETRY_SLEEP_US", default_value_t = 35_000)]
    pub retry_sleep_us: u64,

    /// Attempts before giving up on an exhausted second. 0 retries forever.
    ///
    /// Environment variable: `YAUID_MAX_ATTEMPTS`
    #[arg(long, env = "YAUID_MAX_ATTEMPTS", default_value_t = 0)]
    pub max_attempts: u32,

    /// Fail instead of waiting when the current second is exhausted.
    #[arg(long, default_value_t = false)]
    pub once: bool,

    /// Sync every key to the storage device before printing it.
    #[arg(long, default_value_t = false)]
    pub sync: bool,

    /// Print the decoded fields next to each key.
    #[arg(short, long, default_value_t = false)]
    pub decode: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DecodeArgs {
    /// Keys as unsigned decimal integers.
    #[arg(required = true)]
    pub keys: Vec<u64>,

    /// Print one JSON object per key.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RangeArgs {
    /// First second of the window, as a Unix timestamp.
    #[arg(long, conflicts_with = "from")]
    pub from_ts: Option<u64>,

    /// First second of the window, as a local `YYYY-MM-DD HH:MM:SS` datetime.
    #[arg(long)]
    pub from: Option<String>,

    /// Last second of the window, as a Unix timestamp. Defaults to the first.
    #[arg(long, conflicts_with = "to")]
    pub to_ts: Option<u64>,

    /// Last second of the window, as a local datetime. Defaults to the first.
    #[arg(long)]
    pub to: Option<String>,

    /// Lowest node id. Defaults to the smallest valid id.
    #[arg(long)]
    pub from_node: Option<u64>,

    /// Highest node id. Defaults to `--from-node` if given, otherwise to the
    /// largest valid id.
    #[arg(long)]
    pub to_node: Option<u64>,

    /// Print the range as a JSON object.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LimitsArgs {
    /// Print the limits as a JSON object.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Where the node id comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSource {
    Id(u64),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct KeyConfig {
    pub state_file: PathBuf,
    pub node: NodeSource,
    pub count: u64,
    pub retry_sleep: Duration,
    pub max_attempts: u32,
    pub once: bool,
    pub sync: bool,
    pub decode: bool,
}

impl TryFrom<KeyArgs> for KeyConfig {
    type Error = anyhow::Error;

    fn try_from(args: KeyArgs) -> Result<Self, Self::Error> {
        let Some(state_file) = args.state_file else {
            bail!("a state file is required (--state-file or YAUID_STATE_FILE)");
        };

        let node = match (args.node_id, args.node_id_file) {
            (Some(_), Some(_)) => {
                bail!("--node-id and --node-id-file are mutually exclusive")
            }
            (Some(id), None) => {
                if !(Key::min_node_id()..=Key::max_node_id()).contains(&id) {
                    bail!(
                        "node id {} is out of range ({}..={})",
                        id,
                        Key::min_node_id(),
                        Key::max_node_id()
                    );
                }
                NodeSource::Id(id)
            }
            (None, Some(path)) => NodeSource::File(path),
            (None, None) => {
                bail!("a node id is required (--node-id or --node-id-file)")
            }
        };

        if args.count == 0 {
            bail!("--count must be greater than 0");
        }

        Ok(Self {
            state_file,
            node,
            count: args.count,
            retry_sleep: Duration::from_micros(args.retry_sleep_us),
            max_attempts: args.max_attempts,
            once: args.once,
            sync: args.sync,
            decode: args.decode,
        })
    }
}

/// The window of a range query, in one unit throughout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Window {
    Timestamps { from: u64, to: Option<u64> },
    Datetimes { from: String, to: Option<String> },
}

#[derive(Debug, Clone)]
pub struct RangeConfig {
    pub window: Window,
    pub from_node: Option<u64>,
    pub to_node: Option<u64>,
    pub json: bool,
}

impl TryFrom<RangeArgs> for RangeConfig {
    type Error = anyhow::Error;

    fn try_from(args: RangeArgs) -> Result<Self, Self::Error> {
        let window = match (args.from_ts, args.from, args.to_ts, args.to) {
            (Some(0), ..) => bail!("--from-ts must be greater than 0"),
            (Some(from), None, to, None) => Window::Timestamps { from, to },
            (None, Some(from), None, to) => {
                for text in std::iter::once(&from).chain(to.as_ref()) {
                    if yauid::parse_datetime(text).is_none() {
                        bail!("invalid datetime {text:?}, expected YYYY-MM-DD HH:MM:SS");
                    }
                }
                Window::Datetimes { from, to }
            }
            (None, None, ..) => bail!("a window start is required (--from-ts or --from)"),
            _ => bail!("--from-ts/--to-ts and --from/--to can't be mixed"),
        };

        Ok(Self {
            window,
            from_node: args.from_node,
            to_node: args.to_node,
            json: args.json,
        })
    }
}
