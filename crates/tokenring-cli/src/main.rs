//! `tokenring` — inspect a consistent hashing ring.
//!
//! Builds a ring from a TOML config and/or command-line nodes and answers
//! placement questions about it.
//!
//! # Usage
//!
//! ```text
//! tokenring -c ring.toml lookup user:42 user:43     # owner of each key
//! tokenring --node a --node b ranges               # token ranges per node
//! tokenring -c ring.toml ranges --of 10.0.0.1      # ranges of one node
//! tokenring -c ring.toml distribution -n 50000     # random-key load spread
//! tokenring -c ring.toml transfers --add 10.0.0.3  # ranges that would move
//! ```

mod config;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokenring_placement::{Ring, Transfer, token_for};
use tracing::{debug, info};

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "tokenring",
    version,
    about = "Consistent hashing ring inspector"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true, env = "TOKENRING_CONFIG")]
    config: Option<PathBuf>,

    /// Override the number of vnodes per node.
    #[arg(long, global = true)]
    vnodes: Option<usize>,

    /// Node address to place on the ring (replaces configured nodes).
    ///
    /// Can be specified multiple times.
    #[arg(long = "node", global = true)]
    nodes: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the owning node and token of each key.
    Lookup {
        /// Keys to look up.
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Show the token ranges owned by each node.
    Ranges {
        /// Only show ranges of this node.
        #[arg(long = "of")]
        of: Option<String>,
    },

    /// Spread random keys over the ring and report each node's share.
    Distribution {
        /// Number of random keys.
        #[arg(short = 'n', long, default_value = "50000")]
        count: usize,

        /// Seed for the key generator (random if omitted).
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show the token ranges that change owner when a node joins or leaves.
    Transfers {
        /// Node that joins the ring.
        #[arg(long, conflicts_with = "remove", required_unless_present = "remove")]
        add: Option<String>,

        /// Node that leaves the ring.
        #[arg(long)]
        remove: Option<String>,
    },
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    // CLI args override config file values.
    if let Some(vnodes) = cli.vnodes {
        config.ring.vnodes_per_node = vnodes;
    }
    if !cli.nodes.is_empty() {
        config.ring.nodes = cli.nodes;
    }
    if config.ring.nodes.is_empty() {
        bail!("no nodes configured: pass --node or set `nodes` in the [ring] section");
    }

    let ring = Ring::from_config(&config.ring).context("failed to build ring")?;
    info!(
        nodes = ring.node_count(),
        vnodes = ring.vnode_count(),
        "ring built"
    );

    match cli.command {
        Commands::Lookup { keys } => cmd_lookup(&ring, &keys),
        Commands::Ranges { of } => cmd_ranges(&ring, of.as_deref()),
        Commands::Distribution { count, seed } => {
            cmd_distribution(&ring, count, seed.unwrap_or_else(rand::random))
        }
        Commands::Transfers { add, remove } => cmd_transfers(&ring, add, remove),
    }
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
/// Logs go to stderr so command output stays clean.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// -----------------------------------------------------------------------
// tokenring lookup
// -----------------------------------------------------------------------

fn cmd_lookup(ring: &Ring, keys: &[String]) -> Result<()> {
    for key in keys {
        let node = ring.lookup(key)?;
        println!("{key}\t{node}\t(token {})", token_for(key));
    }
    Ok(())
}

// -----------------------------------------------------------------------
// tokenring ranges
// -----------------------------------------------------------------------

fn cmd_ranges(ring: &Ring, of: Option<&str>) -> Result<()> {
    let ranges = match of {
        Some(node) => {
            if !ring.contains_node(node) {
                bail!("node {node} is not on the ring");
            }
            BTreeMap::from([(node.to_string(), ring.token_ranges_for_node(node))])
        }
        None => ring.token_ranges_for_all_nodes(),
    };

    for (node, ranges) in &ranges {
        let owned: u64 = ranges.iter().map(|r| r.len()).sum();
        println!(
            "{node}: {} ranges, {:.2}% of token space",
            ranges.len(),
            percent(owned, 1u64 << 32)
        );
        for range in ranges {
            println!("  {range}");
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------
// tokenring distribution
// -----------------------------------------------------------------------

fn cmd_distribution(ring: &Ring, count: usize, seed: u64) -> Result<()> {
    debug!(count, seed, "generating random keys");
    let counts = distribution(ring, count, seed)?;

    println!("Key distribution");
    println!("  keys:   {count}");
    println!("  seed:   {seed}");
    println!("  vnodes: {} per node", ring.vnodes_per_node());
    println!();
    for (node, hits) in &counts {
        let share = percent(*hits as u64, count as u64);
        println!("  {node:<24} {hits:>8}  {share:>6.2}%");
    }
    Ok(())
}

/// Count how many of `count` random alphanumeric keys land on each node.
///
/// Key lengths cycle through 0..50. Every node appears in the result, even
/// with a count of zero.
fn distribution(ring: &Ring, count: usize, seed: u64) -> Result<BTreeMap<String, usize>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut counts: BTreeMap<String, usize> = ring.nodes().map(|n| (n.to_string(), 0)).collect();

    for i in 0..count {
        let key: String = (&mut rng)
            .sample_iter(Alphanumeric)
            .take(i % 50)
            .map(char::from)
            .collect();
        let node = ring.lookup(&key)?;
        *counts.entry(node.to_string()).or_default() += 1;
    }

    Ok(counts)
}

// -----------------------------------------------------------------------
// tokenring transfers
// -----------------------------------------------------------------------

fn cmd_transfers(ring: &Ring, add: Option<String>, remove: Option<String>) -> Result<()> {
    let transfers = plan_transfers(ring, add, remove)?;

    if transfers.is_empty() {
        println!("No ranges change owner.");
        return Ok(());
    }

    let moved: u64 = transfers.iter().map(|t| t.range.len()).sum();
    for t in &transfers {
        println!("{}\t{} -> {}", t.range, t.from, t.to);
    }
    println!();
    println!(
        "{} ranges, {:.2}% of token space changes owner",
        transfers.len(),
        percent(moved, 1u64 << 32)
    );
    Ok(())
}

/// Diff `ring` against a copy with `add` joined or `remove` departed.
fn plan_transfers(
    ring: &Ring,
    add: Option<String>,
    remove: Option<String>,
) -> Result<Vec<Transfer>> {
    let mut next = ring.clone();
    match (add, remove) {
        (Some(node), None) => {
            if ring.contains_node(&node) {
                bail!("node {node} is already on the ring");
            }
            next.add_node(node);
        }
        (None, Some(node)) => {
            if !ring.contains_node(&node) {
                bail!("node {node} is not on the ring");
            }
            next.remove_node(&node);
        }
        _ => bail!("exactly one of --add or --remove is required"),
    }
    Ok(Ring::diff(ring, &next))
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / whole as f64
}
