//! gtv CLI - hash, inspect, prove and verify values from the command line
//!
//! Input documents are JSON; scalars are encoded with the tagged leaf
//! encoder. Every command prints a JSON object on stdout, logs go to stderr
//! (`RUST_LOG=gtv_merkle=debug` for detail).

use clap::{Parser, Subcommand};
use gtv_merkle::{
    BinaryTree, Config, Disclosure, Hash, HashAlgorithm, HashEngine, Path as GtvPath, Proof,
    TaggedEncoder, TreeBuilder, Value, PROOF_MAGIC,
};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gtv")]
#[command(about = "Canonical Merkle hashing and selective disclosure proofs")]
#[command(version)]
struct Cli {
    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Digest algorithm (overrides config and environment)
    #[arg(short, long)]
    algorithm: Option<HashAlgorithm>,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the root digest of a JSON document
    Hash {
        /// Input file, or - for stdin
        input: String,
    },

    /// Show the shape of the tree built from a JSON document
    Tree {
        /// Input file, or - for stdin
        input: String,
    },

    /// Build a disclosure proof revealing the given paths
    Prove {
        /// Input file, or - for stdin
        input: String,
        /// Path to disclose, e.g. users[2].name (repeatable)
        #[arg(short, long = "path")]
        paths: Vec<String>,
        /// Write a binary proof here instead of printing JSON
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Verify a proof against an expected root digest
    Verify {
        /// Proof file (binary or JSON)
        proof: PathBuf,
        /// Expected root digest in hex
        #[arg(short, long)]
        root: String,
        /// Disclosed leaves to print (repeatable)
        #[arg(short, long = "path")]
        paths: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let engine = HashEngine::new(config.hash_algorithm.digester());

    match cli.command {
        Commands::Hash { input } => {
            let tree = build_tree(&input)?;
            let root = engine.root_hash(&tree)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "algorithm": config.hash_algorithm.name(),
                    "root": root.to_hex()
                }),
            );
        }

        Commands::Tree { input } => {
            let tree = build_tree(&input)?;
            let root = engine.root_hash(&tree)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "root": root.to_hex(),
                    "shape": tree.shape(),
                    "max_level": tree.max_level(),
                    "nodes": tree.node_count(),
                    "leaves": tree.leaf_count()
                }),
            );
        }

        Commands::Prove { input, paths, out } => {
            let tree = build_tree(&input)?;
            let paths = paths
                .iter()
                .map(|p| GtvPath::parse(p))
                .collect::<gtv_merkle::Result<Vec<_>>>()?;
            let disclosure = Disclosure::from_paths(&tree, &paths)?;
            let proof = Proof::build(&tree, &disclosure, &engine)?;

            match out {
                Some(out) => {
                    let blob = proof.to_bytes()?;
                    std::fs::write(&out, &blob)?;
                    output(
                        &cli.format,
                        &serde_json::json!({
                            "status": "ok",
                            "root": proof.root().to_hex(),
                            "pruned": proof.pruned().len(),
                            "disclosed_leaves": proof.disclosed_leaves().count(),
                            "bytes": blob.len(),
                            "out": out.display().to_string()
                        }),
                    );
                }
                None => output(&cli.format, &serde_json::to_value(&proof)?),
            }
        }

        Commands::Verify { proof, root, paths } => {
            let expected = Hash::from_hex(&root)
                .map_err(|_| anyhow::anyhow!("Invalid root digest: {}", root))?;
            let proof = read_proof(&proof)?;

            if let Err(e) = proof.verify(&engine, &expected) {
                output(
                    &cli.format,
                    &serde_json::json!({
                        "status": "error",
                        "valid": false,
                        "message": e.to_string()
                    }),
                );
                std::process::exit(1);
            }

            let mut leaves = serde_json::Map::new();
            for raw in &paths {
                let path = GtvPath::parse(raw)?;
                let leaf = proof.leaf_at(&path)?;
                leaves.insert(
                    raw.clone(),
                    leaf.map(|b| serde_json::Value::String(hex::encode(b)))
                        .unwrap_or(serde_json::Value::Null),
                );
            }
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "valid": true,
                    "root": expected.to_hex(),
                    "leaves": leaves
                }),
            );
        }
    }

    Ok(())
}

/// Config file (if any), then environment, then command-line flags
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.apply_env()?;
    if let Some(algorithm) = cli.algorithm {
        config.hash_algorithm = algorithm;
    }
    Ok(config)
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(input)?)
    }
}

fn build_tree(input: &str) -> anyhow::Result<BinaryTree> {
    let json: serde_json::Value = serde_json::from_str(&read_input(input)?)?;
    let value = Value::from_json(&json, &TaggedEncoder)?;
    Ok(TreeBuilder::new().build(&value)?)
}

/// Binary blobs start with the proof magic; anything else is read as JSON
fn read_proof(path: &PathBuf) -> anyhow::Result<Proof> {
    let data = std::fs::read(path)?;
    if data.starts_with(PROOF_MAGIC) {
        Ok(Proof::from_bytes(&data)?)
    } else {
        Ok(serde_json::from_slice(&data)?)
    }
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(value),
        OutputFormat::Text => serde_json::to_string_pretty(value),
    };
    match rendered {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("failed to render output: {}", e),
    }
}

