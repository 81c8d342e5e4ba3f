use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for duskfall")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// fmt, clippy, tests, then the determinism check
    Check,
    /// Run all tests
    Test,
    /// Run the same scripted session twice and compare state hashes
    Determinism {
        #[arg(long, default_value = "1800")]
        frames: u64,
        #[arg(long, default_value = "7")]
        seed: u64,
    },
    /// Launch the desktop game in release mode
    Play,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            cargo("fmt", &["fmt", "--all", "--", "--check"])?;
            cargo(
                "clippy",
                &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
            )?;
            cargo("test", &["test", "--workspace"])?;
            determinism(1800, 7)?;
        }
        Commands::Test => cargo("test", &["test", "--workspace"])?,
        Commands::Determinism { frames, seed } => determinism(frames, seed)?,
        Commands::Play => cargo("play", &["run", "--release", "-p", "duskfall-desktop"])?,
    }

    Ok(())
}

fn cargo(label: &str, args: &[&str]) -> Result<()> {
    println!("==> cargo {label}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        bail!("cargo {label} failed");
    }
    Ok(())
}

/// Last line of `duskfall-cli simulate` is `state hash: <hex>`.
fn simulated_hash(frames: u64, seed: u64) -> Result<String> {
    let output = Command::new("cargo")
        .args(["run", "--quiet", "-p", "duskfall-cli", "--", "simulate"])
        .args(["--frames", &frames.to_string(), "--seed", &seed.to_string()])
        .output()?;
    if !output.status.success() {
        bail!("simulate failed: {}", String::from_utf8_lossy(&output.stderr));
    }
    let stdout = String::from_utf8(output.stdout)?;
    stdout
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix("state hash: "))
        .map(str::to_owned)
        .context("simulate printed no state hash")
}

fn determinism(frames: u64, seed: u64) -> Result<()> {
    println!("==> determinism: seed={seed}, frames={frames}");
    let first = simulated_hash(frames, seed)?;
    let second = simulated_hash(frames, seed)?;
    if first != second {
        bail!("runs diverged: {first} != {second}");
    }
    println!("    hash {first} reproduced");
    Ok(())
}
