//! A thin CLI shell over the engine (SPEC_FULL §6.5): validate an army file,
//! or run a battle to completion (or a step cap) and print the outcome.
//! Not part of the engine's determinism guarantees — it only drives
//! `Battle` through the public `step`/`winner`/`last_action` surface.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use hexbattle::{Battle, BattleError, BattleOptions, UnitSpec, Winner};

#[derive(Parser)]
#[command(name = "sim_cli", about = "Run or validate hexbattle scenarios")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a battle between two army files to completion (or a step cap).
    Run {
        p1: PathBuf,
        p2: PathBuf,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[arg(long)]
        max_steps: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// Parse an army file and report any construction errors.
    Validate { army: PathBuf },
}

fn load_specs(path: &PathBuf) -> Result<Vec<UnitSpec>, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("reading {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("parsing {}: {e}", path.display()))
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Validate { army } => match load_specs(&army) {
            Ok(specs) => {
                println!("{} unit spec(s) parsed successfully", specs.len());
                ExitCode::SUCCESS
            }
            Err(msg) => {
                eprintln!("invalid army file: {msg}");
                ExitCode::FAILURE
            }
        },
        Command::Run { p1, p2, seed, max_steps, json } => {
            let p1_specs = match load_specs(&p1) {
                Ok(s) => s,
                Err(msg) => {
                    eprintln!("{msg}");
                    return ExitCode::FAILURE;
                }
            };
            let p2_specs = match load_specs(&p2) {
                Ok(s) => s,
                Err(msg) => {
                    eprintln!("{msg}");
                    return ExitCode::FAILURE;
                }
            };

            let mut battle = match Battle::new(&p1_specs, &p2_specs, seed, BattleOptions::default()) {
                Ok(b) => b,
                Err(err) => {
                    eprintln!("construction failed: {}", describe(&err));
                    return ExitCode::FAILURE;
                }
            };

            let cap = max_steps.unwrap_or(50 * 60);
            let mut steps = 0u32;
            while battle.winner().is_none() && steps < cap {
                battle.step();
                steps += 1;
            }

            if json {
                let winner = match battle.winner() {
                    Some(Winner::Player1) => "1",
                    Some(Winner::Player2) => "2",
                    Some(Winner::Draw) => "0",
                    None => "null",
                };
                println!(
                    "{{\"winner\":{},\"round\":{},\"steps\":{}}}",
                    winner,
                    battle.round(),
                    steps
                );
            } else {
                match battle.winner() {
                    Some(Winner::Player1) => println!("winner: player 1 (after {steps} steps, round {})", battle.round()),
                    Some(Winner::Player2) => println!("winner: player 2 (after {steps} steps, round {})", battle.round()),
                    Some(Winner::Draw) => println!("draw by stalemate (after {steps} steps, round {})", battle.round()),
                    None => println!("no winner after {steps} steps (step cap reached)"),
                }
            }
            ExitCode::SUCCESS
        }
    }
}

fn describe(err: &BattleError) -> String {
    err.to_string()
}
