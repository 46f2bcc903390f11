//! Dreamer RL demos
//!
//! ```bash
//! # Greedy episode of an untrained latent player on a corridor
//! cargo run --release -- greedy-eval
//!
//! # Same, stopping after the first step
//! cargo run --release -- greedy-eval --dry-run
//!
//! # Lambda returns over an imagined trajectory
//! cargo run --release -- lambda-returns
//!
//! # Arena engine settings after resolution
//! cargo run --release -- arena-settings
//! ```

mod arena_settings;
mod corridor;
mod greedy_eval;
mod lambda_returns;
mod latent_player;

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "greedy-eval" => greedy_eval::run(args.iter().any(|a| a == "--dry-run")),
            "lambda-returns" => lambda_returns::run(),
            "arena-settings" => arena_settings::run(),
            _ => {
                println!("Unknown demo: {}", args[1]);
                println!();
                print_usage();
            }
        }
    } else {
        print_usage();
    }
}

fn print_usage() {
    println!("Dreamer RL demos");
    println!();
    println!("Usage: cargo run --release -- <demo>");
    println!();
    println!("Demos:");
    println!("  greedy-eval [--dry-run]  Greedy episode of a latent player on a corridor");
    println!("  lambda-returns           Lambda returns over an imagined trajectory");
    println!("  arena-settings           Arena engine settings after resolution");
}
