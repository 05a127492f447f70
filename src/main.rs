use clap::Parser;
use tradelang::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
