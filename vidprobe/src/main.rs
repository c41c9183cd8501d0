use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    args.init_logging();
    args.run()
}
