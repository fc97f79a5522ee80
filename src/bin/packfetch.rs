mod cli;
use async_compat::Compat;
use clap::Parser;
use cli::Cli;

fn main() -> anyhow::Result<()> {
    smol::block_on(Compat::new(Cli::parse().exec()))
}
