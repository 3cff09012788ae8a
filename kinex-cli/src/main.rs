mod analysis;
mod cli;
mod config;
mod logging;

use std::io::Write;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Section};
use crate::config::KinexConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing();

    let config = KinexConfig::load(cli.config.as_deref())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for section in Section::selected(cli.only) {
        let _span = tracing::info_span!("section", name = ?section).entered();
        match section {
            Section::Mantel => {
                analysis::run_mantel(&config, &mut out)?;
            }
            Section::Ordinal => {
                analysis::run_ordinal(&config, &mut out)?;
            }
            Section::Poisson => {
                analysis::run_poisson(&config, &mut out)?;
            }
            Section::Network => {
                analysis::run_network(&config, &mut out)?;
            }
        }
        out.flush()?;
    }
    Ok(())
}
