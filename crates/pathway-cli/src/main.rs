//! pathway CLI
//!
//! Command-line host for the pathway navigation engine: validates task
//! definitions and walks them with scripted answers.

mod args;
mod cli;
mod renderer;

use anyhow::Result;
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::info;
use renderer::TerminalRenderer;
use Commands::*;

fn main() -> Result<()> {
    env_logger::init();

    let Args {
        no_color,
        json,
        command,
    } = Args::parse();

    let cli = Cli::new(TerminalRenderer::new(!no_color), json);

    info!("pathway started");

    match command {
        Validate(args) => cli.validate(args),
        Walk(args) => cli.walk(args),
        Next(args) => cli.next(args),
    }
}
