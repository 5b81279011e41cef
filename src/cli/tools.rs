//! Tools subcommand implementation.

use crate::error::CliResult;
use crate::tools::{find_in_path, KNOWN_TOOLS};
use clap::Parser;
use console::style;

/// Report which deep-scan tools are installed.
#[derive(Parser, Debug)]
pub struct ToolsCommand {}

impl ToolsCommand {
    /// Execute the tools command.
    pub fn execute(&self) -> CliResult<()> {
        for tool in KNOWN_TOOLS {
            match find_in_path(tool) {
                Some(path) => println!(
                    "  {:<8} {} {}",
                    tool,
                    style("found").green().bold(),
                    style(path.display()).dim()
                ),
                None => println!("  {:<8} {}", tool, style("missing").red()),
            }
        }
        Ok(())
    }
}
