//! `help-all`: every command's help text in one document.

use anyhow::Result;
use clap::{builder::StyledStr, Command, CommandFactory, Parser};

/// Prints help for every command and subcommand.
#[derive(Parser)]
pub struct HelpCommand {}

/// Walks the clap command tree and renders each node's help.
pub struct HelpGenerator {
    app: Command,
}

impl HelpGenerator {
    /// Creates a generator for the relnotes command tree.
    pub fn new() -> Self {
        Self {
            app: crate::cli::Cli::command(),
        }
    }

    /// Renders the top-level help followed by every subcommand, separated by rules.
    pub fn generate_all_help(&self) -> Result<String> {
        let mut sections = vec![self.render_command_help(&self.app, "")];
        self.collect_help_recursive(&self.app, "", &mut sections);

        let separator = format!("\n\n{}\n\n", "=".repeat(80));
        Ok(sections.join(&separator))
    }

    /// Appends help for each subcommand of `cmd`, depth first.
    ///
    /// Subcommands are visited in name order so the output is stable.
    fn collect_help_recursive(&self, cmd: &Command, prefix: &str, sections: &mut Vec<String>) {
        let mut subcommands: Vec<_> = cmd.get_subcommands().collect();
        subcommands.sort_by(|a, b| a.get_name().cmp(b.get_name()));

        for subcmd in subcommands.into_iter().filter(|c| c.get_name() != "help") {
            let path = if prefix.is_empty() {
                subcmd.get_name().to_string()
            } else {
                format!("{prefix} {}", subcmd.get_name())
            };

            sections.push(self.render_command_help(subcmd, &path));
            self.collect_help_recursive(subcmd, &path, sections);
        }
    }

    fn render_command_help(&self, cmd: &Command, path: &str) -> String {
        let name = if path.is_empty() {
            cmd.get_name().to_string()
        } else {
            format!("relnotes {path}")
        };
        let about = cmd
            .get_about()
            .map_or_else(|| "No description available".to_string(), StyledStr::to_string);

        format!("{name} - {about}\n\n{}", cmd.clone().render_help())
    }
}

impl Default for HelpGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpCommand {
    /// Executes the help-all command.
    pub fn execute(self) -> Result<()> {
        println!("{}", HelpGenerator::new().generate_all_help()?);
        Ok(())
    }
}
