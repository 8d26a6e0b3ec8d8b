use super::{cli_manager, command::Command};
use anyhow::{Context, Result};
use clap::{App, AppSettings, ArgMatches, SubCommand};
use std::io::{self, Write};

const CMD_NAME: &str = "authors";

/// Prints the version of the app, its authors and its license.
pub(crate) struct AuthorsCommand<'a> {
    app_name: &'a str,
    app_version: &'a str,
    authors: &'a str,
}

impl<'a> AuthorsCommand<'a> {
    pub(crate) fn new(app_name: &'a str, app_version: &'a str, authors: &'a str) -> Self {
        AuthorsCommand {
            app_name,
            app_version,
            authors,
        }
    }

    fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{} {}", self.app_name, self.app_version)?;
        for author in self.authors.split(':').filter(|a| !a.is_empty()) {
            writeln!(out, "  {}", author.trim())?;
        }
        if let Some(license) = option_env!("CARGO_PKG_LICENSE") {
            writeln!(out, "license: {}", license)?;
        }
        out.flush()
    }
}

impl<'a> Command<'a> for AuthorsCommand<'a> {
    fn name(&self) -> &str {
        CMD_NAME
    }

    fn clap_subcommand(&self) -> App<'a, 'a> {
        SubCommand::with_name(CMD_NAME)
            .about("Displays the version, the authors and the license of the app")
            .setting(AppSettings::DisableVersion)
            .arg(cli_manager::logging_level_cli_arg())
    }

    fn execute(&self, _arg_matches: &ArgMatches<'_>) -> Result<()> {
        self.write_to(&mut io::stdout().lock())
            .context("while writing the authors")
    }
}
