use super::{cli_manager, command::Command};
use anyhow::Result;
use clap::{App, AppSettings, ArgMatches, SubCommand};

const CMD_NAME: &str = "backends";

const BACKENDS: [(&str, &str); 2] = [
    (
        "cadical",
        "embedded CaDiCaL solver (default); conflicts are read from failed assumptions",
    ),
    (
        "external",
        "any DIMACS solver given by --external-sat-solver; conflicts are found by removing constraints one by one",
    ),
];

pub(crate) struct BackendsCommand;

impl BackendsCommand {
    pub(crate) fn new() -> Self {
        BackendsCommand
    }
}

impl<'a> Command<'a> for BackendsCommand {
    fn name(&self) -> &str {
        CMD_NAME
    }

    fn clap_subcommand(&self) -> App<'a, 'a> {
        SubCommand::with_name(CMD_NAME)
            .about("Displays the available SAT solver backends")
            .setting(AppSettings::DisableVersion)
            .arg(cli_manager::logging_level_cli_arg())
    }

    fn execute(&self, _arg_matches: &ArgMatches<'_>) -> Result<()> {
        BACKENDS
            .iter()
            .for_each(|(name, description)| println!("{}: {}", name, description));
        Ok(())
    }
}
