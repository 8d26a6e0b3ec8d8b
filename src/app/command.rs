use anyhow::Result;
use clap::{App, ArgMatches};

/// A subcommand of the app.
///
/// Each command declares its own CLI arguments and executes itself once clap has matched them.
/// Command names must be unique.
pub(crate) trait Command<'a> {
    /// Returns the name of the command, as typed on the command line.
    fn name(&self) -> &str;

    /// Returns the clap subcommand describing the arguments of this command.
    fn clap_subcommand(&self) -> App<'a, 'a>;

    /// Executes the command.
    ///
    /// An error makes the app exit with a failure status code.
    fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()>;
}
