use super::{cli_manager, command::Command, common};
use anyhow::{anyhow, Context, Result};
use clap::{App, AppSettings, ArgMatches, SubCommand};
use log::debug;
use tabula::TimetableEngine;

const CMD_NAME: &str = "check";

pub(crate) struct CheckCommand;

impl CheckCommand {
    pub(crate) fn new() -> Self {
        CheckCommand
    }
}

impl<'a> Command<'a> for CheckCommand {
    fn name(&self) -> &str {
        CMD_NAME
    }

    fn clap_subcommand(&self) -> App<'a, 'a> {
        SubCommand::with_name(CMD_NAME)
            .about("Checks a configuration snapshot for errors")
            .setting(AppSettings::DisableVersion)
            .arg(common::input_args())
            .arg(common::format_arg())
            .arg(cli_manager::logging_level_cli_arg())
    }

    fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()> {
        let file = arg_matches
            .value_of(common::ARG_INPUT)
            .ok_or_else(|| anyhow!("missing input file"))?;
        let snapshot = common::read_snapshot(file)?;
        match TimetableEngine::new().check(&snapshot) {
            Ok(domain) => {
                for learner in domain.learners() {
                    for subject in learner.subjects.iter() {
                        debug!(
                            "{} may get {} from {:?}",
                            learner.name,
                            domain.subject_name(*subject),
                            domain.eligible_teachers(learner, *subject)
                        );
                    }
                }
                println!(
                    "VALID CONFIGURATION with {} learner(s), {} candidate placement(s) and {} warning(s)",
                    domain.learners().len(),
                    domain.candidates().len(),
                    domain.warnings().len()
                );
                Ok(())
            }
            Err(errors) => {
                common::create_result_writer(arg_matches)
                    .write_configuration_errors(&mut std::io::stdout(), &errors)?;
                Err(errors).context("the configuration is invalid")
            }
        }
    }
}
