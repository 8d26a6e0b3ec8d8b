use super::{cli_manager, command::Command, common};
use anyhow::{anyhow, Context, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use log::info;
use tabula::{JsonFileLessonStore, SolveError};

const CMD_NAME: &str = "solve";

const ARG_OUTPUT_DIR: &str = "OUTPUT_DIR";

pub(crate) struct SolveCommand;

impl SolveCommand {
    pub(crate) fn new() -> Self {
        SolveCommand
    }
}

impl<'a> Command<'a> for SolveCommand {
    fn name(&self) -> &str {
        CMD_NAME
    }

    fn clap_subcommand(&self) -> App<'a, 'a> {
        SubCommand::with_name(CMD_NAME)
            .about("Computes the timetable of a day")
            .setting(AppSettings::DisableVersion)
            .arg(common::input_args())
            .arg(common::date_arg())
            .arg(common::time_limit_arg())
            .arg(common::format_arg())
            .arg(
                Arg::with_name(ARG_OUTPUT_DIR)
                    .short("o")
                    .long("output-dir")
                    .empty_values(false)
                    .multiple(false)
                    .help("a directory in which the lessons are committed as a JSON file")
                    .required(false),
            )
            .args(&common::external_sat_solver_args())
            .arg(cli_manager::logging_level_cli_arg())
    }

    fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()> {
        let file = arg_matches
            .value_of(common::ARG_INPUT)
            .ok_or_else(|| anyhow!("missing input file"))?;
        let snapshot = common::read_snapshot(file)?;
        let date = common::read_date(arg_matches)?;
        let engine = common::create_engine(arg_matches)?;
        let result = match arg_matches.value_of(ARG_OUTPUT_DIR) {
            Some(dir) => {
                info!("lessons will be committed in {:?}", dir);
                engine.solve_and_commit(date, &snapshot, &mut JsonFileLessonStore::new(dir))
            }
            None => engine.solve(date, &snapshot),
        };
        let writer = common::create_result_writer(arg_matches);
        let mut out = std::io::stdout();
        match result {
            Ok(r) => writer.write_result(&mut out, &r),
            Err(SolveError::Configuration(errors)) => {
                writer.write_configuration_errors(&mut out, &errors)?;
                Err(errors).context("the configuration is invalid")
            }
            Err(e) => Err(e.into()),
        }
    }
}
