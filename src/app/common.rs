use super::{
    app_helper::AppHelper, command::Command, AuthorsCommand, BackendsCommand, CheckCommand,
    SolveCommand,
};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Arg, ArgMatches};
use log::{debug, info};
use std::{
    fs::{self, File},
    io::{BufReader, Read},
    path::PathBuf,
    time::Duration,
};
use tabula::{
    io::{JsonResultWriter, JsonSnapshotReader, ResultWriter, SnapshotReader, TextResultWriter},
    sat::{
        DefaultSatSolverFactory, ExternalSatSolverFactory, SatSolverFactory, SolvingListener,
        SolvingResult,
    },
    ConfigurationSnapshot, TimetableEngine,
};

pub(crate) fn create_app_helper() -> AppHelper<'static> {
    let app_name = option_env!("CARGO_PKG_NAME").unwrap_or("unknown app name");
    let app_version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown version");
    let authors = option_env!("CARGO_PKG_AUTHORS").unwrap_or("unknown authors");
    let mut app = AppHelper::new(
        app_name,
        app_version,
        authors,
        "Tabula, a SAT-based daily timetable solver.",
    );
    let commands: Vec<Box<dyn Command>> = vec![
        Box::new(AuthorsCommand::new(app_name, app_version, authors)),
        Box::new(BackendsCommand::new()),
        Box::new(CheckCommand::new()),
        Box::new(SolveCommand::new()),
    ];
    for c in commands {
        app.add_command(c);
    }
    app
}

pub(crate) const ARG_INPUT: &str = "INPUT";

pub(crate) fn input_args() -> Arg<'static, 'static> {
    Arg::with_name(ARG_INPUT)
        .short("f")
        .long("input")
        .empty_values(false)
        .multiple(false)
        .help("the JSON file that contains the configuration snapshot")
        .required(true)
}

pub(crate) const ARG_FORMAT: &str = "FORMAT";

pub(crate) fn format_arg() -> Arg<'static, 'static> {
    Arg::with_name(ARG_FORMAT)
        .long("format")
        .empty_values(false)
        .multiple(false)
        .possible_values(&["text", "json"])
        .default_value("text")
        .help("the format of the output")
        .required(false)
}

pub(crate) fn create_result_writer(arg_matches: &ArgMatches<'_>) -> Box<dyn ResultWriter> {
    match arg_matches.value_of(ARG_FORMAT) {
        Some("json") => Box::<JsonResultWriter>::default(),
        _ => Box::<TextResultWriter>::default(),
    }
}

pub(crate) fn read_snapshot(file_path: &str) -> Result<ConfigurationSnapshot> {
    let snapshot = read_file_path_with(file_path, &|r| JsonSnapshotReader::default().read(r))?;
    info!(
        "the configuration has {} teacher(s), {} student(s), {} group(s) and {} fixed assignment(s)",
        snapshot.teachers.len(),
        snapshot.students.len(),
        snapshot.groups.len(),
        snapshot.fixed_assignments.len()
    );
    Ok(snapshot)
}

pub(crate) fn read_file_path_with<F, R>(file_path: &str, reader: &F) -> Result<R>
where
    F: Fn(&mut dyn Read) -> Result<R>,
{
    let canonicalized = canonicalize_file_path(file_path)?;
    info!("reading input file {:?}", canonicalized);
    let mut file_reader = BufReader::new(
        File::open(&canonicalized)
            .with_context(|| format!("while opening file {:?}", canonicalized))?,
    );
    (reader)(&mut file_reader)
}

/// Canonicalize a path given by the user.
pub(crate) fn canonicalize_file_path(file_path: &str) -> Result<PathBuf> {
    fs::canonicalize(PathBuf::from(file_path))
        .with_context(|| format!(r#"while opening file "{}""#, file_path))
}

pub(crate) const ARG_DATE: &str = "DATE";

pub(crate) fn date_arg() -> Arg<'static, 'static> {
    Arg::with_name(ARG_DATE)
        .long("date")
        .empty_values(false)
        .multiple(false)
        .help("the day of the timetable (YYYY-MM-DD); today if missing")
        .required(false)
}

pub(crate) fn read_date(arg_matches: &ArgMatches<'_>) -> Result<NaiveDate> {
    match arg_matches.value_of(ARG_DATE) {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .with_context(|| format!(r#"while parsing date "{}""#, d)),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

pub(crate) const ARG_TIME_LIMIT: &str = "TIME_LIMIT";

pub(crate) fn time_limit_arg() -> Arg<'static, 'static> {
    Arg::with_name(ARG_TIME_LIMIT)
        .long("time-limit")
        .empty_values(false)
        .multiple(false)
        .help("the time limit of the solver in seconds, overriding the one of the configuration")
        .required(false)
}

pub(crate) fn read_time_limit(arg_matches: &ArgMatches<'_>) -> Result<Option<Duration>> {
    arg_matches
        .value_of(ARG_TIME_LIMIT)
        .map(|s| {
            let seconds = s
                .parse::<f64>()
                .with_context(|| format!(r#"while parsing time limit "{}""#, s))?;
            if !seconds.is_finite() || seconds < 0. {
                return Err(anyhow!("the time limit must be a non-negative number of seconds"));
            }
            Ok(Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX))
        })
        .transpose()
}

const ARG_EXTERNAL_SAT_SOLVER: &str = "EXTERNAL_SAT_SOLVER";
const ARG_EXTERNAL_SAT_SOLVER_OPTIONS: &str = "EXTERNAL_SAT_SOLVER_OPTIONS";

pub(crate) fn external_sat_solver_args() -> Vec<Arg<'static, 'static>> {
    vec![
        Arg::with_name(ARG_EXTERNAL_SAT_SOLVER)
            .long("external-sat-solver")
            .empty_values(false)
            .multiple(false)
            .help("a path to an external SAT solver to replace the embedded one")
            .required(false),
        Arg::with_name(ARG_EXTERNAL_SAT_SOLVER_OPTIONS)
            .long("external-sat-solver-opt")
            .requires(ARG_EXTERNAL_SAT_SOLVER)
            .empty_values(false)
            .multiple(true)
            .help("a option to give to the external SAT solver")
            .required(false),
    ]
}

pub(crate) fn create_sat_solver_factory(
    arg_matches: &ArgMatches<'_>,
) -> Result<Box<dyn SatSolverFactory>> {
    let external_solver_options = arg_matches
        .values_of(ARG_EXTERNAL_SAT_SOLVER_OPTIONS)
        .map(|v| v.map(|o| o.to_string()).collect::<Vec<String>>())
        .unwrap_or_default();
    if let Some(s) = arg_matches.value_of(ARG_EXTERNAL_SAT_SOLVER) {
        let path = canonicalize_file_path(s)?;
        info!("using {path:?} as SAT solver");
        let program = path
            .to_str()
            .ok_or_else(|| anyhow!("the path of the external SAT solver is not valid UTF-8"))?
            .to_string();
        let mut factory = ExternalSatSolverFactory::new(program, external_solver_options);
        factory.add_solver_listener(Box::new(|| {
            Box::<SatSolvingLogger>::default() as Box<dyn SolvingListener>
        }));
        Ok(Box::new(factory))
    } else {
        info!("using the default SAT solver");
        let mut factory = DefaultSatSolverFactory::default();
        factory.add_solver_listener(Box::new(|| {
            Box::<SatSolvingLogger>::default() as Box<dyn SolvingListener>
        }));
        Ok(Box::new(factory))
    }
}

pub(crate) fn create_engine(arg_matches: &ArgMatches<'_>) -> Result<TimetableEngine> {
    let mut engine =
        TimetableEngine::new_with_sat_solver_factory(create_sat_solver_factory(arg_matches)?);
    engine.set_time_limit(read_time_limit(arg_matches)?);
    Ok(engine)
}

#[derive(Default)]
struct SatSolvingLogger;

impl SolvingListener for SatSolvingLogger {
    fn solving_start(&self, n_vars: usize, n_clauses: usize) {
        debug!(
            "launching SAT solver on an instance with {} variables and {} clauses",
            n_vars, n_clauses
        );
    }

    fn solving_end(&self, result: &SolvingResult) {
        let r = match result {
            SolvingResult::Satisfiable(_) => "SAT",
            SolvingResult::Unsatisfiable => "UNSAT",
            SolvingResult::Unknown => "UNKNOWN",
        };
        debug!("SAT solver ended with result {}", r);
    }
}
