use super::{app_helper::init_logger_with_level, command::Command, writable_string::WritableString};
use anyhow::{anyhow, Result};
use clap::{App, AppSettings, Arg};
use log::{info, LevelFilter};
use std::{ffi::OsString, str::FromStr};
use sysinfo::System;

/// Holds the commands of the app and dispatches the CLI arguments to them.
pub(crate) struct CliManager<'a> {
    app_name: &'a str,
    version: &'a str,
    author: &'a str,
    about: &'a str,
    commands: Vec<Box<dyn Command<'a>>>,
}

pub(crate) const APP_HELPER_LOGGING_LEVEL_ARG: &str = "APP_HELPER_LOGGING_LEVEL_ARG";

pub(crate) fn logging_level_cli_arg<'a>() -> Arg<'a, 'a> {
    Arg::with_name(APP_HELPER_LOGGING_LEVEL_ARG)
        .long("logging-level")
        .multiple(false)
        .default_value("info")
        .possible_values(&["trace", "debug", "info", "warn", "error", "off"])
        .help("set the minimal logging level")
}

impl<'a> CliManager<'a> {
    pub(crate) fn new(app_name: &'a str, version: &'a str, author: &'a str, about: &'a str) -> Self {
        CliManager {
            app_name,
            version,
            author,
            about,
            commands: vec![],
        }
    }

    pub(crate) fn add_command(&mut self, command: Box<dyn Command<'a>>) {
        self.commands.push(command);
    }

    fn clap_app(&self) -> App<'a, 'a> {
        let mut app = App::new(self.app_name)
            .global_setting(AppSettings::DisableVersion)
            .global_setting(AppSettings::VersionlessSubcommands)
            .setting(AppSettings::NeedsSubcommandHelp)
            .setting(AppSettings::SubcommandRequired)
            .version(self.version)
            .author(self.author)
            .about(self.about);
        for c in self.commands.iter() {
            app = app.subcommand(c.clap_subcommand());
        }
        app
    }

    pub(crate) fn parse_cli<I, T>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(|a| a.into()).collect();
        match self.clap_app().get_matches_from_safe(args.clone()) {
            Ok(matches) => {
                let (name, sub_matches) = matches.subcommand();
                let command = self
                    .commands
                    .iter()
                    .find(|c| c.name() == name)
                    .ok_or_else(|| anyhow!("no such command: {}", name))?;
                let sub_matches =
                    sub_matches.ok_or_else(|| anyhow!("missing arguments for {}", name))?;
                let log_level = sub_matches
                    .value_of(APP_HELPER_LOGGING_LEVEL_ARG)
                    .and_then(|l| LevelFilter::from_str(l).ok())
                    .unwrap_or(LevelFilter::Info);
                init_logger_with_level(log_level);
                info!("{} {}", self.app_name, self.version);
                sys_info();
                command.execute(sub_matches)
            }
            Err(clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            }) => {
                init_logger_with_level(LevelFilter::Info);
                self.print_help(&args);
                Ok(())
            }
            Err(e) => {
                init_logger_with_level(LevelFilter::Info);
                info!("{} {}", self.app_name, self.version);
                Err(anyhow!("{}", e))
            }
        }
    }

    fn print_help(&self, args: &[OsString]) {
        const HELP_STRINGS: [&str; 3] = ["help", "-h", "--help"];
        let words: Vec<String> = args
            .iter()
            .skip(1)
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        let requested = match words.as_slice() {
            [first, second, ..] if HELP_STRINGS.contains(&first.as_str()) => Some(second),
            [first, ..] if !HELP_STRINGS.contains(&first.as_str()) => Some(first),
            _ => None,
        };
        let mut message = WritableString::default();
        let written = match requested.and_then(|r| self.commands.iter().find(|c| c.name() == r.as_str())) {
            Some(c) => c.clap_subcommand().write_long_help(&mut message),
            None => self.clap_app().write_long_help(&mut message),
        };
        if written.is_ok() {
            message.to_string().split('\n').for_each(|s| info!("{}", s));
            info!("");
        }
    }
}

fn sys_info() {
    info!("----------------------------------------");
    let sys = System::new_all();
    let unknown = || "[unknown]".to_string();
    info!("running on {}", System::host_name().unwrap_or_else(unknown));
    info!(
        "OS is {} {} with kernel {}",
        System::name().unwrap_or_else(unknown),
        System::os_version().unwrap_or_else(unknown),
        System::kernel_version().unwrap_or_else(unknown)
    );
    let mut cpu_kinds: Vec<&str> = sys.cpus().iter().map(|c| c.brand()).collect();
    cpu_kinds.sort_unstable();
    cpu_kinds.dedup();
    info!(
        "physical core count: {} {:?}",
        sys.physical_core_count()
            .map(|n| n.to_string())
            .unwrap_or_else(unknown),
        cpu_kinds
    );
    info!("total memory: {} KB", sys.total_memory() / 1024);
    info!("----------------------------------------");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{ArgMatches, SubCommand};
    use std::{cell::RefCell, rc::Rc};

    struct LocalCommand {
        executed_with_flag: Rc<RefCell<Option<bool>>>,
    }

    impl<'a> Command<'a> for LocalCommand {
        fn name(&self) -> &str {
            "local"
        }

        fn clap_subcommand(&self) -> App<'a, 'a> {
            SubCommand::with_name("local")
                .arg(Arg::with_name("flag").short("a"))
                .arg(logging_level_cli_arg())
        }

        fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()> {
            *self.executed_with_flag.borrow_mut() = Some(arg_matches.is_present("flag"));
            Ok(())
        }
    }

    fn run(args: Vec<&'static str>) -> Result<Option<bool>> {
        let mut manager = CliManager::new("tabula", "0.0.0", "author", "about");
        let executed_with_flag = Rc::new(RefCell::new(None));
        manager.add_command(Box::new(LocalCommand {
            executed_with_flag: Rc::clone(&executed_with_flag),
        }));
        manager.parse_cli(args)?;
        let result = *executed_with_flag.borrow();
        Ok(result)
    }

    #[test]
    fn test_command_executed() {
        assert_eq!(
            Some(false),
            run(vec!["tabula", "local", "--logging-level", "off"]).unwrap()
        );
        assert_eq!(
            Some(true),
            run(vec!["tabula", "local", "-a", "--logging-level", "off"]).unwrap()
        );
    }

    #[test]
    fn test_errors() {
        assert!(run(vec!["tabula"]).is_err());
        assert!(run(vec!["tabula", "foo"]).is_err());
        assert!(run(vec!["tabula", "local", "-b"]).is_err());
    }

    #[test]
    fn test_help() {
        assert_eq!(None, run(vec!["tabula", "-h"]).unwrap());
        assert_eq!(None, run(vec!["tabula", "help", "local"]).unwrap());
        assert_eq!(None, run(vec!["tabula", "local", "-h"]).unwrap());
    }
}
