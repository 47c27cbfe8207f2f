use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command};

/// Offset added to a gRPC status code to form the process exit code,
/// so transport/usage failures (exit 1-2) never collide with a status code.
pub const STATUS_CODE_OFFSET: i32 = 64;

/// Build the top-level `cfctl` command.
///
/// `alias` and `api_resources` are static subcommands; one subcommand is
/// registered per discovered service, since the service set is only known
/// once the endpoint map has been resolved for the active environment.
pub fn build_cli(service_names: &[String]) -> Command {
    let mut cli = Command::new("cfctl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Command-line control tool for the SpaceONE gRPC platform")
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Enable debug-level logging"),
        )
        .arg(
            Arg::new("very_verbose")
                .long("vv")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Enable trace-level logging"),
        )
        .subcommand(alias_command())
        .subcommand(
            Command::new("api_resources")
                .about("List every discovered service, resource, and verb"),
        );

    for service in service_names {
        cli = cli.subcommand(service_command(service));
    }
    cli
}

fn alias_command() -> Command {
    Command::new("alias")
        .about("Manage <verb> <resource> shorthands")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("add")
                .about("Register a new alias")
                .arg(Arg::new("service").short('s').long("service").required(true))
                .arg(Arg::new("alias").short('k').long("alias").required(true))
                .arg(
                    Arg::new("command")
                        .short('v')
                        .long("command")
                        .required(true)
                        .value_name("VERB RESOURCE"),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("List aliases registered for a service")
                .arg(Arg::new("service").short('s').long("service").required(true)),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove a registered alias")
                .arg(Arg::new("service").short('s').long("service").required(true))
                .arg(Arg::new("alias").short('k').long("alias").required(true)),
        )
}

/// Flags shared by every verb invocation on a discovered service
/// (`-p`/`-j`/`-f`/`-o`/`-y` common; `-w`/`-s`/`-c`/`-r`/`-n`/`--no-paging`/`-m`
/// valid only on `list`, enforced by `validate::validate`).
fn service_command(name: &str) -> Command {
    Command::new(name.to_string())
        .about(format!("Invoke a verb on the {name} service"))
        .arg(Arg::new("verb").help("e.g. list, get, create"))
        .arg(Arg::new("resource").help("e.g. Server, User"))
        .arg(
            Arg::new("parameter")
                .short('p')
                .long("parameter")
                .action(ArgAction::Append)
                .value_name("KEY=VALUE")
                .help("Repeatable; later instances win on key collision"),
        )
        .arg(
            Arg::new("json_parameter")
                .short('j')
                .long("json-parameter")
                .value_name("JSON")
                .help("JSON object merged under -p"),
        )
        .arg(
            Arg::new("file_parameter")
                .short('f')
                .long("file-parameter")
                .value_name("FILE")
                .help("YAML file merged under -j"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("yaml|json|table|csv")
                .help("Default yaml; default table for list"),
        )
        .arg(
            Arg::new("copy")
                .short('y')
                .long("copy")
                .action(ArgAction::SetTrue)
                .help("Also copy rendered output to the clipboard"),
        )
        .arg(
            Arg::new("watch")
                .short('w')
                .long("watch")
                .action(ArgAction::SetTrue)
                .help("list only: re-poll and print only newly observed records"),
        )
        .arg(Arg::new("sort").short('s').long("sort").value_name("FIELD"))
        .arg(Arg::new("columns").short('c').long("columns").value_name("CSV"))
        .arg(Arg::new("rows").short('r').long("rows").value_name("N"))
        .arg(
            Arg::new("rows_per_page")
                .short('n')
                .long("rows-per-page")
                .value_name("N"),
        )
        .arg(Arg::new("no_paging").long("no-paging").action(ArgAction::SetTrue))
        .arg(Arg::new("minimal").short('m').long("minimal").action(ArgAction::SetTrue))
}

/// Raw verb-command flags, pulled out of `ArgMatches` but not yet validated
/// or coerced — see `validate::validate`.
#[derive(Debug, Clone, Default)]
pub struct RawVerbArgs {
    pub verb: Option<String>,
    pub resource: Option<String>,
    pub parameters: Vec<String>,
    pub json_parameter: Option<String>,
    pub file_parameter: Option<PathBuf>,
    pub output: Option<String>,
    pub copy: bool,
    pub watch: bool,
    pub sort: Option<String>,
    pub columns: Option<String>,
    pub rows: Option<String>,
    pub rows_per_page: Option<String>,
    pub no_paging: bool,
    pub minimal: bool,
}

impl RawVerbArgs {
    pub fn from_matches(matches: &ArgMatches) -> RawVerbArgs {
        RawVerbArgs {
            verb: matches.get_one::<String>("verb").cloned(),
            resource: matches.get_one::<String>("resource").cloned(),
            parameters: matches
                .get_many::<String>("parameter")
                .map(|v| v.cloned().collect())
                .unwrap_or_default(),
            json_parameter: matches.get_one::<String>("json_parameter").cloned(),
            file_parameter: matches.get_one::<String>("file_parameter").map(PathBuf::from),
            output: matches.get_one::<String>("output").cloned(),
            copy: matches.get_flag("copy"),
            watch: matches.get_flag("watch"),
            sort: matches.get_one::<String>("sort").cloned(),
            columns: matches.get_one::<String>("columns").cloned(),
            rows: matches.get_one::<String>("rows").cloned(),
            rows_per_page: matches.get_one::<String>("rows_per_page").cloned(),
            no_paging: matches.get_flag("no_paging"),
            minimal: matches.get_flag("minimal"),
        }
    }
}

/// An `alias add`/`list`/`remove` invocation, pulled out of `ArgMatches`.
#[derive(Debug, Clone)]
pub enum AliasCommand {
    Add { service: String, alias: String, command: String },
    List { service: String },
    Remove { service: String, alias: String },
}

impl AliasCommand {
    pub fn from_matches(matches: &ArgMatches) -> Option<AliasCommand> {
        match matches.subcommand() {
            Some(("add", m)) => Some(AliasCommand::Add {
                service: m.get_one::<String>("service")?.clone(),
                alias: m.get_one::<String>("alias")?.clone(),
                command: m.get_one::<String>("command")?.clone(),
            }),
            Some(("list", m)) => Some(AliasCommand::List {
                service: m.get_one::<String>("service")?.clone(),
            }),
            Some(("remove", m)) => Some(AliasCommand::Remove {
                service: m.get_one::<String>("service")?.clone(),
                alias: m.get_one::<String>("alias")?.clone(),
            }),
            _ => None,
        }
    }
}

/// Verbosity level implied by the global `-v`/`--vv` flags.
pub fn verbosity(matches: &ArgMatches) -> u8 {
    if matches.get_flag("very_verbose") {
        2
    } else if matches.get_flag("verbose") {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_one_subcommand_per_service() {
        let cli = build_cli(&["inventory".to_string(), "identity".to_string()]);
        let names: Vec<&str> = cli.get_subcommands().map(|c| c.get_name()).collect();
        assert!(names.contains(&"inventory"));
        assert!(names.contains(&"identity"));
        assert!(names.contains(&"alias"));
        assert!(names.contains(&"api_resources"));
    }

    #[test]
    fn parses_raw_verb_args_with_repeated_parameters() {
        let cli = build_cli(&["inventory".to_string()]);
        let matches = cli
            .try_get_matches_from(["cfctl", "inventory", "list", "Server", "-p", "a=1", "-p", "b=2"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let raw = RawVerbArgs::from_matches(sub);
        assert_eq!(raw.verb.as_deref(), Some("list"));
        assert_eq!(raw.resource.as_deref(), Some("Server"));
        assert_eq!(raw.parameters, vec!["a=1".to_string(), "b=2".to_string()]);
    }

    #[test]
    fn parses_alias_add_subcommand() {
        let cli = build_cli(&[]);
        let matches = cli
            .try_get_matches_from(["cfctl", "alias", "add", "-s", "inventory", "-k", "job", "-v", "list Job"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let command = AliasCommand::from_matches(sub).unwrap();
        match command {
            AliasCommand::Add { service, alias, command } => {
                assert_eq!(service, "inventory");
                assert_eq!(alias, "job");
                assert_eq!(command, "list Job");
            }
            _ => panic!("expected AliasCommand::Add"),
        }
    }
}
