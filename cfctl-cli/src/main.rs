mod cli;
mod commands;
mod validate;

use std::process;
use std::time::Duration;

use clap::ArgMatches;

use cfctl_core::error::{CfctlError, Result};
use cfctl_core::fetch::{self, FetchOutcome};
use cfctl_core::render::{self, RenderFormat};
use cfctl_core::settings::Settings;
use cfctl_core::{alias, binder, response, watch};

use cli::{AliasCommand, RawVerbArgs};
use validate::VerbOptions;

#[tokio::main]
async fn main() {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let mut settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => fail(&e.to_string()),
    };

    let argv = alias::expand_argv(&settings, &argv);

    let service_names = match preload_service_names(&argv, &settings).await {
        Ok(names) => names,
        Err(e) => fail(&e.to_string()),
    };

    let app = cli::build_cli(&service_names);
    let matches = app.get_matches_from(std::iter::once("cfctl".to_string()).chain(argv));

    init_tracing(cli::verbosity(&matches));

    match matches.subcommand() {
        Some(("alias", sub)) => run_alias(&mut settings, sub).await,
        Some(("api_resources", _)) => run_api_resources(&settings).await,
        Some((service, sub)) => run_verb(&settings, service, sub).await,
        None => {
            eprintln!("Try 'cfctl --help' for usage.");
            process::exit(2);
        }
    }
}

fn fail(msg: &str) -> ! {
    eprintln!("{msg}");
    process::exit(1);
}

/// Whether the first raw argument names something that never needs an
/// endpoint map, so dynamic subcommand registration can skip the network
/// round trip entirely.
async fn preload_service_names(argv: &[String], settings: &Settings) -> Result<Vec<String>> {
    let skip = matches!(
        argv.first().map(String::as_str),
        Some("alias") | Some("api_resources") | Some("-h") | Some("--help") | Some("-V") | Some("--version") | None
    );
    if skip {
        return Ok(Vec::new());
    }

    let endpoint_map = cfctl_core::endpoint::resolve(settings).await?;
    let mut names: Vec<String> = endpoint_map.endpoints.keys().cloned().collect();
    names.sort();
    Ok(names)
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info,cfctl_core=debug,cfctl=debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_alias(settings: &mut Settings, matches: &ArgMatches) {
    let Some(command) = AliasCommand::from_matches(matches) else {
        eprintln!("Try 'cfctl alias --help' for usage.");
        process::exit(2);
    };

    match command {
        AliasCommand::Add { service, alias: name, command } => {
            if let Err(e) = commands::alias_cmd::add(settings, &service, &name, &command).await {
                eprintln!("{e}");
                process::exit(1);
            }
            println!("registered alias '{name}' for service '{service}'");
        }
        AliasCommand::List { service } => {
            for (name, command) in commands::alias_cmd::list(settings, &service) {
                println!("{name}\t{command}");
            }
        }
        AliasCommand::Remove { service, alias: name } => {
            if let Err(e) = commands::alias_cmd::remove(settings, &service, &name) {
                eprintln!("{e}");
                process::exit(1);
            }
            println!("removed alias '{name}' from service '{service}'");
        }
    }
}

async fn run_api_resources(settings: &Settings) {
    match commands::api_resources::run(settings).await {
        Ok(rows) => {
            for row in rows {
                println!("{}\t{}\t{}", row.service, row.resource, row.verbs.join(", "));
            }
        }
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}

async fn run_verb(settings: &Settings, service: &str, matches: &ArgMatches) {
    let raw = RawVerbArgs::from_matches(matches);

    let Some(verb) = raw.verb.clone() else {
        match commands::service_info::resources_for_service(
            &endpoint_or_exit(settings, service).await,
            service,
        )
        .await
        {
            Ok(rows) => {
                for row in rows {
                    println!("{}: {}", row.resource, row.verbs.join(", "));
                }
            }
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
        return;
    };

    let is_list = verb == "list";

    let opts = match validate::validate(&raw, is_list) {
        Ok(o) => o,
        Err(msg) => {
            eprintln!("{msg}");
            process::exit(2);
        }
    };

    let resource = match resolve_resource(settings, service, &verb, raw.resource.as_deref()).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    if is_list && opts.watch {
        run_watch(settings, service, &verb, &resource, &opts).await;
        return;
    }

    match fetch_outcome(settings, service, &verb, &resource, &opts).await {
        Ok(outcome) => render_outcome(outcome, &opts),
        Err(e) => {
            eprintln!("{}", describe_dispatch_error(&e));
            process::exit(exit_code_for(&e));
        }
    }
}

async fn endpoint_or_exit(settings: &Settings, service: &str) -> String {
    match cfctl_core::endpoint::resolve(settings).await {
        Ok(map) => match map.get(service) {
            Ok(endpoint) => endpoint.to_string(),
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}

/// Resolve the positional resource when omitted, by finding the one
/// resource under this service that exposes the requested verb.
async fn resolve_resource(
    settings: &Settings,
    service: &str,
    verb: &str,
    resource: Option<&str>,
) -> Result<String> {
    if let Some(r) = resource {
        return Ok(r.to_string());
    }

    let endpoint_map = cfctl_core::endpoint::resolve(settings).await?;
    let endpoint = endpoint_map.get(service)?;
    let resources = commands::service_info::resources_for_service(endpoint, service).await?;

    let matching: Vec<&str> = resources
        .iter()
        .filter(|r| r.verbs.iter().any(|v| v == verb))
        .map(|r| r.resource.as_str())
        .collect();

    match matching.as_slice() {
        [only] => Ok(only.to_string()),
        [] => Err(CfctlError::ServiceNotFound(
            service.to_string(),
            format!("(no resource exposes verb '{verb}')"),
        )),
        _ => Err(CfctlError::ServiceNotFound(
            service.to_string(),
            format!("(verb '{verb}' is ambiguous across {} resources; specify one)", matching.len()),
        )),
    }
}

async fn fetch_outcome(
    settings: &Settings,
    service: &str,
    verb: &str,
    resource: &str,
    opts: &VerbOptions,
) -> Result<FetchOutcome> {
    let params = binder::merge_params(opts.file_parameter.as_deref(), opts.json_parameter.as_deref(), &opts.parameters)?;
    fetch::dispatch(settings, service, verb, resource, params, &opts.response).await
}

fn render_outcome(outcome: FetchOutcome, opts: &VerbOptions) {
    let outcome = if opts.minimal {
        match outcome {
            FetchOutcome::Collection(records) => FetchOutcome::Collection(response::apply_minimal(records)),
            single @ FetchOutcome::Single(_) => single,
        }
    } else {
        outcome
    };

    let result = if opts.format == RenderFormat::Table {
        render::render_interactive(outcome, opts.response.columns.clone(), opts.rows_per_page, opts.no_paging)
    } else {
        render::render_static(opts.format, &outcome).and_then(|text| {
            println!("{text}");
            if opts.copy {
                if let Err(e) = render::copy_to_clipboard(&text) {
                    eprintln!("warning: failed to copy to clipboard: {e}");
                }
            }
            Ok(())
        })
    };

    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1);
    }
}

async fn run_watch(settings: &Settings, service: &str, verb: &str, resource: &str, opts: &VerbOptions) {
    let mut state: Option<watch::WatchState> = None;

    loop {
        match fetch_outcome(settings, service, verb, resource, opts).await {
            Ok(outcome) => {
                let records = match outcome {
                    FetchOutcome::Collection(records) => records,
                    FetchOutcome::Single(record) => vec![record],
                };
                let state = state.get_or_insert_with(watch::WatchState::new);
                let diff = state.diff(&records);
                for record in &diff.added {
                    println!("+ {record}");
                }
                for id in &diff.removed {
                    println!("- {id}");
                }
            }
            Err(e) => tracing::warn!(error = %e, "watch tick failed, retrying"),
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => return,
            _ = tokio::time::sleep(Duration::from_secs(2)) => {}
        }
    }
}

fn describe_dispatch_error(err: &CfctlError) -> String {
    if let CfctlError::GrpcStatus(status) = err {
        if let Some(field) = cfctl_core::error::parse_missing_required_parameter(status.message()) {
            return CfctlError::MissingRequiredParameter(field).to_string();
        }
    }
    err.to_string()
}

fn exit_code_for(err: &CfctlError) -> i32 {
    if let CfctlError::GrpcStatus(status) = err {
        if cfctl_core::error::parse_missing_required_parameter(status.message()).is_some() {
            return 1;
        }
        return cli::STATUS_CODE_OFFSET + status.code() as i32;
    }
    1
}
