//! `portal` - console core from the command line

mod commands;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use portal_core::{ApiClient, Catalog, LogSink, NotificationSink, PortalConfig, Translator};
use portal_forms::NamespaceProbe;
use portal_http::HttpApiClient;
use portal_trace::TraceFilter;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("portal")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Object storage console core")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("url")
                .long("url")
                .global(true)
                .help("Console backend base URL, overrides the configuration"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("list")
                .about("List a console collection")
                .arg(
                    Arg::new("kind")
                        .required(true)
                        .value_parser(commands::KINDS)
                        .help("Collection to list"),
                )
                .arg(
                    Arg::new("filter")
                        .long("filter")
                        .default_value("")
                        .help("Case-insensitive substring of the display name"),
                )
                .arg(
                    Arg::new("sort")
                        .long("sort")
                        .default_value("source")
                        .value_parser(["source", "asc", "desc"])
                        .help("Row order"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("validate-tenant")
                .about("Check a tenant name and namespace")
                .arg(Arg::new("name").long("name").required(true).help("Tenant name"))
                .arg(
                    Arg::new("namespace")
                        .long("namespace")
                        .required(true)
                        .help("Target namespace"),
                )
                .arg(
                    Arg::new("probe")
                        .long("probe")
                        .action(ArgAction::SetTrue)
                        .help("Also ask the backend whether the namespace is usable"),
                ),
        )
        .subcommand(
            Command::new("trace-url")
                .about("Print the trace stream URL for a filter")
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Trace every call category"),
                )
                .arg(
                    Arg::new("errors-only")
                        .long("errors-only")
                        .action(ArgAction::SetTrue)
                        .help("Only failed calls"),
                )
                .arg(
                    Arg::new("threshold")
                        .long("threshold")
                        .default_value("0")
                        .value_parser(value_parser!(u64))
                        .help("Only calls slower than this many milliseconds"),
                )
                .arg(Arg::new("path").long("path").help("Path substring")),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(matches: &ArgMatches) -> Result<PortalConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => {
            PortalConfig::from_file(path).with_context(|| format!("loading {path}"))?
        }
        None => PortalConfig::default(),
    };
    if let Some(url) = matches.get_one::<String>("url") {
        config.api.base_url.clone_from(url);
    }
    Ok(config)
}

fn arg<'a>(args: &'a ArgMatches, name: &str) -> &'a str {
    args.get_one::<String>(name).map_or("", String::as_str)
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let config = load_config(&matches)?;
    let catalog = Arc::new(Catalog::builtin_for(
        config.locale.language.clone(),
        config.locale.fallback.clone(),
    ));
    let sink: Arc<dyn NotificationSink> = Arc::new(LogSink);

    match matches.subcommand() {
        Some(("list", args)) => {
            let api: Arc<dyn ApiClient> = Arc::new(HttpApiClient::new(&config.api)?);
            let lines = commands::list_kind(
                arg(args, "kind"),
                api,
                sink,
                arg(args, "filter"),
                arg(args, "sort"),
                args.get_flag("json"),
            )
            .await?;
            for line in lines {
                println!("{line}");
            }
        }
        Some(("validate-tenant", args)) => {
            let name = arg(args, "name");
            let namespace = arg(args, "namespace");
            let probed = if args.get_flag("probe") {
                let api: Arc<dyn ApiClient> = Arc::new(HttpApiClient::new(&config.api)?);
                let translator: Arc<dyn Translator> = catalog.clone();
                let probe = NamespaceProbe::new(api, sink, translator);
                Some(probe.probe(namespace).await?)
            } else {
                None
            };

            let check = commands::validate_tenant(name, namespace, probed, catalog.as_ref());
            for line in &check.errors {
                println!("{line}");
            }
            if !check.storage_classes.is_empty() {
                println!("storage classes: {}", check.storage_classes.join(", "));
            }
            if !check.valid {
                std::process::exit(1);
            }
            println!("ok");
        }
        Some(("trace-url", args)) => {
            let mut filter = TraceFilter::default()
                .with_threshold_ms(args.get_one::<u64>("threshold").copied().unwrap_or(0))
                .with_path(arg(args, "path"));
            if args.get_flag("all") {
                filter = filter.all_calls();
            }
            if args.get_flag("errors-only") {
                filter = filter.errors_only();
            }
            println!("{}", filter.url(&config.trace.ws_base_url));
        }
        _ => unreachable!("clap requires a subcommand"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn global_url_overrides_config() {
        let matches = cli()
            .try_get_matches_from(["portal", "list", "users", "--url", "http://console:9090"])
            .unwrap();
        let config = load_config(&matches).unwrap();
        assert_eq!(config.api.base_url, "http://console:9090");
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(arg(args, "sort"), "source");
    }

    #[test]
    fn unknown_kind_rejected_by_parser() {
        assert!(cli()
            .try_get_matches_from(["portal", "list", "tenants"])
            .is_err());
    }
}
