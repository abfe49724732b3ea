use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use contract_schema::{
    config::Config,
    ethereum::{
        abi::{AbiLoader, AbiSource},
        ContractSchema, StorageType,
    },
};
use serde_json::{json, Value};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the schema
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let matches = Command::new("contract-schema")
        .version("0.1.0")
        .about("Derive relational schemas from Ethereum contract ABIs")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to configuration file"),
        )
        .arg(
            Arg::new("abi")
                .short('a')
                .long("abi")
                .value_name("FILE")
                .help("ABI JSON file to map")
                .conflicts_with("address"),
        )
        .arg(
            Arg::new("address")
                .long("address")
                .value_name("ADDRESS")
                .help("Contract address whose ABI is read from the ABI directory"),
        )
        .arg(
            Arg::new("events")
                .short('e')
                .long("events")
                .value_name("NAMES")
                .value_delimiter(',')
                .help("Comma separated event names to map (default: all)"),
        )
        .arg(
            Arg::new("methods")
                .short('m')
                .long("methods")
                .value_name("NAMES")
                .value_delimiter(',')
                .help("Comma separated method names to map (default: all)"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .help("Generate a sample configuration file and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config-path")
                .long("config-path")
                .help("Print the default configuration file path and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("generate-config") {
        println!("{}", Config::generate_sample());
        return Ok(());
    }

    if matches.get_flag("config-path") {
        match Config::default_config_path() {
            Ok(path) => {
                println!("{}", path.display());
                return Ok(());
            }
            Err(e) => {
                error!("Could not determine default config path: {}", e);
                return Err(e);
            }
        }
    }

    let config_path = matches.get_one::<String>("config").map(|s| s.as_str());
    let mut config = Config::load_or_default(config_path).await;

    if let Some(events) = matches.get_many::<String>("events") {
        config.schema.events = events.cloned().collect();
    }
    if let Some(methods) = matches.get_many::<String>("methods") {
        config.schema.methods = methods.cloned().collect();
    }

    let abi = match load_abi(&matches, &config).await {
        Ok(abi) => abi,
        Err(e) => {
            error!("Failed to load ABI: {}", e);
            return Err(e);
        }
    };

    let schema = ContractSchema::filtered(&abi, &config.schema.events, &config.schema.methods);
    info!(
        "Mapped {} events and {} methods",
        schema.events.len(),
        schema.methods.len()
    );

    let report = serde_json::to_string_pretty(&describe(&schema))
        .map_err(|e| anyhow!("Failed to serialize schema: {}", e))?;
    println!("{}", report);

    Ok(())
}

async fn load_abi(matches: &ArgMatches, config: &Config) -> Result<alloy::json_abi::JsonAbi> {
    if let Some(path) = matches.get_one::<String>("abi") {
        return AbiLoader::load_file(path).await;
    }

    let address = matches
        .get_one::<String>("address")
        .ok_or_else(|| anyhow!("Either --abi or --address is required"))?;

    let mut loader = AbiLoader::new(AbiSource::from(&config.abi));
    loader.get_abi(address).await
}

fn describe(schema: &ContractSchema) -> Value {
    let events: Vec<Value> = schema
        .events
        .iter()
        .map(|(sig, event)| {
            json!({
                "name": event.name,
                "signature": sig,
                "topic": format!("{:?}", event.topic()),
                "anonymous": event.anonymous,
                "columns": columns(&event.columns()),
            })
        })
        .collect();

    let methods: Vec<Value> = schema
        .methods
        .iter()
        .map(|(sig, method)| {
            json!({
                "name": method.name,
                "signature": sig,
                "selector": format!("{:?}", method.selector()),
                "constant": method.is_constant,
                "inputs": columns(&method.input_columns()),
                "outputs": columns(&method.output_columns()),
            })
        })
        .collect();

    json!({ "events": events, "methods": methods })
}

fn columns(columns: &[(String, StorageType)]) -> Vec<Value> {
    columns
        .iter()
        .map(|(name, storage_type)| json!({ "name": name, "type": storage_type }))
        .collect()
}
