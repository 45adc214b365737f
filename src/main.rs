use clap::{Arg, Command};
use log::LevelFilter;
use sms_sentinel::adb::{AdbClient, AdbConnectionManager};
use sms_sentinel::agent::ClassifierAgent;
use sms_sentinel::config::Config;
use sms_sentinel::fetch::SmsFetcher;
use sms_sentinel::filtering::SourceFilter;
use sms_sentinel::monitor::{MessageReport, SmsMonitor};
use sms_sentinel::otp::OtpExtractor;
use sms_sentinel::{display, parser};
use std::process;

#[tokio::main]
async fn main() {
    let matches = Command::new("sms-sentinel")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Watches an Android device's SMS inbox over ADB, extracts OTP codes and classifies incoming messages")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("sms-sentinel.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate an example configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .value_name("MODE")
                .help("monitor (default): watch for new SMS in real time; list: print existing messages once")
                .default_value("monitor"),
        )
        .arg(
            Arg::new("device")
                .long("device")
                .value_name("IP")
                .help("Device IP address (overrides the configuration file)")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_example_config(generate_path);
        return;
    }

    let config_path = matches.get_one::<String>("config").unwrap();
    let mut config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    if let Some(device_ip) = matches.get_one::<String>("device") {
        config.adb.device_ip = device_ip.clone();
    }

    if config.adb.device_ip.trim().is_empty() {
        eprintln!("Error: device IP not configured.");
        eprintln!("Set adb.device_ip in {config_path} or pass --device <ip>");
        process::exit(1);
    }

    let agent = ClassifierAgent::new(config.classifier.clone());
    print_banner(&config, &agent);

    let manager = AdbConnectionManager::new(config.adb.clone());
    if let Err(e) = manager.connect_with_retry().await {
        eprintln!("Could not connect to device: {e:#}");
        eprintln!("Ensure that:");
        eprintln!("  1. adb is installed and on PATH");
        eprintln!("  2. USB debugging is enabled on the phone");
        eprintln!("  3. 'adb tcpip {}' was run with USB connected first", config.adb.port);
        eprintln!("  4. Phone and computer are on the same network");
        process::exit(1);
    }

    let client = AdbClient::new(&config.adb.path, Some(manager.device_address().to_string()));
    let fetcher = SmsFetcher::new(client, config.adb.command_timeout_ms);

    let filter = match SourceFilter::new(&config.filters) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("Invalid filter configuration: {e:#}");
            process::exit(1);
        }
    };
    let extractor = match OtpExtractor::new() {
        Ok(extractor) => extractor,
        Err(e) => {
            eprintln!("Failed to compile OTP patterns: {e:#}");
            process::exit(1);
        }
    };

    let mode = matches.get_one::<String>("mode").unwrap();
    match mode.to_lowercase().as_str() {
        "list" => {
            if let Err(e) = list_messages(&fetcher, &filter, &extractor, &agent, &config).await {
                eprintln!("Listing failed: {e:#}");
                process::exit(1);
            }
        }
        "monitor" => {
            let mut monitor = SmsMonitor::new(
                fetcher,
                filter,
                extractor,
                agent,
                config.monitoring.clone(),
                config.otp.clone(),
            );

            let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::info!("shutdown signal received");
                    let _ = shutdown_tx.send(true);
                }
            });

            println!("Press Ctrl+C to stop.");
            if let Err(e) = monitor.run(shutdown_rx).await {
                log::error!("monitor error: {e:#}");
                process::exit(1);
            }
        }
        other => {
            eprintln!("Unknown mode: {other}. Use monitor or list.");
            process::exit(1);
        }
    }
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path)
    } else {
        log::warn!("configuration file '{path}' not found, using defaults");
        Ok(Config::default())
    }
}

fn generate_example_config(path: &str) {
    match Config::example().to_file(path) {
        Ok(()) => {
            println!("Example configuration written to: {path}");
            println!("Edit it to set your device IP, filters and classifier credentials.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn print_banner(config: &Config, agent: &ClassifierAgent) {
    println!("sms-sentinel v{}", env!("CARGO_PKG_VERSION"));
    println!("Device: {}:{}", config.adb.device_ip, config.adb.port);
    println!("Filter mode: {:?}", config.filters.mode);
    for source in &config.filters.sources {
        println!(
            "  - {}: {} ({:?})",
            source.label, source.value, source.match_type
        );
    }
    println!(
        "OTP extraction: {}",
        if config.otp.enabled { "enabled" } else { "disabled" }
    );
    if agent.is_enabled() {
        println!("Remote classifier: enabled (model: {})", agent.model());
    } else {
        println!("Remote classifier: disabled (heuristic only)");
    }
    println!();
}

/// One-shot list mode: fetch the whole inbox, classify and print the most
/// recent messages, newest first as the provider returns them.
async fn list_messages(
    fetcher: &SmsFetcher,
    filter: &SourceFilter,
    extractor: &OtpExtractor,
    agent: &ClassifierAgent,
    config: &Config,
) -> anyhow::Result<()> {
    log::info!("fetching SMS messages...");

    let raw = fetcher.read_inbox(0).await?;
    let messages = parser::parse(&raw);

    if messages.is_empty() {
        println!("No messages found.");
        return Ok(());
    }

    let total = messages.len();
    let selected: Vec<_> = messages
        .into_iter()
        .filter(|m| filter.should_include(&m.address))
        .take(config.monitoring.max_messages_to_display)
        .collect();

    println!(
        "Found {total} messages, showing {} after filters.",
        selected.len()
    );
    println!();

    for message in selected {
        let otp = if config.otp.enabled {
            extractor.extract(&message)
        } else {
            None
        };
        let classification = agent
            .classify(&message.body, &message.address, otp.as_ref())
            .await;
        let source_label = filter.match_label(&message.address).map(str::to_string);

        display::render_compact(&MessageReport {
            message,
            source_label,
            otp,
            classification,
        });
    }

    Ok(())
}
