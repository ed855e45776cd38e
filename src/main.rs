//! Command line front end for pdb-dl

use clap::Parser;
use pdb_dl::config::{ExtractBackend, FetchBackend};
use pdb_dl::output::{OutputFormat, Report};
use pdb_dl::{Config, DebugInfo, ExtractPolicy, PdbDownloader};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Download the PDB matching a Windows binary from a symbol server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// PE binary whose debug directory names the PDB
    #[arg(required_unless_present_any = ["pdb", "check_tools"], conflicts_with = "pdb")]
    binary: Option<PathBuf>,

    /// PDB file name to download instead of reading it from a binary
    #[arg(long, requires = "guid")]
    pdb: Option<String>,

    /// Symbol server key (GUID followed by age) for --pdb
    #[arg(long, requires = "pdb")]
    guid: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Symbol server base URL
    #[arg(long)]
    server: Option<String>,

    /// User agent sent to the symbol server
    #[arg(long)]
    user_agent: Option<String>,

    /// Keep the compressed archive instead of unpacking it
    #[arg(long)]
    no_extract: bool,

    /// Directory for downloaded files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Download with the built-in HTTP client instead of curl
    #[arg(long)]
    http: bool,

    /// Unpack cabinets in-process instead of with cabextract
    #[arg(long)]
    builtin_cab: bool,

    /// Print the report as a JSON field (or the tool check as a JSON object)
    #[arg(long)]
    json: bool,

    /// Only report whether the fetch and extract tools are usable
    #[arg(long)]
    check_tools: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn load_config(&self) -> pdb_dl::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(server) = &self.server {
            config.symbol_server = server.clone();
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        if self.no_extract {
            config.extract = ExtractPolicy::Disabled;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if self.http {
            config.fetch_backend = FetchBackend::Http;
        }
        if self.builtin_cab {
            config.extract_backend = ExtractBackend::Builtin;
        }
        Ok(config)
    }

    fn debug_info(&self) -> pdb_dl::Result<DebugInfo> {
        match (&self.binary, &self.pdb, &self.guid) {
            (Some(binary), _, _) => DebugInfo::from_pe_file(binary),
            (None, Some(pdb), Some(guid)) => Ok(DebugInfo::new(pdb.as_str(), guid.as_str())),
            _ => Err(pdb_dl::Error::MissingDebugFile),
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pdb_dl={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };
    let downloader = PdbDownloader::from_config(&config);

    if args.check_tools {
        let caps = downloader.capabilities().await;
        if args.json {
            match serde_json::to_string(&caps) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("{e}");
                    return ExitCode::from(2);
                }
            }
        } else {
            println!(
                "fetch tool: {}\nextract tool: {}",
                if caps.fetch { "available" } else { "missing" },
                if caps.extract { "available" } else { "missing" }
            );
        }
        return if caps.fetch {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    let info = match args.debug_info() {
        Ok(info) => info,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let result = match downloader
        .download_for_binary(Some(&info), Some(&config))
        .await
    {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    match Report::new(format).render(&info.debug_file_name, result.succeeded) {
        Ok(line) => print!("{line}"),
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    }
    if args.json {
        println!();
    }

    if result.succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
