//! Print the structure and attributes, or the decoded data, of an OPeNDAP dataset.
//!
//! Usage:
//!   dap_dump [OPTIONS] URL
//!
//! URL is either `http(s)://...` or a local path prefix: without `--data` the tool
//! reads `URL.dds` and `URL.das`, with `--data` it reads `URL` itself as a saved
//! data response.
//!
//! Options:
//!   --data        Decode the data response instead of DDS/DAS
//!   --json        Print JSON
//!   --proxy URL   Route requests through `URL?url=...` (also `DAP_PROXY`)
//!   -v            More logging on stderr (repeatable)

use anyhow::Context;
use clap::Parser;
use dapclient::dump::{format_das, format_data, format_dds};
use dapclient::{Client, ClientConfig, Fetch, FileFetcher};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "dap_dump")]
#[command(about = "Print the structure, attributes or data of an OPeNDAP dataset")]
struct Args {
    /// Dataset URL or local path prefix
    url: String,

    /// Proxy that fetches on our behalf
    #[arg(long, env = "DAP_PROXY")]
    proxy: Option<String>,

    /// Fetch and decode the data response
    #[arg(long)]
    data: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Log level: -v info, -vv debug, -vvv trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ClientConfig {
        proxy: args.proxy.clone(),
    };
    if args.proxy.is_some() || is_remote(&args.url) {
        run(&Client::new(remote_fetcher()?, config), &args)
    } else {
        run(&Client::new(FileFetcher, config), &args)
    }
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(feature = "http")]
fn remote_fetcher() -> anyhow::Result<dapclient::HttpFetcher> {
    Ok(dapclient::HttpFetcher::new())
}

#[cfg(not(feature = "http"))]
fn remote_fetcher() -> anyhow::Result<FileFetcher> {
    anyhow::bail!("remote URLs need the `http` feature")
}

fn run<F: Fetch>(client: &Client<F>, args: &Args) -> anyhow::Result<()> {
    if args.data {
        let decoded = client
            .load_data(&args.url)
            .with_context(|| format!("loading data from {}", args.url))?;
        info!(
            dataset = %decoded.dataset.name,
            bytes = decoded.byte_range.1 - decoded.byte_range.0,
            "decoded data"
        );
        if args.json {
            println!("{}", serde_json::to_string_pretty(&decoded.value)?);
        } else {
            print!("{}", format_data(&decoded.dataset, &decoded.value));
        }
    } else {
        let dataset = client
            .load_dataset(&args.url)
            .with_context(|| format!("loading dataset {}", args.url))?;
        info!(dataset = %dataset.name, "loaded dataset");
        if args.json {
            println!("{}", serde_json::to_string_pretty(&dataset)?);
        } else {
            print!("{}", format_dds(&dataset));
            print!("{}", format_das(&dataset));
        }
    }
    Ok(())
}
