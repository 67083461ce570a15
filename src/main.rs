use anyhow::{bail, Context, Result};
use memscan::memory::MemoryRegion;
use memscan::{load_config, MemoryValue, Session, ValueKind};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Hits printed after a search
const FIRST_PAGE: usize = 20;

const USAGE: &str = "usage: memscan [--config <file>] [search <kind> <value> [--xor <key>]]";

struct SearchRequest {
    value: MemoryValue,
    key: Option<u64>,
}

struct Args {
    config: Option<PathBuf>,
    search: Option<SearchRequest>,
}

fn parse_key(text: &str) -> Result<u64> {
    let key = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    key.with_context(|| format!("invalid xor key: {}", text))
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut parsed = Args {
        config: None,
        search: None,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "search" => {
                let (Some(kind), Some(text)) = (args.next(), args.next()) else {
                    bail!(USAGE);
                };
                let kind: ValueKind = kind.parse()?;
                let value = MemoryValue::parse(kind, &text)?;
                let mut key = None;
                if let Some(flag) = args.next() {
                    if flag != "--xor" {
                        bail!(USAGE);
                    }
                    key = Some(parse_key(&args.next().context("--xor needs a key")?)?);
                }
                parsed.search = Some(SearchRequest { value, key });
            }
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other => bail!("unexpected argument `{}`\n{}", other, USAGE),
        }
    }

    Ok(parsed)
}

fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    let config = load_config(args.config.as_deref()).context("loading configuration")?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting memscan v{}", env!("CARGO_PKG_VERSION"));
    info!("Architecture: {}", std::env::consts::ARCH);

    let mut session = Session::init(config)?;
    let eligible = session.eligible_regions();
    let summary = json!({
        "pid": session.pid(),
        "regions": session.region_count(),
        "eligible_regions": eligible.len(),
        "eligible_bytes": eligible.iter().map(MemoryRegion::size).sum::<usize>(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(request) = args.search {
        let stats = session.search_value(&request.value, request.key)?;
        let hits: Vec<String> = session
            .results()
            .page(0, FIRST_PAGE)
            .iter()
            .map(|address| address.to_string())
            .collect();
        let report = json!({
            "kind": request.value.kind(),
            "value": request.value.to_string(),
            "pattern": hex::encode(request.value.to_bytes()),
            "xor_key": request.key.map(|key| format!("0x{:X}", key)),
            "matches": stats.matches,
            "truncated": stats.truncated,
            "first": hits,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    session.close();
    info!("Shutting down memscan");
    Ok(())
}
