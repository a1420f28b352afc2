use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use artifetch_core::cache::CacheConfig;
use artifetch_core::domain::read_records;
use artifetch_core::impls::{LocalDirStore, PrefixParser, TimeoutStore};
use artifetch_core::{PrefetchCache, RegistryBuilder};

const LOCAL_FLAVOR: &str = "local";

/// Prefetch remote build artifacts and copy them into an output tree.
#[derive(Debug, Parser)]
#[command(name = "artifetch", version)]
struct Args {
    /// JSON array of artifact records (relative_path, id, sync_start_time_millis)
    #[arg(long)]
    records: PathBuf,

    /// Directory serving artifact content, one file per digest
    #[arg(long)]
    store_dir: PathBuf,

    /// Hash id prefix claimed by the directory store
    #[arg(long, default_value = "")]
    prefix: String,

    /// Output directory; artifacts land at <out>/<relative_path>
    #[arg(long)]
    out: PathBuf,

    /// JSON file with cache settings (max_bytes, max_entry_bytes)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the cache byte budget
    #[arg(long, env = "ARTIFETCH_MAX_BYTES")]
    max_bytes: Option<u64>,

    /// Per-fetch deadline in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

fn load_config(args: &Args) -> anyhow::Result<CacheConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open config {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => CacheConfig::default(),
    };
    if let Some(max_bytes) = args.max_bytes {
        config.max_bytes = max_bytes;
    }
    Ok(config)
}

/// relative_path が out の外を指さないこと
fn destination(out: &Path, relative_path: &str) -> Option<PathBuf> {
    let relative = Path::new(relative_path);
    if relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        Some(out.join(relative))
    } else {
        None
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    // (A) 起動時に parser を登録（以降 registry は読み取り専用）
    let store = TimeoutStore::new(
        LocalDirStore::new(&args.store_dir).with_prefix(&args.prefix),
        Duration::from_secs(args.timeout_secs),
    );
    let registry = RegistryBuilder::new()
        .register(PrefixParser::new(LOCAL_FLAVOR, args.prefix.clone(), Arc::new(store)))?
        .expect_flavors(&[LOCAL_FLAVOR])
        .build()?;

    // (B) record を読み込んで resolve（解決できないものは warn してスキップ）
    let file = File::open(&args.records)
        .with_context(|| format!("failed to open records {}", args.records.display()))?;
    let records = read_records(BufReader::new(file))
        .with_context(|| format!("failed to parse records {}", args.records.display()))?;
    let report = registry.resolve_all(&records);
    info!(
        resolved = report.resolved.len(),
        skipped = report.skipped(),
        "resolved artifact records"
    );

    // (C) 全部 prefetch（ブロックしない、失敗はコピー時に表面化する）
    let cache = PrefetchCache::current(config);
    for artifact in &report.resolved {
        drop(artifact.prefetch(&cache));
    }

    // (D) 出力ツリーへコピー
    let mut failures = 0usize;
    for artifact in &report.resolved {
        let Some(dest) = destination(&args.out, artifact.relative_path()) else {
            warn!(path = artifact.relative_path(), "relative path escapes output dir; skipping");
            failures += 1;
            continue;
        };
        match artifact.copy_to(&cache, &dest).await {
            Ok(()) => info!(hash_id = artifact.hash_id(), dest = %dest.display(), "copied"),
            Err(e) => {
                error!(hash_id = artifact.hash_id(), error = %e, "copy failed");
                failures += 1;
            }
        }
    }

    // (E) 集計
    println!("{}", serde_json::to_string_pretty(&cache.stats())?);

    if failures > 0 {
        bail!("{failures} artifact(s) could not be copied");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_stays_inside_out() {
        let out = Path::new("/out");
        assert_eq!(
            destination(out, "bin/libfoo.jar"),
            Some(PathBuf::from("/out/bin/libfoo.jar"))
        );
        assert_eq!(destination(out, "../escape.jar"), None);
        assert_eq!(destination(out, "/abs.jar"), None);
    }

    #[test]
    fn max_bytes_flag_overrides_default() {
        let args = Args::parse_from([
            "artifetch",
            "--records",
            "r.json",
            "--store-dir",
            "store",
            "--out",
            "out",
            "--max-bytes",
            "1024",
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.max_bytes, 1024);
    }
}
