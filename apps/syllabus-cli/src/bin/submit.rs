use std::env;
use std::path::PathBuf;

use syllabus_core::config::Config;
use syllabus_core::vendor::{read_manifest, submit_all, work_items, write_submission_log, ManifestVendor};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let paths = settings.data.resolve(&env::current_dir()?);
    let manifest = env::args().nth(1).map(PathBuf::from).unwrap_or(paths.manifest);

    let ids = read_manifest(&manifest)?;
    println!("Submitting {} batch(es) from {}", ids.len(), manifest.display());
    let items = work_items(&ids, &settings.batching);
    let mut vendor = ManifestVendor::new(&paths.output_dir, settings.vendor.budget);
    let records = submit_all(&mut vendor, &items)?;
    let (ok, failed) = write_submission_log(&manifest, &records)?;
    println!("✅ {} submitted, {} failed", ok, failed);
    Ok(())
}
