// src/main.rs
use anyhow::{Context, Result};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use drawer_tidy::apply::apply_plan;
use drawer_tidy::config::AppConfig;
use drawer_tidy::planner::{PlanOptions, generate_plan_with_config};
use drawer_tidy::report::render_plan;
use drawer_tidy::store::{InventoryStore, MemoryStore, load_inventory, save_inventory};

const LOG_ENV: &str = "DRAWER_TIDY_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let dotenv_result = dotenvy::dotenv();
    init_logging();
    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            warn!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let run = &app_config.run;
    let planner_config = app_config.planner.planner_config();

    println!("🚀 drawer_tidy starting ({}, {})...", run.scope(), run.mode());

    let inventory = load_inventory(run.snapshot_path())
        .with_context(|| format!("loading snapshot {}", run.snapshot_path().display()))?;
    let mut store = MemoryStore::new(inventory);

    let containers = store.list_containers().context("listing containers")?;
    let category_names = store.inventory().category_names();
    let options = PlanOptions::new(run.scope().clone(), run.mode());
    let plan = generate_plan_with_config(&containers, &category_names, &options, &planner_config)
        .context("planning reorganization")?;

    let overlaps = plan.overlapping_placements();
    if !overlaps.is_empty() {
        warn!("⚠️ Plan contains {} overlapping placement(s)", overlaps.len());
    }
    let unsupported = plan.unsupported_placements(|item_id| {
        store
            .inventory()
            .locate(item_id)
            .is_some_and(|(_, item, _)| item.can_place_on_top)
    });
    if !unsupported.is_empty() {
        warn!("⚠️ Plan contains {} unsupported placement(s)", unsupported.len());
    }

    print!("{}", render_plan(&plan));

    if let Some(path) = run.plan_output() {
        let json = serde_json::to_string_pretty(&plan).context("serializing plan")?;
        std::fs::write(path, json).with_context(|| format!("writing plan to {}", path.display()))?;
        println!("💾 Plan written to {}", path.display());
    }

    if run.apply() {
        let report = apply_plan(&mut store, &plan);
        save_inventory(run.snapshot_path(), store.inventory())
            .with_context(|| format!("saving snapshot {}", run.snapshot_path().display()))?;
        if report.is_success() {
            println!("✅ {}", report.summary());
        } else {
            println!("⚠️ {}", report.summary());
        }
    }

    Ok(())
}
