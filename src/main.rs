use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use capacityd::auth::TokenTable;
use capacityd::config::EngineConfig;
use capacityd::directory::InMemoryDirectory;
use capacityd::engine::Engine;
use capacityd::notify::NotifyHub;
use capacityd::seed::Seed;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("CAPACITYD_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    capacityd::observability::init(metrics_port)?;

    let seed_path = std::env::var("CAPACITYD_SEED").unwrap_or_else(|_| "./demos/seed.json".into());
    let config = EngineConfig::from_env();
    info!("capacityd starting");
    info!("  seed: {seed_path}");
    info!(
        "  lock_timeout: {}",
        config
            .lock_timeout
            .map_or("none".to_string(), |t| format!("{}ms", t.as_millis()))
    );

    let directory = Arc::new(InMemoryDirectory::new());
    let tokens = TokenTable::new();
    let engine = Engine::new(directory.clone(), Arc::new(NotifyHub::new()), config);

    let seed = Seed::load(&PathBuf::from(&seed_path))?;
    seed.apply(&engine, &directory, &tokens).await;

    for entry in engine.engineers_with_capacity(None).await? {
        let skills = if entry.engineer.skills.is_empty() {
            "-".to_string()
        } else {
            entry.engineer.skills.iter().collect::<Vec<_>>().join(", ")
        };
        info!(
            "engineer {} ({}) [{skills}]: {}% of {}% available",
            entry.engineer.name,
            entry.engineer.id,
            entry.capacity.available_capacity,
            entry.capacity.max_capacity
        );
    }

    let mut projects = directory.projects();
    projects.sort_by_key(|p| p.id);
    for (project, shortlist) in projects.iter().zip(engine.shortlists(&projects).await) {
        let shortlist = match shortlist {
            Ok(shortlist) => shortlist,
            Err(e) => {
                warn!("project {} ({}) skipped: {e}", project.name, project.id);
                continue;
            }
        };
        info!(
            "project {} ({:?}): {} candidate(s) for team of {}",
            project.name,
            project.status,
            shortlist.len(),
            project.team_size
        );
        for c in &shortlist {
            info!(
                "    {} ({:?}) with {}% available",
                c.engineer_id, c.seniority, c.available_capacity
            );
        }
    }

    // Keep the exporter up until interrupted so the numbers can be scraped.
    if metrics_port.is_some() {
        info!("waiting for ctrl-c");
        tokio::signal::ctrl_c().await?;
    }

    info!("capacityd stopped");
    Ok(())
}
