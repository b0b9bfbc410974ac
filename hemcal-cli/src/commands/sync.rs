use std::sync::Arc;

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::tui;
use hemcal_core::range::DateRange;
use hemcal_core::sync::{HttpRemoteCalendar, MappingTable, RemoteCalendar, SyncEngine};

pub async fn run() -> Result<()> {
    let (config, mut store) = super::load()?;

    let Some(sync_config) = &config.sync else {
        anyhow::bail!(
            "No remote calendar configured.\n\n\
            Add a [sync] section to your config file:\n  \
            {}",
            hemcal_core::config::HemcalConfig::config_path()?.display()
        );
    };

    let client: Arc<dyn RemoteCalendar> =
        Arc::new(HttpRemoteCalendar::new(sync_config.base_url.clone()));
    let table = MappingTable::load(&config.data_path())?;
    let mut engine = SyncEngine::new(
        client.clone(),
        sync_config.calendar_id.clone(),
        table,
        sync_config.pace,
    );

    let spinner = tui::create_spinner("Pushing shared calendar...".to_string());
    let reports = engine.sync_pass(&mut store).await;
    spinner.finish_and_clear();

    for report in &reports {
        println!("{}", report.render());
    }
    if reports.is_empty() {
        println!("{}", "Nothing to push".dimmed());
    }

    let spinner = tui::create_spinner("Reconciling with remote...".to_string());
    let snapshot = client
        .list(&sync_config.calendar_id, &DateRange::default())
        .await?;
    let reconcile = engine.reconcile(&snapshot).await?;
    spinner.finish_and_clear();

    if !reconcile.orphaned.is_empty() {
        println!(
            "Dropped {} orphaned {}",
            reconcile.orphaned.len(),
            if reconcile.orphaned.len() == 1 {
                "mapping"
            } else {
                "mappings"
            }
        );
    }
    if reconcile.duplicates_deleted > 0 {
        println!(
            "Deleted {} duplicate remote {}",
            reconcile.duplicates_deleted,
            if reconcile.duplicates_deleted == 1 {
                "copy"
            } else {
                "copies"
            }
        );
    }

    engine.persist()?;
    store.save()?;

    let failures = reports.iter().filter(|r| r.error.is_some()).count();
    if failures > 0 {
        println!(
            "\n{}",
            format!("{failures} events failed; they will be retried next sync").red()
        );
    }

    Ok(())
}
