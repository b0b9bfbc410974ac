use anyhow::Result;
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::tui;
use hemcal_core::aggregate;

pub async fn run() -> Result<()> {
    let (config, mut store) = super::load()?;

    if config.sources.is_empty() {
        anyhow::bail!(
            "No sources configured.\n\n\
            Add calendar sources to your config file:\n  \
            {}",
            hemcal_core::config::HemcalConfig::config_path()?.display()
        );
    }

    let spinner = tui::create_spinner(format!("Fetching {} sources...", config.sources.len()));
    let report = aggregate::run_pass(&config, &mut store).await?;
    spinner.finish_and_clear();

    for source in &report.sources {
        println!("{}", source.render());
    }

    if report.superseded > 0 {
        println!(
            "\nMerged away {} duplicate {}",
            report.superseded,
            if report.superseded == 1 { "copy" } else { "copies" }
        );
    }

    println!(
        "\n{} events total, {} on the shared calendar, {}",
        report.merged,
        report.approved,
        if report.pending > 0 {
            format!("{} waiting in the inbox", report.pending)
                .yellow()
                .to_string()
        } else {
            "inbox empty".dimmed().to_string()
        }
    );

    Ok(())
}
