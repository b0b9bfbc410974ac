use anyhow::Result;
use owo_colors::OwoColorize;

use crate::render::Render;
use hemcal_core::classify::ApprovalState;

pub fn run() -> Result<()> {
    let (_, store) = super::load()?;

    let mut pending: Vec<_> = store.in_state(ApprovalState::Pending).collect();
    pending.sort_by(|a, b| a.event.start.cmp(&b.event.start));

    if pending.is_empty() {
        println!("{}", "Inbox empty".dimmed());
        return Ok(());
    }

    println!("{} waiting for a decision:\n", pending.len());
    for record in pending {
        println!("   {}", record.event.render());
        println!("      {}", record.event.uid.dimmed());
    }

    println!(
        "\nDecide with:\n  hemcal approve <uid>\n  hemcal reject <uid>"
    );

    Ok(())
}
