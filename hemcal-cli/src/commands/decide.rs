//! Manual inbox decisions: approve, reject, restore.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use crate::render::Render;

pub fn approve(uid: &str) -> Result<()> {
    let (_, mut store) = super::load()?;
    store.approve(uid).context("Could not approve event")?;
    store.save()?;

    let record = store.get(uid).expect("approved event exists");
    println!("{} {}", "Approved".green(), record.event.render());
    Ok(())
}

pub fn reject(uid: &str) -> Result<()> {
    let (_, mut store) = super::load()?;
    store.reject(uid).context("Could not reject event")?;
    store.save()?;

    let record = store.get(uid).expect("rejected event exists");
    println!("{} {}", "Rejected".red(), record.event.render());
    Ok(())
}

pub fn restore(uid: &str) -> Result<()> {
    let (_, mut store) = super::load()?;
    store.restore(uid).context("Could not restore event")?;
    store.save()?;

    let record = store.get(uid).expect("restored event exists");
    println!(
        "{} {} (now {})",
        "Restored".yellow(),
        record.event.render(),
        record.state.render()
    );
    Ok(())
}
