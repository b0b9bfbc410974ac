use anyhow::{Result, anyhow};
use chrono::{NaiveDate, Utc};
use owo_colors::OwoColorize;

use hemcal_core::classify::ApprovalState;
use hemcal_core::event::CanonicalEvent;
use hemcal_core::week::{layout_week, week_days};

pub fn run(date: Option<&str>) -> Result<()> {
    let date = match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| anyhow!("Invalid date '{}'. Expected YYYY-MM-DD", s))?,
        None => Utc::now().date_naive(),
    };

    let (_, store) = super::load()?;

    // Only vetted events appear on the shared week view.
    let events: Vec<CanonicalEvent> = store
        .records()
        .filter(|r| matches!(r.state, ApprovalState::Approved | ApprovalState::Synced))
        .map(|r| r.event.clone())
        .collect();

    let days = week_days(date);
    let layout = layout_week(&events, &days);

    println!(
        "Week of {} – {}\n",
        days[0].format("%Y-%m-%d"),
        days[6].format("%Y-%m-%d")
    );

    if !layout.spans.is_empty() {
        for span in &layout.spans {
            let event = events.iter().find(|e| e.uid == span.uid);
            let Some(event) = event else { continue };
            // Column range back to day labels (col_end is exclusive).
            let first = days[span.col_start - 1].format("%a");
            let last = days[span.col_end - 2].format("%a");
            println!("   {} {}", event.summary, format!("{first}–{last}").dimmed());
        }
        println!();
    }

    for (index, day) in days.iter().enumerate() {
        let mut uids = layout.days[index].clone();
        uids.sort_by_key(|uid| events.iter().find(|e| &e.uid == uid).map(|e| e.start));

        println!("{}", day.format("%a %d %b").to_string().bold());
        if uids.is_empty() {
            println!("   {}", "–".dimmed());
            continue;
        }

        for uid in uids {
            let Some(event) = events.iter().find(|e| e.uid == uid) else {
                continue;
            };
            let mut line = format!("   {} {}", event.start.format("%H:%M").dimmed(), event.summary);
            if !event.assignees.is_empty() {
                let names: Vec<_> = event.assignees.iter().cloned().collect();
                line.push_str(&format!(" {}", format!("({})", names.join(", ")).dimmed()));
            }
            println!("{line}");
        }
    }

    Ok(())
}
