use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use owo_colors::OwoColorize;

use crate::render::Render;
use hemcal_core::store::CreateEventPayload;

pub fn run(
    title: String,
    start: String,
    end: Option<String>,
    location: Option<String>,
    assignees: Vec<String>,
    category: Option<String>,
) -> Result<()> {
    let start = parse_datetime(&start)?;
    let end = end.as_deref().map(parse_datetime).transpose()?;

    let (_, mut store) = super::load()?;

    let event = store
        .create_manual(CreateEventPayload {
            summary: title,
            start,
            end,
            location,
            description: None,
            assignees,
            category,
            created_by: Some("cli".to_string()),
        })
        .context("Could not create event")?;
    store.save()?;

    println!("{} {}", "Created".green(), event.render());
    println!("   {}", event.uid.dimmed());

    Ok(())
}

/// Accepts "2025-03-20T15:00", "2025-03-20 15:00" or a bare date (midnight).
fn parse_datetime(input: &str) -> Result<DateTime<Utc>> {
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(dt.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc());
    }

    Err(anyhow!(
        "Invalid date/time '{input}'. Expected e.g. 2025-03-20T15:00"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_datetime_forms() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap();
        assert_eq!(parse_datetime("2025-03-20T15:00").unwrap(), expected);
        assert_eq!(parse_datetime("2025-03-20 15:00").unwrap(), expected);
        assert_eq!(
            parse_datetime("2025-03-20").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap()
        );
        assert!(parse_datetime("tomorrow").is_err());
    }
}
