//! Current time tool — the wall clock in any IANA timezone.

use async_trait::async_trait;
use assist_core::error::ToolError;
use assist_core::tool::{ParameterSpec, Tool, ToolParams};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Get the current time and date for a specified timezone"
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::string(
                "timezone",
                "The timezone to get the time for (e.g., 'UTC', 'America/New_York')",
            )
            .with_default("UTC"),
        ]
    }

    async fn execute(&self, params: ToolParams) -> Result<String, ToolError> {
        let timezone = params.str("timezone").unwrap_or("UTC");
        Ok(format_time(Utc::now(), timezone))
    }
}

/// Render `now` in `timezone`, falling back to UTC for unknown zones.
fn format_time(now: DateTime<Utc>, timezone: &str) -> String {
    const FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

    match timezone.parse::<Tz>() {
        Ok(tz) => format!(
            "Current time in {timezone}: {}",
            now.with_timezone(&tz).format(FORMAT)
        ),
        Err(_) => {
            debug!(timezone, "Unknown timezone, falling back to UTC");
            format!(
                "Current time in {timezone} (unknown timezone, showing UTC): {}",
                now.format(FORMAT)
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn formats_utc() {
        assert_eq!(
            format_time(fixed(), "UTC"),
            "Current time in UTC: 2024-07-01 12:30:00 UTC"
        );
    }

    #[test]
    fn converts_to_named_zone() {
        let out = format_time(fixed(), "America/New_York");
        assert_eq!(out, "Current time in America/New_York: 2024-07-01 08:30:00 EDT");
    }

    #[test]
    fn unknown_zone_falls_back_to_utc() {
        let out = format_time(fixed(), "Mars/Olympus_Mons");
        assert!(out.contains("unknown timezone"));
        assert!(out.ends_with("2024-07-01 12:30:00 UTC"));
    }

    #[tokio::test]
    async fn defaults_to_utc() {
        let params = ToolParams::parse(&CurrentTimeTool.parameters(), &serde_json::json!({})).unwrap();
        let out = CurrentTimeTool.execute(params).await.unwrap();
        assert!(out.starts_with("Current time in UTC: "));
    }
}
