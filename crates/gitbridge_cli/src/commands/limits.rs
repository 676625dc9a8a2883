use gitbridge::{CacheStats, PlatformClient, RateLimitInfo};

use super::output::OutputFormat;

/// Rate limit information for display.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct RateLimitDisplay {
    #[tabled(rename = "Platform")]
    pub platform: String,
    #[tabled(rename = "Resource")]
    pub resource: String,
    #[tabled(rename = "Limit")]
    pub limit: String,
    #[tabled(rename = "Used")]
    pub used: String,
    #[tabled(rename = "Remaining")]
    pub remaining: String,
    #[tabled(rename = "Usage %")]
    pub usage_percent: String,
    #[tabled(rename = "Resets At")]
    pub reset_at: String,
    #[tabled(rename = "Resets In")]
    pub reset_in: String,
}

impl RateLimitDisplay {
    pub(crate) fn from_info(platform: &str, info: &RateLimitInfo) -> Self {
        let used = info.limit.saturating_sub(info.remaining);
        let usage_percent = if info.limit > 0 {
            (used as f64 / info.limit as f64) * 100.0
        } else {
            0.0
        };
        let reset_duration = info.reset_at.signed_duration_since(chrono::Utc::now());
        let reset_in = if reset_duration.num_seconds() > 0 {
            format_duration(reset_duration)
        } else {
            "now".to_string()
        };

        Self {
            platform: platform.to_string(),
            resource: info.resource.clone(),
            limit: info.limit.to_string(),
            used: used.to_string(),
            remaining: info.remaining.to_string(),
            usage_percent: format!("{:.1}%", usage_percent),
            reset_at: info.reset_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            reset_in,
        }
    }

    pub(crate) fn print(self, format: OutputFormat) -> Result<(), serde_json::Error> {
        match format {
            OutputFormat::Table => {
                let mut table = tabled::Table::new(vec![self]);
                table.with(tabled::settings::Style::rounded());
                println!("{}", table);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&self)?);
            }
        }
        Ok(())
    }
}

/// Handle the `limits` command.
///
/// GitLab has no rate-limit endpoint, so its numbers come from the headers of
/// the request made to fetch them.
pub(crate) async fn handle_limits(
    client: &dyn PlatformClient,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let info = client.get_rate_limit().await?;
    RateLimitDisplay::from_info(client.platform().as_str(), &info).print(output)?;

    if matches!(output, OutputFormat::Table)
        && let Some(stats) = client.cache_stats()
    {
        eprintln!("{}", cache_summary(&stats));
    }
    Ok(())
}

fn cache_summary(stats: &CacheStats) -> String {
    format!(
        "cache: {}/{} entries, {:.0}% hit rate",
        stats.entries,
        stats.max_size,
        stats.hit_rate() * 100.0
    )
}

/// Format a duration in a human-readable way.
fn format_duration(duration: chrono::Duration) -> String {
    let total_secs = duration.num_seconds();
    if total_secs < 60 {
        format!("{}s", total_secs)
    } else if total_secs < 3600 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if secs > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    } else {
        let hours = total_secs / 3600;
        let mins = (total_secs % 3600) / 60;
        if mins > 0 {
            format!("{}h {}m", hours, mins)
        } else {
            format!("{}h", hours)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_info(limit: u64, remaining: u64) -> RateLimitInfo {
        RateLimitInfo {
            limit,
            remaining,
            reset_at: Utc.timestamp_opt(2_000_000_000, 0).unwrap(),
            resource: "core".to_string(),
        }
    }

    #[test]
    fn format_duration_handles_seconds_minutes_and_hours() {
        assert_eq!(format_duration(chrono::Duration::seconds(42)), "42s");
        assert_eq!(format_duration(chrono::Duration::seconds(120)), "2m");
        assert_eq!(format_duration(chrono::Duration::seconds(125)), "2m 5s");
        assert_eq!(format_duration(chrono::Duration::seconds(3600)), "1h");
        assert_eq!(format_duration(chrono::Duration::seconds(3900)), "1h 5m");
    }

    #[test]
    fn rate_limit_display_formats_percent_and_reset() {
        let display = RateLimitDisplay::from_info("github", &sample_info(100, 75));

        assert_eq!(display.platform, "github");
        assert_eq!(display.resource, "core");
        assert_eq!(display.limit, "100");
        assert_eq!(display.used, "25");
        assert_eq!(display.remaining, "75");
        assert_eq!(display.usage_percent, "25.0%");
        assert_eq!(display.reset_at, "2033-05-18 03:33:20 UTC");
    }

    #[test]
    fn zero_limit_does_not_divide_by_zero() {
        let display = RateLimitDisplay::from_info("gitlab", &sample_info(0, 0));
        assert_eq!(display.usage_percent, "0.0%");
    }

    #[test]
    fn rate_limit_display_print_supports_json_and_table() {
        let display = RateLimitDisplay::from_info("github", &sample_info(5000, 4999));

        // Smoke tests: this should not panic in either output mode.
        display.clone().print(OutputFormat::Json).unwrap();
        display.print(OutputFormat::Table).unwrap();
    }

    #[test]
    fn cache_summary_reports_hit_rate() {
        let stats = CacheStats {
            entries: 3,
            max_size: 1000,
            hits: 3,
            misses: 1,
            evictions: 0,
            expirations: 0,
        };
        assert_eq!(cache_summary(&stats), "cache: 3/1000 entries, 75% hit rate");
    }
}
