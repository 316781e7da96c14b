use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;

const TIMEZONE_CONFIG_FILE: &str = "frontdesk-time.toml";
const TIMEZONE_ENV_VAR: &str = "FRONTDESK_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str = "FRONTDESK_TIME_CONFIG";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
    timezone: Option<String>,
    time: Option<TimezoneSection>,
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
    timezone: Option<String>,
}

/// The property's timezone decides which calendar day counts as
/// "today" for the grid, independent of where the terminal runs.
pub fn property_timezone() -> &'static Tz {
    static PROPERTY_TZ: OnceLock<Tz> = OnceLock::new();
    PROPERTY_TZ.get_or_init(resolve_property_timezone)
}

#[must_use]
pub fn to_property_date(dt: DateTime<Utc>) -> NaiveDate {
    dt.with_timezone(property_timezone()).date_naive()
}

fn resolve_property_timezone() -> Tz {
    if let Ok(raw) = std::env::var(TIMEZONE_ENV_VAR)
        && let Some(tz) = parse_timezone(&raw, TIMEZONE_ENV_VAR)
    {
        return tz;
    }

    if let Some(path) = timezone_config_path()
        && let Some(tz) = load_timezone_from_file(&path)
    {
        return tz;
    }

    tracing::info!("no property timezone configured; using UTC");
    chrono_tz::UTC
}

fn timezone_config_path() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var(TIMEZONE_CONFIG_ENV_VAR) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    std::env::current_dir()
        .ok()
        .map(|dir| dir.join(TIMEZONE_CONFIG_FILE))
}

fn load_timezone_from_file(path: &PathBuf) -> Option<Tz> {
    if !path.exists() {
        return None;
    }

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::error!(
                file = %path.display(),
                error = %err,
                "failed reading timezone config file"
            );
            return None;
        }
    };

    let parsed = match toml::from_str::<TimezoneConfig>(&raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::error!(
                file = %path.display(),
                error = %err,
                "failed parsing timezone config file"
            );
            return None;
        }
    };

    let timezone = parsed
        .timezone
        .or_else(|| parsed.time.and_then(|section| section.timezone))?;

    parse_timezone(timezone.as_str(), &format!("file:{}", path.display()))
}

fn parse_timezone(raw: &str, source: &str) -> Option<Tz> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        tracing::warn!(source, "timezone source was empty");
        return None;
    }

    match trimmed.parse::<Tz>() {
        Ok(tz) => {
            tracing::info!(source, timezone = %trimmed, "configured property timezone");
            Some(tz)
        }
        Err(err) => {
            tracing::error!(
                source,
                timezone = %trimmed,
                error = %err,
                "failed to parse timezone id"
            );
            None
        }
    }
}

/// Parses a grid anchor expression: an ISO date, a named day, or a
/// relative offset like `+3d`, `-2w`, `+1m` applied to `today`.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_anchor_expr(input: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let token = input.trim();

    match token.to_ascii_lowercase().as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
        return Ok(date);
    }

    let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dwm])$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;

    if let Some(caps) = rel_re.captures(token) {
        let sign = caps
            .name("sign")
            .map(|m| m.as_str())
            .ok_or_else(|| anyhow!("missing relative sign"))?;
        let num: i64 = caps
            .name("num")
            .map(|m| m.as_str())
            .ok_or_else(|| anyhow!("missing relative amount"))?
            .parse()
            .context("invalid relative amount")?;
        let unit = caps
            .name("unit")
            .map(|m| m.as_str())
            .ok_or_else(|| anyhow!("missing relative unit"))?;

        let anchor = match unit {
            "d" => shift_days(today, sign, num),
            "w" => shift_days(today, sign, num * 7),
            "m" => shift_months(today, sign, num)?,
            _ => return Err(anyhow!("unsupported relative unit: {unit}")),
        };
        return Ok(anchor);
    }

    Err(anyhow!("unrecognized anchor expression: {token}"))
}

fn shift_days(date: NaiveDate, sign: &str, days: i64) -> NaiveDate {
    if sign == "-" {
        date - Duration::days(days)
    } else {
        date + Duration::days(days)
    }
}

fn shift_months(date: NaiveDate, sign: &str, months: i64) -> anyhow::Result<NaiveDate> {
    let months = Months::new(u32::try_from(months).context("relative month amount too large")?);
    let shifted = if sign == "-" {
        date.checked_sub_months(months)
    } else {
        date.checked_add_months(months)
    };
    shifted.ok_or_else(|| anyhow!("anchor month shift out of range"))
}
