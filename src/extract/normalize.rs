use chrono::{DateTime, Duration, Local};

use crate::models::DATE_UNKNOWN;

/// Reduce a displayed amount ("75 000 DH", "1\u{202f}250\u{a0}000") to the
/// integer formed by its digits. Anything that leaves no digits is 0.
pub fn clean_amount(raw: &str) -> i64 {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

fn first_number(raw: &str) -> Option<i64> {
    let mut value: Option<i64> = None;
    for c in raw.chars() {
        match (c.to_digit(10), value) {
            (Some(d), Some(v)) => value = Some(v * 10 + d as i64),
            (Some(d), None) => value = Some(d as i64),
            (None, Some(_)) => break,
            (None, None) => {}
        }
    }
    value
}

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Turn a relative publication date ("il y a 5 minutes") into an absolute
/// one, anchored at `now`.
///
/// Minutes and hours keep to-the-second precision; days, months and years
/// are approximate, so the time of day is dropped. Input that already looks
/// absolute (it carries digits but no relative vocabulary) passes through
/// unchanged. Everything else becomes the unknown-date sentinel, never an
/// error.
pub fn normalize_relative_date(raw: &str, now: DateTime<Local>) -> String {
    let lower = raw.to_lowercase();

    if lower.contains("instant") {
        return now.format(DATETIME_FORMAT).to_string();
    }
    // "aujourd'hui"/"hier" come with a clock time the card does not anchor,
    // so only the date survives. Checked before the generic branches:
    // "aujourd'hui" would otherwise trip the "jour" arm.
    if lower.contains("aujourd") {
        return now.format(DATE_FORMAT).to_string();
    }
    if lower.contains("hier") {
        return (now - Duration::days(1)).format(DATE_FORMAT).to_string();
    }

    let Some(num) = first_number(&lower) else {
        return DATE_UNKNOWN.to_string();
    };

    if lower.contains("minute") {
        (now - Duration::minutes(num)).format(DATETIME_FORMAT).to_string()
    } else if lower.contains("heure") {
        (now - Duration::hours(num)).format(DATETIME_FORMAT).to_string()
    } else if lower.contains("jour") {
        (now - Duration::days(num)).format(DATE_FORMAT).to_string()
    } else if lower.contains("mois") {
        (now - Duration::days(30 * num)).format(DATE_FORMAT).to_string()
    } else if lower.contains("an") {
        (now - Duration::days(365 * num)).format(DATE_FORMAT).to_string()
    } else {
        // Digits without relative vocabulary: an absolute date, keep as-is.
        raw.trim().to_string()
    }
}

const FOLDER_TITLE_CAP: usize = 50;

/// Derive the image directory name for a listing.
///
/// The title part keeps only word characters, joined by single underscores
/// and capped at 50 characters; the id prefix keeps the name unique even
/// when titles collide.
pub fn folder_name(title: &str, id: u32) -> String {
    let mut cleaned = String::new();
    let mut gap = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if gap && !cleaned.is_empty() {
                cleaned.push('_');
            }
            cleaned.push(c);
            gap = false;
        } else {
            gap = true;
        }
    }
    let capped: String = cleaned.chars().take(FOLDER_TITLE_CAP).collect();
    let capped = capped.trim_matches('_');
    format!("{}_{}", id, capped)
}
