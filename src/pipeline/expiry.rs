//! License-expiry text scan — the secondary, much weaker heuristic.
//!
//! Loan packages often include a photocopy of the borrower's driver
//! license; an expired one is a funding condition just like a missing
//! signature. This check is nothing like the raster classifier: it only
//! looks at the page's embedded text layer for license keywords and a
//! `MM/DD/YYYY`-shaped date. It runs conditionally (off by default), and
//! its finding rides on the verdict without ever influencing `is_signed`.
//!
//! Scanned-image pages have no text layer, so this heuristic silently
//! finds nothing there; that limitation is inherent and accepted.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// `MM/DD/YYYY` or `MM-DD-YYYY`, 1–2 digit month/day tolerated.
static RE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(0?[1-9]|1[0-2])[/-](0?[1-9]|[12][0-9]|3[01])[/-](\d{4})\b").unwrap()
});

/// Words that mark a page as a driver-license copy. Case-insensitive,
/// checked against the whole text layer.
const LICENSE_MARKERS: [&str; 3] = ["driver license", "driver's license", "operator license"];

/// A license-expiry date found on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryFinding {
    /// The parsed expiry date.
    pub date: NaiveDate,
    /// The matched text, verbatim.
    pub raw: String,
}

impl ExpiryFinding {
    /// Whether the license is expired as of `today`.
    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        self.date < today
    }
}

/// Scan a page's text layer for a driver-license expiry date.
///
/// Returns `None` unless the page both reads as a license copy (keyword
/// match) and carries at least one parseable date. When several dates are
/// present (issue date, birth date, expiry), the latest one is taken —
/// on US licenses the expiry is the furthest-future date printed.
pub fn scan_license_expiry(text: &str) -> Option<ExpiryFinding> {
    let lower = text.to_lowercase();
    if !LICENSE_MARKERS.iter().any(|kw| lower.contains(kw)) {
        return None;
    }

    RE_DATE
        .find_iter(text)
        .filter_map(|m| {
            let normalized = m.as_str().replace('-', "/");
            NaiveDate::parse_from_str(&normalized, "%m/%d/%Y")
                .ok()
                .map(|date| ExpiryFinding {
                    date,
                    raw: m.as_str().to_string(),
                })
        })
        .max_by_key(|finding| finding.date)
}
