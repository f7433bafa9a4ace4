/// Toolbar badge appearance per verdict

use crate::analysis::Verdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeStyle {
    pub color: &'static str,
    pub text: &'static str,
}

const GREEN: &str = "#10b981";
const AMBER: &str = "#f59e0b";
const RED: &str = "#ef4444";
const GRAY: &str = "#6b7280";

/// Shown for unknown or missing verdicts, and before any verification
pub const NEUTRAL_BADGE: BadgeStyle = BadgeStyle {
    color: GRAY,
    text: "-",
};

impl From<Verdict> for BadgeStyle {
    fn from(verdict: Verdict) -> Self {
        let (color, text) = match verdict {
            Verdict::True | Verdict::MostlyTrue => (GREEN, "\u{2713}"),
            Verdict::Mixed => (AMBER, "?"),
            Verdict::MostlyFalse | Verdict::False => (RED, "\u{2717}"),
            Verdict::Unverifiable => (GRAY, "-"),
        };
        BadgeStyle { color, text }
    }
}

pub fn badge_for(verdict: Option<&str>) -> BadgeStyle {
    verdict
        .and_then(Verdict::parse)
        .map(BadgeStyle::from)
        .unwrap_or(NEUTRAL_BADGE)
}
