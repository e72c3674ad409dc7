//! Savings-goal icons.

/// Fallback glyph for goal categories without a dedicated icon.
pub const DEFAULT_GOAL_ICON: &str = "💰";

const GOAL_ICONS: [(&str, &str); 5] = [
    ("EMERGENCY", "🛡️"),
    ("VEHICLE", "🚗"),
    ("HOUSING", "🏠"),
    ("EDUCATION", "🎓"),
    ("TRAVEL", "✈️"),
];

/// Icon for a savings-goal category. Case-insensitive; unknown categories get 💰.
#[must_use]
pub fn goal_icon(category: &str) -> &'static str {
    let category = category.trim();
    GOAL_ICONS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(category))
        .map_or(DEFAULT_GOAL_ICON, |&(_, icon)| icon)
}
