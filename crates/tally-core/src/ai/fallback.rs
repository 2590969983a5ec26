//! Deterministic fallbacks for AI failures
//!
//! Every advice endpoint substitutes locally computed text when the backend
//! is unavailable or times out - the read-only advice features never surface
//! an upstream failure to the user. One generator, parameterized by kind,
//! keeps the per-endpoint handlers down to prompt text and kind selection.

use crate::models::{AdviceKind, StatsSnapshot};

use super::prompts::CATEGORIES;

/// Build fallback advice text of the given kind from a snapshot
pub fn fallback_advice(kind: AdviceKind, stats: &StatsSnapshot) -> String {
    match kind {
        AdviceKind::Summary => fallback_summary(stats),
        AdviceKind::Insights => {
            let mut text = format!(
                "You earned ${} and spent ${} this month, leaving ${} in savings.",
                stats.income, stats.expense, stats.savings
            );
            if let Some(top) = stats.category_breakdown.first() {
                text.push_str(&format!(
                    " Most of your spending went to {} (${}).",
                    top.name, top.value
                ));
            }
            text.push_str(" Keep logging transactions to sharpen these insights.");
            text
        }
        AdviceKind::Budget => {
            if stats.category_breakdown.is_empty() {
                return "Not enough data to suggest a budget yet - add some expenses first."
                    .to_string();
            }
            let mut lines: Vec<String> = stats
                .category_breakdown
                .iter()
                .take(7)
                .map(|c| format!("- {}: ${} - hold to this month's level", c.name, c.value))
                .collect();
            lines.push(format!(
                "- Savings target: ${}",
                if stats.savings > 0.0 { stats.savings } else { 0.0 }
            ));
            lines.join("\n")
        }
        AdviceKind::MonthlySummary => {
            let top = stats
                .category_breakdown
                .first()
                .map(|c| format!("{} (${})", c.name, c.value))
                .unwrap_or_else(|| "no single category".to_string());
            [
                format!("- Income ${} against expenses ${}.", stats.income, stats.expense),
                format!("- Net savings of ${} this month.", stats.savings),
                format!("- Largest spending area: {}.", top),
            ]
            .join("\n")
        }
        // The anomaly endpoint answers with the local detector's list; its
        // fallback is the empty list, rendered at the handler.
        AdviceKind::Anomaly => String::new(),
    }
}

/// The summary fallback, worded to stand alone on the dashboard
fn fallback_summary(stats: &StatsSnapshot) -> String {
    let mut summary = if stats.savings > 0.0 {
        format!("Great job! You saved ${} this month. ", stats.savings)
    } else if stats.savings < 0.0 {
        format!(
            "You spent ${} more than you earned this month. ",
            stats.savings.abs()
        )
    } else {
        "Your income and expenses are balanced this month. ".to_string()
    };

    if let Some(top) = stats.category_breakdown.first() {
        summary.push_str(&format!(
            "Your top spending category is {} (${}).",
            top.name, top.value
        ));
    } else {
        summary.push_str("Keep tracking your expenses to see category insights!");
    }

    summary
}

/// Canned reply when the chat backend is unavailable
pub fn fallback_chat_reply() -> String {
    "Sorry, I couldn't process that right now.".to_string()
}

/// Keyword classifier used when the backend cannot categorize
///
/// Mirrors the guideline list in the classification prompt; anything
/// unmatched lands in "Other".
pub fn fallback_category(description: &str) -> String {
    let lower = description.to_lowercase();

    let keyword_map: &[(&[&str], &str)] = &[
        (
            &["coffee", "cafe", "tea", "snack", "restaurant", "dining", "lunch", "breakfast", "dinner", "food"],
            "Food",
        ),
        (
            &["uber", "taxi", "bus", "train", "flight", "fuel", "gas", "cab"],
            "Travel",
        ),
        (
            &["netflix", "spotify", "youtube", "prime", "movie", "cinema"],
            "Entertainment",
        ),
        (&["grocery", "groceries", "supermarket", "market"], "Groceries"),
        (&["doctor", "medicine", "pharmacy", "hospital", "clinic"], "Health"),
        (&["rent", "house", "room"], "Rent"),
        (&["salary", "payroll", "credited", "paycheck"], "Salary"),
        (&["sip", "mutual fund", "shares", "stock", "invest"], "Investment"),
        (
            &["electricity", "water bill", "wifi", "internet", "phone", "recharge", "bill"],
            "Bills",
        ),
        (&["clothes", "electronics", "amazon", "order", "shopping"], "Shopping"),
    ];

    for (keywords, category) in keyword_map {
        if keywords.iter().any(|k| lower.contains(k)) {
            debug_assert!(CATEGORIES.contains(category));
            return (*category).to_string();
        }
    }

    "Other".to_string()
}
