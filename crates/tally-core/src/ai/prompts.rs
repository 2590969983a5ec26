//! Prompt construction for the AI backend
//!
//! Prompts carry only the numeric/categorical aggregates from a stats
//! snapshot - never user identifiers or raw descriptions beyond what the
//! specific feature needs.

use crate::models::{AdviceKind, StatsSnapshot};

/// Categories the classifier is allowed to answer with
pub const CATEGORIES: &[&str] = &[
    "Food",
    "Travel",
    "Bills",
    "Shopping",
    "Entertainment",
    "Groceries",
    "Health",
    "Salary",
    "Investment",
    "Rent",
    "Other",
];

fn category_lines(stats: &StatsSnapshot, limit: usize) -> String {
    if stats.category_breakdown.is_empty() {
        return "N/A".to_string();
    }
    stats
        .category_breakdown
        .iter()
        .take(limit)
        .map(|c| format!("{}: ${}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn trend_lines(stats: &StatsSnapshot) -> String {
    if stats.monthly_trend.is_empty() {
        return "N/A".to_string();
    }
    stats
        .monthly_trend
        .iter()
        .map(|m| format!("{}: ${}", m.name, m.expense))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the prompt for an advice kind
pub fn advice_prompt(kind: AdviceKind, stats: &StatsSnapshot) -> String {
    match kind {
        AdviceKind::Summary => format!(
            r#"You are a financial advisor.

Analyze this month's financial stats:

Income: ${}
Expense: ${}
Savings: ${}

Category Breakdown (Top categories only):
{}

Write a short 2-3 line summary.
Be simple, encouraging, and insightful.
Return ONLY the summary text."#,
            stats.income,
            stats.expense,
            stats.savings,
            category_lines(stats, 5),
        ),
        AdviceKind::Insights => format!(
            r#"You are a friendly financial assistant.
Create a short monthly insight report for this user.

Data:
Income: ${}
Expense: ${}
Savings: ${}

Top Categories:
{}

Monthly Trend (month: expense):
{}

Write 3-5 short sentences:
- Mention overall spending and savings.
- Call out 1-2 big categories.
- Suggest 1-2 small, realistic improvements.
Keep it simple and encouraging."#,
            stats.income,
            stats.expense,
            stats.savings,
            category_lines(stats, 5),
            trend_lines(stats),
        ),
        AdviceKind::Budget => format!(
            r#"You are a personal finance coach.

Based on this data:

Income: ${}
Expense: ${}
Savings: ${}

Category Breakdown:
{}

Task:
Suggest a realistic monthly budget for the next month.
Focus on 4-7 main categories (e.g. Food, Travel, Bills, Shopping, Entertainment, Others).

Rules:
- Output as bullet points only.
- Each bullet: "<Category>: $amount - short justification".
- Total suggested budget must not exceed income.
- Keep it practical, simple, and friendly."#,
            stats.income,
            stats.expense,
            stats.savings,
            category_lines(stats, usize::MAX),
        ),
        AdviceKind::MonthlySummary => format!(
            r#"You are a financial assistant.

Generate exactly 3 concise bullet points summarizing the user's monthly spending.

Use this data:

Income: ${}
Expense: ${}
Savings: ${}

Category Breakdown:
{}

Monthly Trend:
{}

Rules:
- Return only bullet points.
- No title or introduction.
- Exactly 3 bullets.
- Each bullet under 18 words.
- Mention high-spend category, trends, or notable patterns."#,
            stats.income,
            stats.expense,
            stats.savings,
            category_lines(stats, usize::MAX),
            trend_lines(stats),
        ),
        AdviceKind::Anomaly => format!(
            r#"You are a financial assistant.

Given these monthly expense totals:
{}

Point out any months with unusually high spending, one short line each.
Return ONLY the list."#,
            trend_lines(stats),
        ),
    }
}

/// Build the classification prompt for a transaction description
pub fn categorize_prompt(description: &str) -> String {
    format!(
        r#"You classify financial transactions into one of the following categories:

{:?}

Interpret short or vague descriptions and map them to the most likely
real-world category.

Guidelines:
- Coffee, cafes, restaurants, snacks, food delivery are Food.
- Taxis, buses, trains, flights, fuel are Travel.
- Streaming subscriptions are Entertainment.
- Supermarkets are Groceries unless clearly shopping items.
- Clothes, electronics, online orders are Shopping.
- Doctors, medicine, pharmacies are Health.
- Rent, house, room are Rent.
- Salary, payroll, credited are Salary.
- Mutual funds, shares, stocks are Investment.
- Utilities (electricity, water, wifi, phone) are Bills.
- Use Other ONLY if absolutely no reasonable category fits.

Description: "{}"

Return ONLY the category name, nothing else."#,
        CATEGORIES, description
    )
}

/// Build the chat prompt from assembled financial context
///
/// `history` is the conversation so far as "User:"/"Assistant:" lines;
/// `recent` is a plain-text listing of recent transactions.
pub fn chat_prompt(stats: &StatsSnapshot, recent: &str, history: &str) -> String {
    format!(
        r#"You are a friendly personal finance assistant.

User's financial data:
- Income this month: ${}
- Expense this month: ${}
- Savings this month: ${}

Category totals:
{}

Recent transactions:
{}

Conversation so far:
{}

Instructions:
- Respond ONLY using the data above.
- If the user asks something unrelated, say you don't have enough data.
- Keep replies short (2-4 sentences)."#,
        stats.income,
        stats.expense,
        stats.savings,
        category_lines(stats, usize::MAX),
        recent,
        history,
    )
}
