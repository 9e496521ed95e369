// Grouping and text rendering for work summaries. Kept in core so the exact
// reply shape is unit-testable without a gateway connection, in the same way
// the teacher keeps response formatting next to the service it belongs to.

use chrono::NaiveDate;

use super::worklog_service::WorkRow;

/// Sentinel category for rows with a blank or "none" work field: the shift
/// was spent teaching games rather than on a named job.
pub const TEACHING_CATEGORY: &str = "สอนเกม";

/// Preferred category ordering for rendered summaries. The sentinel leads,
/// then the shop's recurring job types, then whatever else shows up that day
/// in encounter order.
pub const CATEGORY_PRIORITY: &[&str] = &[
    TEACHING_CATEGORY,
    "ซ่อมซอง",
    "ซ่อมห่อปก",
    "เรียนเกม",
    "[แจ้ง] ซ่อมซอง",
    "[แจ้ง] ซ่อมปก",
];

/// One work category and the games it was performed on. A game appears once
/// per matching row, so the count is simply `games.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkCategory {
    pub name: String,
    pub games: Vec<String>,
}

/// A finished summary, ready to render. `per_user` is only populated for
/// `all` queries, where the aggregate is followed by a per-person breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedSummary {
    pub label: String,
    pub date: NaiveDate,
    pub categories: Vec<WorkCategory>,
    pub per_user: Vec<(String, Vec<WorkCategory>)>,
}

/// Map a raw work cell onto its category name.
pub fn normalize_category(work: &str) -> String {
    let trimmed = work.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        TEACHING_CATEGORY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Group rows by work category, preserving first-seen order, then promote
/// categories listed in `CATEGORY_PRIORITY` to the front in that fixed order.
pub fn group_by_category<'a, I>(rows: I) -> Vec<WorkCategory>
where
    I: IntoIterator<Item = &'a WorkRow>,
{
    let mut categories: Vec<WorkCategory> = Vec::new();

    for row in rows {
        let name = normalize_category(&row.work);
        match categories.iter_mut().find(|c| c.name == name) {
            Some(category) => category.games.push(row.game.clone()),
            None => categories.push(WorkCategory {
                name,
                games: vec![row.game.clone()],
            }),
        }
    }

    reorder(categories)
}

fn reorder(mut categories: Vec<WorkCategory>) -> Vec<WorkCategory> {
    let mut ordered = Vec::with_capacity(categories.len());
    for preferred in CATEGORY_PRIORITY {
        if let Some(pos) = categories.iter().position(|c| &c.name == preferred) {
            ordered.push(categories.remove(pos));
        }
    }
    ordered.extend(categories);
    ordered
}

fn push_categories(lines: &mut Vec<String>, categories: &[WorkCategory]) {
    for category in categories {
        lines.push(format!("✅{} ({})", category.name, category.games.len()));
        lines.extend(category.games.iter().cloned());
    }
}

/// Render the `w` reply.
pub fn render_summary(summary: &GroupedSummary) -> String {
    let mut lines = vec![format!(
        "📋 งานของ {} วันที่ {}",
        summary.label,
        summary.date.format("%d/%m/%Y")
    )];

    push_categories(&mut lines, &summary.categories);

    for (name, categories) in &summary.per_user {
        lines.push(format!("⭐️{}", name));
        push_categories(&mut lines, categories);
    }

    lines.join("\n")
}

/// Distinct not-found reply, so an empty day never looks like a summary.
pub fn render_not_found(label: &str, date: NaiveDate) -> String {
    format!("ไม่พบงานของ {} วันที่ {}.", label, date.format("%d/%m/%Y"))
}

/// Render the `most` reply.
pub fn render_frequency(
    start: NaiveDate,
    end: NaiveDate,
    top_n: usize,
    ranked: &[(String, usize)],
) -> String {
    let mut lines = vec![format!(
        "📊 Top {} most frequent games from {} to {}:",
        top_n,
        start.format("%d %b %Y"),
        end.format("%d %b %Y")
    )];
    for (game, count) in ranked {
        lines.push(format!("{} ({})", game, count));
    }
    lines.join("\n")
}
