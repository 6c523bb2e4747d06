//! Print-template generation: a standalone HTML document assembled from
//! already-filtered contribution rows. No database access here; aggregates
//! are computed from the rows the caller supplies, so output is deterministic
//! for identical inputs.

use crate::models::ContributionDto;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

/// Which columns appear in the printed table. All on by default.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldSelection {
    pub title: bool,
    pub account_name: bool,
    pub sale_name: bool,
    pub contribution_type: bool,
    pub impact: bool,
    pub effort: bool,
    pub status: bool,
    pub contribution_month: bool,
    pub description: bool,
    pub estimated_impact_value: bool,
}

impl Default for FieldSelection {
    fn default() -> Self {
        FieldSelection {
            title: true,
            account_name: true,
            sale_name: true,
            contribution_type: true,
            impact: true,
            effort: true,
            status: true,
            contribution_month: true,
            description: true,
            estimated_impact_value: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ReportContext {
    pub tenant_name: String,
    pub generated_for: String,
}

/// Summary aggregates over a row set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportSummary {
    pub total: usize,
    pub by_impact: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub distinct_users: usize,
    pub distinct_accounts: usize,
}

pub fn summarize(rows: &[ContributionDto]) -> ReportSummary {
    let mut summary = ReportSummary {
        total: rows.len(),
        ..Default::default()
    };
    let mut users = HashSet::new();
    let mut accounts = HashSet::new();
    for row in rows {
        *summary
            .by_impact
            .entry(row.impact.as_str().to_string())
            .or_insert(0) += 1;
        *summary
            .by_status
            .entry(row.status.as_str().to_string())
            .or_insert(0) += 1;
        users.insert(row.user_id);
        accounts.insert(row.account_name.as_str());
    }
    summary.distinct_users = users.len();
    summary.distinct_accounts = accounts.len();
    summary
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = r#"
body { font-family: Arial, Helvetica, sans-serif; margin: 24px; color: #1a1a1a; }
h1 { font-size: 20px; margin-bottom: 2px; }
.meta { color: #555; font-size: 12px; margin-bottom: 16px; }
.summary { display: flex; gap: 24px; margin-bottom: 16px; font-size: 13px; }
.summary div { border: 1px solid #ddd; border-radius: 4px; padding: 8px 12px; }
table { width: 100%; border-collapse: collapse; font-size: 12px; }
th, td { border: 1px solid #ccc; padding: 6px 8px; text-align: left; vertical-align: top; }
th { background: #f2f2f2; }
@media print { body { margin: 0; } }
"#;

fn push_cell(html: &mut String, value: &str) {
    html.push_str("<td>");
    html.push_str(&escape_html(value));
    html.push_str("</td>");
}

fn breakdown_line(label: &str, counts: &BTreeMap<String, usize>) -> String {
    let parts: Vec<String> = counts.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
    format!("<div><b>{}</b><br>{}</div>", label, escape_html(&parts.join(", ")))
}

/// Build the full print document. Rows are rendered in the order given.
pub fn build_print_html(
    rows: &[ContributionDto],
    fields: &FieldSelection,
    ctx: &ReportContext,
) -> String {
    let summary = summarize(rows);

    let mut html = String::with_capacity(2048 + rows.len() * 256);
    html.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Contribution Report</title><style>");
    html.push_str(STYLE);
    html.push_str("</style></head><body>");

    html.push_str(&format!(
        "<h1>Contribution Report: {}</h1>",
        escape_html(&ctx.tenant_name)
    ));
    html.push_str(&format!(
        "<p class=\"meta\">Prepared for {}</p>",
        escape_html(&ctx.generated_for)
    ));

    html.push_str("<div class=\"summary\">");
    html.push_str(&format!(
        "<div><b>Total</b><br>{}</div>",
        summary.total
    ));
    html.push_str(&breakdown_line("By impact", &summary.by_impact));
    html.push_str(&breakdown_line("By status", &summary.by_status));
    html.push_str(&format!(
        "<div><b>Contributors</b><br>{}</div>",
        summary.distinct_users
    ));
    html.push_str(&format!(
        "<div><b>Accounts</b><br>{}</div>",
        summary.distinct_accounts
    ));
    html.push_str("</div>");

    html.push_str("<table><thead><tr>");
    let headers: &[(bool, &str)] = &[
        (fields.title, "Title"),
        (fields.account_name, "Account"),
        (fields.sale_name, "Sale"),
        (fields.contribution_type, "Type"),
        (fields.impact, "Impact"),
        (fields.effort, "Effort"),
        (fields.status, "Status"),
        (fields.contribution_month, "Month"),
        (fields.estimated_impact_value, "Est. Value"),
        (fields.description, "Description"),
    ];
    for (on, label) in headers {
        if *on {
            html.push_str(&format!("<th>{}</th>", label));
        }
    }
    html.push_str("</tr></thead><tbody>");

    for row in rows {
        html.push_str("<tr>");
        if fields.title {
            push_cell(&mut html, &row.title);
        }
        if fields.account_name {
            push_cell(&mut html, &row.account_name);
        }
        if fields.sale_name {
            push_cell(&mut html, &row.sale_name);
        }
        if fields.contribution_type {
            push_cell(&mut html, row.contribution_type.as_str());
        }
        if fields.impact {
            push_cell(&mut html, row.impact.as_str());
        }
        if fields.effort {
            push_cell(&mut html, row.effort.as_str());
        }
        if fields.status {
            push_cell(&mut html, row.status.as_str());
        }
        if fields.contribution_month {
            push_cell(&mut html, &row.contribution_month);
        }
        if fields.estimated_impact_value {
            let value = row
                .estimated_impact_value
                .map(|v| format!("{:.2}", v))
                .unwrap_or_default();
            push_cell(&mut html, &value);
        }
        if fields.description {
            push_cell(&mut html, row.description.as_deref().unwrap_or(""));
        }
        html.push_str("</tr>");
    }

    html.push_str("</tbody></table></body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContributionStatus, ContributionType, Effort, Impact};
    use chrono::Utc;
    use uuid::Uuid;

    fn row(user_id: Uuid, account: &str, impact: Impact, status: ContributionStatus) -> ContributionDto {
        let now = Utc::now();
        ContributionDto {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            user_id,
            account_name: account.into(),
            sale_name: "Jordan".into(),
            sale_email: None,
            contribution_type: ContributionType::Technical,
            title: "Migrated <legacy> system".into(),
            description: Some("details".into()),
            impact,
            effort: Effort::Medium,
            estimated_impact_value: Some(1200.5),
            contribution_month: "2025-06".into(),
            status,
            tags: vec![],
            attachments: vec![],
            sale_approval: false,
            sale_approval_date: None,
            sale_approval_notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn summary_aggregates() {
        let u1 = Uuid::new_v4();
        let u2 = Uuid::new_v4();
        let rows = vec![
            row(u1, "acme", Impact::High, ContributionStatus::Approved),
            row(u1, "acme", Impact::High, ContributionStatus::Draft),
            row(u2, "globex", Impact::Low, ContributionStatus::Approved),
        ];
        let s = summarize(&rows);
        assert_eq!(s.total, 3);
        assert_eq!(s.by_impact.get("high"), Some(&2));
        assert_eq!(s.by_impact.get("low"), Some(&1));
        assert_eq!(s.by_status.get("approved"), Some(&2));
        assert_eq!(s.distinct_users, 2);
        assert_eq!(s.distinct_accounts, 2);
    }

    #[test]
    fn html_escapes_row_content() {
        let rows = vec![row(Uuid::new_v4(), "acme", Impact::Low, ContributionStatus::Draft)];
        let html = build_print_html(
            &rows,
            &FieldSelection::default(),
            &ReportContext {
                tenant_name: "A&B".into(),
                generated_for: "tester".into(),
            },
        );
        assert!(html.contains("Migrated &lt;legacy&gt; system"));
        assert!(html.contains("A&amp;B"));
        assert!(!html.contains("<legacy>"));
    }

    #[test]
    fn field_selection_drops_columns() {
        let rows = vec![row(Uuid::new_v4(), "acme", Impact::Low, ContributionStatus::Draft)];
        let fields = FieldSelection {
            description: false,
            estimated_impact_value: false,
            ..Default::default()
        };
        let html = build_print_html(
            &rows,
            &fields,
            &ReportContext {
                tenant_name: "T".into(),
                generated_for: "tester".into(),
            },
        );
        assert!(!html.contains("<th>Description</th>"));
        assert!(!html.contains("<th>Est. Value</th>"));
        assert!(html.contains("<th>Title</th>"));
    }

    #[test]
    fn deterministic_for_same_input() {
        let rows = vec![
            row(Uuid::new_v4(), "acme", Impact::High, ContributionStatus::Submitted),
            row(Uuid::new_v4(), "globex", Impact::Low, ContributionStatus::Draft),
        ];
        let ctx = ReportContext {
            tenant_name: "T".into(),
            generated_for: "tester".into(),
        };
        let a = build_print_html(&rows, &FieldSelection::default(), &ctx);
        let b = build_print_html(&rows, &FieldSelection::default(), &ctx);
        assert_eq!(a, b);
    }
}
