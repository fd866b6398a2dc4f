//! Report rendering.

use owo_colors::OwoColorize;
use schemacheck::{Change, DiffCounts, LoadStats, Verification};
use std::fmt::Write;

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Text,
    Json,
}

pub fn render(verification: &Verification, format: Format, color: bool) -> String {
    match format {
        Format::Text => render_text(verification, color),
        Format::Json => render_json(verification),
    }
}

fn render_json(verification: &Verification) -> String {
    match serde_json::to_string_pretty(verification) {
        Ok(json) => json + "\n",
        Err(e) => format!("{{\"error\": {:?}}}\n", e.to_string()),
    }
}

/// Colors only when asked to; tests and pipes get plain text.
struct Painter {
    color: bool,
}

impl Painter {
    fn missing(&self, text: impl std::fmt::Display) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    fn extra(&self, text: impl std::fmt::Display) -> String {
        if self.color {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: impl std::fmt::Display) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: impl std::fmt::Display) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    fn ok(&self, text: impl std::fmt::Display) -> String {
        if self.color {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    fn change(&self, change: &Change) -> String {
        match change {
            Change::MissingColumn { .. } | Change::MissingIndex { .. } => self.missing(change),
            Change::ExtraColumn { .. } | Change::ColumnDiff { .. } => self.extra(change),
        }
    }
}

pub fn render_text(verification: &Verification, color: bool) -> String {
    let p = Painter { color };
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{}",
        p.dim(format_args!(
            "expected: {} ({})",
            verification.expected_source,
            describe_stats(&verification.expected_stats)
        ))
    );
    let _ = writeln!(
        out,
        "{}",
        p.dim(format_args!(
            "actual:   {} ({})",
            verification.actual_source,
            describe_stats(&verification.actual_stats)
        ))
    );
    out.push('\n');

    let diff = &verification.diff;
    if diff.is_clean() {
        let _ = writeln!(out, "{}", p.ok("Schemas match."));
        return out;
    }

    for table in &diff.missing_tables {
        let _ = writeln!(out, "{}", p.missing(table));
    }
    for table in &diff.extra_tables {
        let _ = writeln!(out, "{}", p.extra(table));
    }
    for table in &diff.table_diffs {
        let _ = writeln!(out, "{}", p.heading(format_args!("{}:", table.table)));
        for change in &table.changes {
            let _ = writeln!(out, "  {}", p.change(change));
        }
    }

    out.push('\n');
    let _ = writeln!(out, "{}", p.heading(summary(&diff.counts)));
    out
}

fn describe_stats(stats: &LoadStats) -> String {
    let mut parts = vec![plural(stats.rows, "row")];
    if stats.skipped_rows > 0 {
        parts.push(format!("{} skipped", stats.skipped_rows));
    }
    parts.push(plural(stats.tables, "table"));
    if stats.views > 0 {
        parts.push(plural(stats.views, "view"));
    }
    parts.join(", ")
}

fn summary(counts: &DiffCounts) -> String {
    let parts: Vec<String> = [
        (counts.missing_tables, "missing table"),
        (counts.extra_tables, "extra table"),
        (counts.missing_columns, "missing column"),
        (counts.extra_columns, "extra column"),
        (counts.column_diffs, "changed column"),
        (counts.missing_indexes, "missing index"),
    ]
    .into_iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, what)| plural(n, what))
    .collect();

    format!("{}: {}", plural(counts.total(), "finding"), parts.join(", "))
}

fn plural(n: usize, what: &str) -> String {
    match (n, what.ends_with('x')) {
        (1, _) => format!("1 {what}"),
        (_, true) => format!("{n} {what}es"),
        _ => format!("{n} {what}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemacheck::{Column, Index, SchemaBuilder, compare};

    fn verification() -> Verification {
        let mut expected = SchemaBuilder::new();
        expected.column("audit_log", "id", Column::new("bigint unsigned", false));
        expected.column("orders", "id", Column::new("int", false));
        expected.column(
            "orders",
            "status",
            Column::new("varchar(16)", false).with_default("pending"),
        );
        expected.column("orders", "order_no", Column::new("varchar(32)", false));
        expected.index_column("orders", "uniq_order_no", true, "order_no");

        let mut actual = SchemaBuilder::new();
        actual.column("orders", "id", Column::new("int", false));
        actual.column("orders", "status", Column::new("varchar(16)", false));
        actual.column("orders", "order_no", Column::new("varchar(32)", false));
        actual.column("orders", "legacy", Column::new("text", true));

        let expected = expected.build();
        let actual = actual.build();
        assert_eq!(
            expected.table("orders").unwrap().indexes["uniq_order_no"],
            Index::new(true, &["order_no"])
        );

        Verification {
            expected_source: "export production.csv".to_string(),
            expected_stats: LoadStats {
                rows: 5,
                skipped_rows: 1,
                tables: 2,
                views: 1,
            },
            actual_source: "live database".to_string(),
            actual_stats: LoadStats {
                rows: 4,
                skipped_rows: 0,
                tables: 1,
                views: 0,
            },
            diff: compare(&expected, &actual),
        }
    }

    #[test]
    fn test_text_report() {
        insta::assert_snapshot!(render_text(&verification(), false).trim_end(), @r"
        expected: export production.csv (5 rows, 1 skipped, 2 tables, 1 view)
        actual:   live database (4 rows, 1 table)

        missing table audit_log (1 columns)
        orders:
          extra column legacy text
          column status: default pending -> (none)
          missing UNIQUE index uniq_order_no (order_no)

        4 findings: 1 missing table, 1 extra column, 1 changed column, 1 missing index
        ");
    }

    #[test]
    fn test_clean_report() {
        let mut v = verification();
        v.diff = Default::default();
        let text = render_text(&v, false);
        assert!(text.ends_with("\nSchemas match.\n"), "{text}");
    }

    #[test]
    fn test_color_only_when_asked() {
        assert!(!render_text(&verification(), false).contains('\u{1b}'));
        assert!(render_text(&verification(), true).contains('\u{1b}'));
    }

    #[test]
    fn test_json_report() {
        let json = render(&verification(), Format::Json, false);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["diff"]["counts"]["missing_tables"], 1);
        assert_eq!(value["diff"]["missing_tables"][0]["table"], "audit_log");
        let changes = &value["diff"]["table_diffs"][0]["changes"];
        assert_eq!(changes[0]["kind"], "extra_column");
        assert_eq!(changes[1]["attributes"][0]["attribute"], "default");
        assert_eq!(changes[2]["kind"], "missing_index");
        assert_eq!(value["expected_stats"]["skipped_rows"], 1);
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "table"), "1 table");
        assert_eq!(plural(0, "finding"), "0 findings");
        assert_eq!(plural(2, "index"), "2 indexes");
    }
}
