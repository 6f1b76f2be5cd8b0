use colored::Colorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::observability::LogRecord;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Renders rows as a rounded table, header first.
pub fn print_table<const N: usize>(header: [&str; N], rows: Vec<[String; N]>) {
    if rows.is_empty() {
        println!("Nothing to show.");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(header);
    for row in rows {
        builder.push_record(row);
    }
    println!("{}", builder.build().with(Style::rounded()));
}

pub fn print_log_summary(records: &[LogRecord]) {
    eprintln!("{}", format!("Recent log events ({})", records.len()).cyan());
    for record in records {
        let level = match record.level.as_str() {
            "ERROR" => record.level.red(),
            "WARN" => record.level.yellow(),
            _ => record.level.normal(),
        };
        eprintln!(
            "  {} {:>5} {} {}",
            record.timestamp.dimmed(),
            level,
            record.target.dimmed(),
            record.message
        );
    }
}

/// ✓ or ✗, coloured.
pub fn mark(ok: bool) -> String {
    if ok {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}
