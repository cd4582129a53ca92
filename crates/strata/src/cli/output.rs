//! Output formatting utilities for CLI commands.

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};

/// Print a table with headers and rows
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }

    println!("{}", table);
}

/// Format an epoch-milliseconds timestamp for display
pub fn format_timestamp(millis: i64) -> String {
    if millis <= 0 {
        return "-".to_string();
    }
    strata_db::StrataDb::millis_to_datetime(millis)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Display form of an optional string column
pub fn display_opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

/// Yes/no display for flags
pub fn display_bool(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_format_or_dash() {
        assert_eq!(format_timestamp(0), "-");
        assert!(format_timestamp(1_700_000_000_000).starts_with("2023-11-"));
    }

    #[test]
    fn optional_columns_render_dashes() {
        assert_eq!(display_opt(&None), "-");
        assert_eq!(display_opt(&Some("x".to_string())), "x");
        assert_eq!(display_bool(true), "yes");
    }
}
