//! Terminal preview of collected records.
//!
//! Renders a fixed-width table of the first rows so the user can eyeball the
//! result before opening the CSV. Long cells are ellipsized per column.

use crate::models::VideoRecord;
use crate::utils::ellipsize;
use itertools::Itertools;

/// Maximum width, in characters, of each column in header order.
const COLUMN_WIDTHS: [usize; 6] = [48, 24, 8, 8, 8, 40];

fn pad(cell: &str, width: usize) -> String {
    let cell = ellipsize(cell, width);
    let fill = width.saturating_sub(cell.chars().count());
    format!("{cell}{}", " ".repeat(fill))
}

fn render_row(cells: [&str; 6]) -> String {
    cells
        .iter()
        .zip(COLUMN_WIDTHS)
        .map(|(cell, width)| pad(cell, width))
        .join(" | ")
        .trim_end()
        .to_string()
}

/// Render up to `max_rows` records as a text table.
///
/// A trailing line reports how many rows were left out.
pub fn render_table(records: &[VideoRecord], max_rows: usize) -> String {
    let mut lines = vec![render_row(VideoRecord::HEADERS)];
    lines.push(COLUMN_WIDTHS.iter().map(|w| "-".repeat(*w)).join("-+-"));
    lines.extend(records.iter().take(max_rows).map(|r| render_row(r.cells())));

    if records.is_empty() {
        lines.push("(no videos collected)".to_string());
    } else if records.len() > max_rows {
        lines.push(format!("… {} more row(s)", records.len() - max_rows));
    }
    lines.join("\n")
}
