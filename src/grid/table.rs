//! HTML table parser for grid cells
//!
//! Every `<tr>` with exactly three `<td>`/`<th>` cells is read as
//! `(x, character, y)`. Rows that do not fit that shape are dropped quietly,
//! which also takes care of header rows.

use crate::grid::GridCell;
use scraper::{ElementRef, Html, Selector};

/// Extracts all well-formed `(x, character, y)` rows from an HTML document
///
/// # Example
///
/// ```
/// use specimen_harvest::grid::parse_table;
///
/// let html = "<table><tr><th>x</th><th>c</th><th>y</th></tr>\
///             <tr><td>0</td><td>█</td><td>1</td></tr></table>";
/// let cells = parse_table(html);
/// assert_eq!(cells.len(), 1);
/// assert_eq!(cells[0].ch, '█');
/// ```
pub fn parse_table(html: &str) -> Vec<GridCell> {
    let document = Html::parse_document(html);

    let (Ok(row_selector), Ok(cell_selector)) = (Selector::parse("tr"), Selector::parse("td, th"))
    else {
        return Vec::new();
    };

    document
        .select(&row_selector)
        .filter_map(|row| {
            let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
            parse_row(&cells)
        })
        .collect()
}

/// Parses one row's cells; `None` if the row is not a grid cell
fn parse_row(cells: &[ElementRef]) -> Option<GridCell> {
    let [x, ch, y] = cells else {
        return None;
    };

    let x = cell_text(x).parse().ok()?;
    let ch = cell_text(ch).chars().next()?;
    let y = cell_text(y).parse().ok()?;

    Some(GridCell { x, ch, y })
}

/// Concatenated, trimmed text content of a cell
fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}
