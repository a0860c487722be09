//! Character grid rendering from a published document
//!
//! This module handles:
//! - Fetching the published HTML document
//! - Scraping `(x, character, y)` rows out of its table
//! - Filling a blank grid with those characters and printing it

mod table;

pub use table::parse_table;

use crate::HarvestError;
use reqwest::Client;
use std::fmt;

/// One placed character; `y = 0` is the top row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub x: usize,
    pub ch: char,
    pub y: usize,
}

/// A rectangular block of characters, blank-filled with spaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<char>>,
}

impl Grid {
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Character at `(x, y)`, if inside the grid
    pub fn get(&self, x: usize, y: usize) -> Option<char> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Iterates over the rows as strings, top to bottom
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.rows.iter().map(|row| row.iter().collect())
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(&line)?;
        }
        Ok(())
    }
}

/// Largest grid (width * height) that will be allocated
pub const MAX_GRID_CELLS: usize = 1 << 24;

/// Builds the smallest grid that holds every cell
///
/// The grid is `(max y + 1)` rows by `(max x + 1)` columns. When two cells
/// share a position the later one wins.
///
/// # Returns
///
/// * `Ok(Some(Grid))` - The filled grid
/// * `Ok(None)` - `cells` is empty
/// * `Err(HarvestError::GridTooLarge)` - The coordinates span more than [`MAX_GRID_CELLS`]
pub fn build_grid(cells: &[GridCell]) -> Result<Option<Grid>, HarvestError> {
    let (Some(max_x), Some(max_y)) = (
        cells.iter().map(|cell| cell.x).max(),
        cells.iter().map(|cell| cell.y).max(),
    ) else {
        return Ok(None);
    };

    let too_large = || HarvestError::GridTooLarge {
        max_x,
        max_y,
        limit: MAX_GRID_CELLS,
    };
    let width = max_x.checked_add(1).ok_or_else(too_large)?;
    let height = max_y.checked_add(1).ok_or_else(too_large)?;
    match width.checked_mul(height) {
        Some(area) if area <= MAX_GRID_CELLS => {}
        _ => return Err(too_large()),
    }

    let mut rows = vec![vec![' '; width]; height];
    for cell in cells {
        rows[cell.y][cell.x] = cell.ch;
    }

    Ok(Some(Grid { rows }))
}

/// Fetches a document body as text
///
/// # Returns
///
/// * `Ok(String)` - The response body
/// * `Err(HarvestError)` - Transport failure or non-success status
pub async fn fetch_document(client: &Client, url: &str) -> Result<String, HarvestError> {
    tracing::debug!("Fetching document {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| HarvestError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(HarvestError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|source| HarvestError::Http {
        url: url.to_string(),
        source,
    })
}

/// Fetches a document and builds its grid
///
/// # Returns
///
/// * `Ok(Some(Grid))` - At least one cell was parsed
/// * `Ok(None)` - The document held no usable table rows
/// * `Err(HarvestError)` - The document could not be fetched, or its grid is too large
pub async fn render_document(client: &Client, url: &str) -> Result<Option<Grid>, HarvestError> {
    let html = fetch_document(client, url).await?;
    let cells = parse_table(&html);
    tracing::debug!("Parsed {} grid cells from {}", cells.len(), url);
    build_grid(&cells)
}
