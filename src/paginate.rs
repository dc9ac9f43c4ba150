//! Row-chunk pagination for tabular documents.
//!
//! A sheet is cut into consecutive chunks of `rows_per_page` rows and each
//! chunk is serialized on its own, so every page is a standalone table whose
//! coordinates restart at the first cell.

use crate::convert::GridSerializer;
use crate::model::Row;
use rayon::prelude::*;

/// Rows per page; approximates one printed A4 page.
pub const DEFAULT_ROWS_PER_PAGE: usize = 42;

/// Number of pages produced for `rows` rows.
///
/// An empty sheet still has one (empty) page. A `rows_per_page` of zero is
/// treated as one.
///
/// # Example
///
/// ```
/// use docpane::paginate::page_count;
///
/// assert_eq!(page_count(85, 42), 3);
/// assert_eq!(page_count(0, 42), 1);
/// ```
pub fn page_count(rows: usize, rows_per_page: usize) -> usize {
    rows.div_ceil(rows_per_page.max(1)).max(1)
}

/// Split rows into pages and serialize each page.
///
/// Pages are returned in row order. With `parallel` set, chunks are
/// serialized on the rayon thread pool.
pub fn paginate(
    rows: &[Row],
    rows_per_page: usize,
    serializer: &dyn GridSerializer,
    parallel: bool,
) -> Vec<String> {
    if rows.is_empty() {
        return vec![serializer.serialize(&[])];
    }

    let chunk_size = rows_per_page.max(1);
    let pages: Vec<String> = if parallel {
        rows.par_chunks(chunk_size)
            .map(|chunk| serializer.serialize(chunk))
            .collect()
    } else {
        rows.chunks(chunk_size)
            .map(|chunk| serializer.serialize(chunk))
            .collect()
    };

    log::debug!(
        "Paginated {} rows into {} pages of up to {} rows",
        rows.len(),
        pages.len(),
        chunk_size
    );
    pages
}
