use std::fmt;

use super::filter::Window;
use crate::error::{QueryError, StoreError};

// ---------------------------------------------------------------------------
// Page – one fetched window plus the context needed to annotate it
// ---------------------------------------------------------------------------

/// Rows returned for a window, with the total number of matching rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: usize,
    pub window: Window,
}

impl<T> Page<T> {
    /// More matching rows exist past the end of this window.
    pub fn is_truncated(&self) -> bool {
        self.window.offset + self.rows.len() < self.total
    }

    /// Banner line for truncated pages.
    pub fn banner(&self) -> Option<Banner> {
        self.is_truncated().then(|| Banner {
            start: self.window.offset + 1,
            end: self.window.offset + self.rows.len(),
            total: self.total,
            limit: self.window.limit,
            offset: self.window.offset,
        })
    }
}

/// `# Showing <start>-<end> of <total> records (limit=<limit>, offset=<offset>)`,
/// with a 1-based inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Banner {
    pub start: usize,
    pub end: usize,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl fmt::Display for Banner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "# Showing {}-{} of {} records (limit={}, offset={})",
            self.start, self.end, self.total, self.limit, self.offset
        )
    }
}

// ---------------------------------------------------------------------------
// paginate
// ---------------------------------------------------------------------------

/// Apply `window` against `total` matching rows.
///
/// * `total == 0` → the error built by `not_found`
/// * `offset >= total` → [`QueryError::OffsetExceeded`]
/// * otherwise `fetch` is called once with the window
pub fn paginate<T, F>(
    total: usize,
    window: Window,
    not_found: impl FnOnce() -> QueryError,
    fetch: F,
) -> Result<Page<T>, QueryError>
where
    F: FnOnce(Window) -> Result<Vec<T>, StoreError>,
{
    if total == 0 {
        return Err(not_found());
    }
    if window.offset >= total {
        return Err(QueryError::OffsetExceeded {
            offset: window.offset,
            total,
            max_offset: total - 1,
        });
    }
    let rows = fetch(window)?;
    log::debug!(
        "Fetched {} of {total} rows (limit={}, offset={})",
        rows.len(),
        window.limit,
        window.offset
    );
    Ok(Page {
        rows,
        total,
        window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn no_data() -> QueryError {
        QueryError::NoData1D {
            author: "a".into(),
            nfo: "n".into(),
        }
    }

    fn page_over(items: &[u32], limit: usize, offset: usize) -> Result<Page<u32>, QueryError> {
        paginate(items.len(), Window { limit, offset }, no_data, |w| {
            Ok(items.iter().skip(w.offset).take(w.limit).copied().collect())
        })
    }

    #[test]
    fn empty_match_is_not_found_and_never_fetches() {
        let result: Result<Page<u32>, _> =
            paginate(0, Window::default(), no_data, |_| panic!("fetched"));
        assert!(matches!(result, Err(QueryError::NoData1D { .. })));
    }

    #[test]
    fn offset_equal_to_total_is_rejected() {
        let err = page_over(&[1, 2, 3], 10, 3).unwrap_err();
        match err {
            QueryError::OffsetExceeded {
                offset,
                total,
                max_offset,
            } => assert_eq!((offset, total, max_offset), (3, 3, 2)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn banner_reports_one_based_range() {
        let items: Vec<u32> = (0..25).collect();
        let page = page_over(&items, 10, 5).unwrap();
        assert!(page.is_truncated());
        assert_eq!(
            page.banner().unwrap().to_string(),
            "# Showing 6-15 of 25 records (limit=10, offset=5)"
        );
    }

    #[test]
    fn last_window_is_not_truncated() {
        let items: Vec<u32> = (0..25).collect();
        let page = page_over(&items, 10, 20).unwrap();
        assert_eq!(page.rows.len(), 5);
        assert!(page.banner().is_none());
    }

    proptest! {
        #[test]
        fn window_is_a_slice_of_the_full_ordering(
            total in 1usize..200,
            limit in 1usize..250,
            offset_seed in 0usize..1000,
        ) {
            let items: Vec<u32> = (0..total as u32).collect();
            let offset = offset_seed % total;
            let page = page_over(&items, limit, offset).unwrap();
            let expected = &items[offset..(offset + limit).min(total)];
            prop_assert_eq!(page.rows.len(), limit.min(total - offset));
            prop_assert_eq!(&page.rows[..], expected);
            prop_assert_eq!(page.is_truncated(), offset + limit < total);
        }
    }
}
