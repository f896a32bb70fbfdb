use serde::Serialize;

/// A contiguous, non-empty slice of the input in original order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<'a, T> {
    /// 1-based page number.
    pub index: usize,
    pub total_pages: usize,
    pub rows: &'a [T],
}

impl<T> Page<'_, T> {
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.index == 1
    }

    /// "X / N" as printed in headers and footers.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} / {}", self.index, self.total_pages)
    }
}

/// Split `rows` into pages of `page_size`. Empty input gives no pages; a
/// zero page size is treated as 1.
#[must_use]
pub fn paginate<T>(rows: &[T], page_size: usize) -> Vec<Page<'_, T>> {
    let size = page_size.max(1);
    let total_pages = rows.len().div_ceil(size);
    rows.chunks(size)
        .enumerate()
        .map(|(i, chunk)| Page {
            index: i + 1,
            total_pages,
            rows: chunk,
        })
        .collect()
}
