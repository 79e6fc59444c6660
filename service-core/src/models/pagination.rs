use serde::{Deserialize, Serialize};

/// Derived paging metadata for one listing request. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_files: usize,
    pub limit: usize,
    pub has_next: bool,
    pub has_prev: bool,
    /// 1-based inclusive display range; both are 0 for an empty page.
    pub start_index: usize,
    pub end_index: usize,
}

impl PaginationState {
    /// `page` and `limit` are clamped to at least 1.
    pub fn new(total_files: usize, page: usize, limit: usize) -> Self {
        let limit = limit.max(1);
        let page = page.max(1);
        let total_pages = total_files.div_ceil(limit);
        let range = page_range(total_files, page, limit);
        let (start_index, end_index) = if range.is_empty() {
            (0, 0)
        } else {
            (range.start + 1, range.end)
        };

        Self {
            current_page: page,
            total_pages,
            total_files,
            limit,
            has_next: page < total_pages,
            has_prev: page > 1,
            start_index,
            end_index,
        }
    }
}

/// Offset window `[(page-1)*limit, page*limit)` clamped to `[0, total)`.
pub fn page_range(total: usize, page: usize, limit: usize) -> std::ops::Range<usize> {
    let limit = limit.max(1);
    let start = page.max(1).saturating_sub(1).saturating_mul(limit).min(total);
    let end = start.saturating_add(limit).min(total);
    start..end
}

/// Returns the page slice together with its metadata.
pub fn paginate<T: Clone>(items: &[T], page: usize, limit: usize) -> (Vec<T>, PaginationState) {
    let state = PaginationState::new(items.len(), page, limit);
    let range = page_range(items.len(), page, limit);
    (items[range].to_vec(), state)
}
