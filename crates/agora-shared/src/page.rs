use serde::{Deserialize, Serialize};

/// `?page=&page_size=` query parameters. Both are 1-based and optional.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageQuery {
    /// Resolve to `(page, page_size)`, clamping out-of-range values.
    pub fn resolve(&self, default_size: u32, max_size: u32) -> (u32, u32) {
        let max_size = max_size.max(1);
        let size = self
            .page_size
            .unwrap_or(default_size)
            .clamp(1, max_size);
        let page = self.page.unwrap_or(1).max(1);
        (page, size)
    }
}

/// Page-number pagination envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: u64, page: u32, page_size: u32) -> Self {
        let seen = u64::from(page) * u64::from(page_size);
        Self {
            count,
            next: (seen < count).then_some(page + 1),
            previous: (page > 1).then(|| page - 1),
            results,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// SQL `LIMIT` / `OFFSET` for a resolved page.
pub fn limit_offset(page: u32, page_size: u32) -> (i64, i64) {
    let limit = i64::from(page_size);
    (limit, i64::from(page.saturating_sub(1)) * limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_clamps() {
        let q = PageQuery {
            page: Some(0),
            page_size: Some(1000),
        };
        assert_eq!(q.resolve(10, 100), (1, 100));
        assert_eq!(PageQuery::default().resolve(10, 100), (1, 10));
    }

    #[test]
    fn next_and_previous() {
        let p: Page<u8> = Page::new(vec![1, 2], 5, 2, 2);
        assert_eq!(p.next, Some(3));
        assert_eq!(p.previous, Some(1));

        let last: Page<u8> = Page::new(vec![5], 5, 3, 2);
        assert_eq!(last.next, None);
    }

    #[test]
    fn offsets() {
        assert_eq!(limit_offset(1, 10), (10, 0));
        assert_eq!(limit_offset(3, 10), (10, 20));
    }
}
