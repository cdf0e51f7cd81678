/// One page of a listing plus the figures needed for the pagination envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-indexed.
    pub page: u32,
    pub page_size: u32,
    /// Matching records across all pages.
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, page_size: u32, total_items: u64) -> Self {
        Self {
            items,
            page,
            page_size,
            total_items,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_items.div_ceil(u64::from(self.page_size))
    }

    /// Replaces the items wholesale, keeping the pagination figures.
    pub fn map_items<U>(self, f: impl FnOnce(Vec<T>) -> Vec<U>) -> Page<U> {
        Page {
            items: f(self.items),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
        }
    }
}
