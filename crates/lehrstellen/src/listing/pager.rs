use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_VISIBLE_PAGES: usize = 7;

/// 1-based current page plus the fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub current: usize,
    pub page_size: usize,
}

impl PageState {
    pub fn new(page_size: usize) -> Self {
        Self {
            current: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn first(self) -> Self {
        Self { current: 1, ..self }
    }

    pub fn total_pages(&self, count: usize) -> usize {
        total_pages(count, self.page_size)
    }

    /// Clamps the current page into `[1, total_pages(count)]`.
    pub fn clamp_to(self, count: usize) -> Self {
        let last = self.total_pages(count).max(1);
        Self {
            current: self.current.clamp(1, last),
            ..self
        }
    }
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

/// Elements `[(page-1)*size, page*size)` clipped to the sequence. Page 0 is empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let Some(offset) = page.checked_sub(1) else {
        return &[];
    };
    let start = offset.saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Inclusive range of page buttons to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub start: usize,
    pub end: usize,
}

impl PageWindow {
    pub fn pages(&self) -> impl Iterator<Item = usize> {
        self.start..=self.end
    }

    pub fn len(&self) -> usize {
        (self.end + 1).saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Window of at most `max_visible` pages centered on `current`, clamped to `[1, total_pages]`.
pub fn window_of(current: usize, total_pages: usize, max_visible: usize) -> PageWindow {
    let max_visible = max_visible.max(1);
    let mut start = current.saturating_sub(max_visible / 2).max(1);
    let mut end = start + max_visible - 1;

    if end > total_pages {
        end = total_pages;
        start = (end + 1).saturating_sub(max_visible).max(1);
    }

    PageWindow { start, end }
}

/// Navigation controls; only produced when there is more than one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationControls {
    pub current: usize,
    pub total_pages: usize,
    pub window: PageWindow,
    /// `None` when the previous button is disabled.
    pub previous: Option<usize>,
    /// `None` when the next button is disabled.
    pub next: Option<usize>,
}

pub fn controls(current: usize, count: usize, page_size: usize) -> Option<PaginationControls> {
    let total = total_pages(count, page_size);
    if total <= 1 {
        return None;
    }

    Some(PaginationControls {
        current,
        total_pages: total,
        window: window_of(current, total, MAX_VISIBLE_PAGES),
        previous: (current > 1).then(|| current - 1),
        next: (current < total).then(|| current + 1),
    })
}

/// Whether `page` is a valid navigation target for `total_pages` pages.
pub fn is_navigable(page: usize, total_pages: usize) -> bool {
    (1..=total_pages.max(1)).contains(&page)
}
