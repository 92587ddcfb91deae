use serde::{Deserialize, Serialize};

use super::domain::PostingId;
use super::filter::FilterState;
use super::pager::{self, PageState};

/// Everything the user can change: the filter selection and the current page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetState {
    pub filter: FilterState,
    pub page: PageState,
}

impl WidgetState {
    pub fn new(page_size: usize) -> Self {
        Self {
            filter: FilterState::default(),
            page: PageState::new(page_size),
        }
    }

    /// New filter selection; always starts over at page 1.
    pub fn with_filter(&self, filter: FilterState) -> Self {
        Self {
            filter,
            page: self.page.first(),
        }
    }

    pub fn select_canton(&self, canton: Option<String>) -> Self {
        self.with_filter(FilterState::new(canton, self.filter.profession.clone()))
    }

    pub fn select_profession(&self, profession: Option<String>) -> Self {
        self.with_filter(FilterState::new(self.filter.canton.clone(), profession))
    }

    /// Moves to `target`, rejecting pages outside `[1, max(total_pages, 1)]`.
    pub fn go_to_page(&self, target: usize, total_pages: usize) -> Result<Self, ListingError> {
        if !pager::is_navigable(target, total_pages) {
            return Err(ListingError::PageOutOfRange {
                requested: target,
                total_pages,
            });
        }

        Ok(Self {
            filter: self.filter.clone(),
            page: PageState {
                current: target,
                ..self.page
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListingError {
    #[error("page {requested} is outside the available range 1..={total_pages}")]
    PageOutOfRange { requested: usize, total_pages: usize },
    #[error("posting {0} does not exist")]
    UnknownPosting(PostingId),
}
