pub mod canton;
pub mod domain;
pub mod filter;
pub mod grouping;
pub mod pager;
pub mod session;
pub mod source;
pub mod state;
pub mod view;

pub use canton::CantonIndex;
pub use domain::{ContactFields, Dataset, Location, OpenApprenticeship, Posting, PostingId};
pub use filter::FilterState;
pub use grouping::{group, split_page, GroupedPostings};
pub use pager::{
    paginate, total_pages, window_of, PageState, PageWindow, PaginationControls,
    DEFAULT_PAGE_SIZE, MAX_VISIBLE_PAGES,
};
pub use session::{ListingSession, Ticket, Transition, TransitionGate, WidgetPhase};
pub use source::{
    load_dataset, DataLocation, DatasetSource, JsonSource, LoadState, SourceError, StaticSource,
};
pub use state::{ListingError, WidgetState};
pub use view::{contact_view, derive_view, ContactView, PostingCard, ViewModel};
