use serde::Serialize;

use super::domain::{Dataset, Posting, PostingId};
use super::filter::FilterState;
use super::grouping::{group, split_page};
use super::pager::{self, PaginationControls};
use super::state::{ListingError, WidgetState};

/// Everything a renderer needs for one frame of the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub filter: FilterState,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub open: Vec<PostingCard>,
    pub other: Vec<PostingCard>,
    pub pagination: Option<PaginationControls>,
    pub canton_options: Vec<String>,
    pub profession_options: Vec<String>,
}

impl ViewModel {
    pub fn is_empty(&self) -> bool {
        self.open.is_empty() && self.other.is_empty()
    }

    /// Cards on this page in display order.
    pub fn cards(&self) -> impl Iterator<Item = &PostingCard> {
        self.open.iter().chain(self.other.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostingCard {
    pub id: PostingId,
    pub profession: String,
    pub location_name: String,
    pub street_line: String,
    pub locality_line: String,
    pub open_apprenticeship: bool,
    pub open_year: Option<i32>,
}

impl From<&Posting> for PostingCard {
    fn from(posting: &Posting) -> Self {
        Self {
            id: posting.id,
            profession: posting.profession.clone(),
            location_name: posting.location.name.clone(),
            street_line: posting.location.street_line(),
            locality_line: posting.location.locality_line(),
            open_apprenticeship: posting.is_open(),
            open_year: posting.first_open_entry().and_then(|entry| entry.year),
        }
    }
}

/// Contact overlay content. Absent fields have nothing to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactView {
    #[serde(flatten)]
    pub card: PostingCard,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

impl From<&Posting> for ContactView {
    fn from(posting: &Posting) -> Self {
        let contact = &posting.contact;
        let first_open = posting.first_open_entry();

        let first_name = contact
            .application_person_firstname
            .as_ref()
            .or(contact.location_contact_person_firstname.as_ref());
        let last_name = contact
            .application_person_lastname
            .as_ref()
            .or(contact.location_contact_person_lastname.as_ref());
        let contact_name = match (first_name, last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (first, last) => first.or(last).cloned(),
        };

        let email = first_open
            .and_then(|entry| entry.email.clone())
            .or_else(|| contact.application_email.clone())
            .or_else(|| contact.location_email.clone());
        let phone = contact
            .application_business_phone
            .clone()
            .or_else(|| contact.location_business_phone.clone());
        let website = first_open
            .and_then(|entry| entry.url.clone())
            .or_else(|| contact.application_url.clone())
            .or_else(|| contact.location_url.clone());

        Self {
            card: PostingCard::from(posting),
            contact_name,
            email,
            phone,
            website,
        }
    }
}

/// Filter, group open-first, clamp the page, slice it, and split the slice back into sections.
pub fn derive_view(dataset: &Dataset, state: &WidgetState) -> ViewModel {
    let filtered = state
        .filter
        .apply(dataset.postings(), dataset.cantons());
    let ordered = group(filtered).ordered();

    let page = state.page.clamp_to(ordered.len());
    let slice = pager::paginate(&ordered, page.current, page.page_size);
    let sections = split_page(slice);

    ViewModel {
        filter: state.filter.clone(),
        page: page.current,
        page_size: page.page_size,
        total_items: ordered.len(),
        total_pages: page.total_pages(ordered.len()),
        open: sections.open.into_iter().map(PostingCard::from).collect(),
        other: sections.other.into_iter().map(PostingCard::from).collect(),
        pagination: pager::controls(page.current, ordered.len(), page.page_size),
        canton_options: dataset.cantons().canton_codes().map(str::to_owned).collect(),
        profession_options: dataset.profession_options().to_vec(),
    }
}

/// Number of postings matching `filter`, without building cards.
pub fn matching_count(dataset: &Dataset, filter: &FilterState) -> usize {
    dataset
        .postings()
        .iter()
        .filter(|posting| filter.matches(posting, dataset.cantons()))
        .count()
}

pub fn contact_view(dataset: &Dataset, id: PostingId) -> Result<ContactView, ListingError> {
    dataset
        .posting(id)
        .map(ContactView::from)
        .ok_or(ListingError::UnknownPosting(id))
}
