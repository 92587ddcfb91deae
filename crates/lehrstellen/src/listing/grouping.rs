use super::domain::Posting;

/// Stable partition of a filtered view into open and other postings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedPostings<'a> {
    pub open: Vec<&'a Posting>,
    pub other: Vec<&'a Posting>,
}

impl<'a> GroupedPostings<'a> {
    pub fn len(&self) -> usize {
        self.open.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty() && self.other.is_empty()
    }

    /// Open postings followed by the rest; the order the pager slices.
    pub fn ordered(&self) -> Vec<&'a Posting> {
        self.open.iter().chain(self.other.iter()).copied().collect()
    }
}

/// Splits postings by open status, keeping the relative order inside each group.
pub fn group<'a, I>(view: I) -> GroupedPostings<'a>
where
    I: IntoIterator<Item = &'a Posting>,
{
    let (open, other): (Vec<&Posting>, Vec<&Posting>) =
        view.into_iter().partition(|posting| posting.is_open());
    GroupedPostings { open, other }
}

/// Re-splits one page of the ordered sequence into its open and other sections.
pub fn split_page<'a>(page: &[&'a Posting]) -> GroupedPostings<'a> {
    group(page.iter().copied())
}
