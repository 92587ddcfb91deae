use serde::{Deserialize, Serialize};

use super::canton::CantonIndex;
use super::domain::Posting;

/// Selected canton and profession. `None` or an empty string means "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub canton: Option<String>,
    #[serde(default)]
    pub profession: Option<String>,
}

impl FilterState {
    pub fn new(canton: Option<String>, profession: Option<String>) -> Self {
        Self {
            canton: canton.filter(|value| !value.is_empty()),
            profession: profession.filter(|value| !value.is_empty()),
        }
    }

    pub fn selected_canton(&self) -> Option<&str> {
        selection(&self.canton)
    }

    pub fn selected_profession(&self) -> Option<&str> {
        selection(&self.profession)
    }

    /// Canton membership by ZIP code AND exact, case-sensitive profession match.
    pub fn matches(&self, posting: &Posting, cantons: &CantonIndex) -> bool {
        let canton_ok = self
            .selected_canton()
            .map_or(true, |canton| cantons.contains(canton, &posting.location.zip_code));
        let profession_ok = self
            .selected_profession()
            .map_or(true, |profession| posting.profession == profession);
        canton_ok && profession_ok
    }

    /// Keeps the postings that match, preserving their order.
    pub fn apply<'a, I>(&self, postings: I, cantons: &CantonIndex) -> Vec<&'a Posting>
    where
        I: IntoIterator<Item = &'a Posting>,
    {
        postings
            .into_iter()
            .filter(|posting| self.matches(posting, cantons))
            .collect()
    }
}

fn selection(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}
