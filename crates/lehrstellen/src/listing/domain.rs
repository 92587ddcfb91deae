use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::canton::CantonIndex;

/// Position of a posting inside the fetched dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostingId(pub usize);

impl fmt::Display for PostingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One apprenticeship place as published by the career guidance dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    #[serde(skip)]
    pub id: PostingId,
    #[serde(rename = "professionNameDeMf", default, deserialize_with = "scalar_string")]
    pub profession: String,
    #[serde(flatten)]
    pub location: Location,
    #[serde(
        rename = "apprenticeshipPlaceSchoolYears",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub open_apprenticeships: Vec<OpenApprenticeship>,
    #[serde(flatten)]
    pub contact: ContactFields,
}

impl Posting {
    /// A posting is "open" when it carries at least one open apprenticeship entry.
    pub fn is_open(&self) -> bool {
        !self.open_apprenticeships.is_empty()
    }

    pub fn first_open_entry(&self) -> Option<&OpenApprenticeship> {
        self.open_apprenticeships.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "locationName", default, deserialize_with = "scalar_string")]
    pub name: String,
    #[serde(rename = "locationStreet", default, deserialize_with = "scalar_string")]
    pub street: String,
    #[serde(
        rename = "locationHouseNumber",
        default,
        deserialize_with = "scalar_string"
    )]
    pub house_number: String,
    #[serde(rename = "locationZipCode", default, deserialize_with = "scalar_string")]
    pub zip_code: String,
    #[serde(
        rename = "locationLocalityNameDe",
        default,
        deserialize_with = "scalar_string"
    )]
    pub locality: String,
}

impl Location {
    pub fn street_line(&self) -> String {
        join_non_empty(&self.street, &self.house_number)
    }

    pub fn locality_line(&self) -> String {
        join_non_empty(&self.zip_code, &self.locality)
    }
}

/// An actively open position, usually for a given school year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenApprenticeship {
    #[serde(default, alias = "schoolYear", deserialize_with = "optional_year")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub url: Option<String>,
}

/// Optional application-side and location-side contact fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFields {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub application_person_firstname: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub application_person_lastname: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub location_contact_person_firstname: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub location_contact_person_lastname: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub application_email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub location_email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub application_business_phone: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub location_business_phone: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub application_url: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub location_url: Option<String>,
}

/// Immutable snapshot of everything fetched at startup.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    postings: Vec<Posting>,
    cantons: CantonIndex,
    professions: Vec<String>,
}

impl Dataset {
    /// Assigns ids by position and derives the profession options from the postings.
    pub fn new(postings: Vec<Posting>, cantons: CantonIndex) -> Self {
        let postings: Vec<Posting> = postings
            .into_iter()
            .enumerate()
            .map(|(index, mut posting)| {
                posting.id = PostingId(index);
                posting
            })
            .collect();

        let professions = postings
            .iter()
            .map(|posting| posting.profession.as_str())
            .filter(|profession| !profession.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_owned)
            .collect();

        Self {
            postings,
            cantons,
            professions,
        }
    }

    /// Replaces the derived profession options with an explicit list.
    pub fn with_profession_options(mut self, professions: Vec<String>) -> Self {
        self.professions = professions;
        self
    }

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    pub fn cantons(&self) -> &CantonIndex {
        &self.cantons
    }

    pub fn profession_options(&self) -> &[String] {
        &self.professions
    }

    pub fn posting(&self, id: PostingId) -> Option<&Posting> {
        self.postings.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}

fn join_non_empty(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (false, false) => format!("{left} {right}"),
        (false, true) => left.to_owned(),
        (true, false) => right.to_owned(),
        (true, true) => String::new(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(value) => value,
            Scalar::Integer(value) => value.to_string(),
            Scalar::Float(value) if value.fract() == 0.0 => format!("{value:.0}"),
            Scalar::Float(value) => value.to_string(),
            Scalar::Flag(value) => value.to_string(),
        }
    }
}

fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<Scalar>::deserialize(deserializer)?;
    Ok(opt.map(Scalar::into_text).unwrap_or_default())
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<Scalar>::deserialize(deserializer)?;
    Ok(opt
        .map(Scalar::into_text)
        .filter(|value| !value.trim().is_empty()))
}

fn optional_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<Scalar>::deserialize(deserializer)?;
    Ok(opt.and_then(|value| value.into_text().trim().parse().ok()))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let opt = Option::<Vec<T>>::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}
