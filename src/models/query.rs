//! Traffic query configuration.
//!
//! A [`TrafficQuery`] scopes one traffic lookup: series granularity, date range,
//! country and the provider's boolean switches. It is built once per invocation
//! and shared read-only by every per-domain lookup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error_handling::QueryError;

/// Time-series granularity of a traffic lookup.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Granularity {
    /// One point per day
    Daily,
    /// One point per week
    Weekly,
    /// One point per month (default)
    #[default]
    Monthly,
}

/// A calendar month written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Builds a month, rejecting months outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self, QueryError> {
        if !(1..=12).contains(&month) || !(1000..=9999).contains(&year) {
            return Err(QueryError::InvalidYearMonth(format!("{year}-{month}")));
        }
        Ok(Self { year, month })
    }

    /// Calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month of the year (1-12).
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Reads the `YYYY-MM` prefix of a provider date such as `2023-04-01`.
    pub fn from_date_prefix(date: &str) -> Option<Self> {
        date.get(..7).and_then(|prefix| prefix.parse().ok())
    }
}

impl FromStr for YearMonth {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || QueryError::InvalidYearMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Country scope of a traffic lookup: worldwide or one ISO 3166-1 alpha-2 code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Country {
    /// All countries (`world`)
    #[default]
    World,
    /// Lower-cased two-letter code, e.g. `us`
    Code(String),
}

impl FromStr for Country {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized == "world" {
            return Ok(Country::World);
        }
        if normalized.len() == 2 && normalized.chars().all(|c| c.is_ascii_alphabetic()) {
            return Ok(Country::Code(normalized));
        }
        Err(QueryError::InvalidCountry(s.to_string()))
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Country::World => f.write_str("world"),
            Country::Code(code) => f.write_str(code),
        }
    }
}

impl TryFrom<String> for Country {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Country> for String {
    fn from(value: Country) -> Self {
        value.to_string()
    }
}

/// The only response format the traffic client knows how to decode.
pub const JSON_FORMAT: &str = "json";

/// How a traffic lookup is scoped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficQuery {
    /// Series granularity
    pub granularity: Granularity,
    /// Restrict the series to the main domain (exclude subdomains)
    pub main_domain_only: bool,
    /// Include the current, incomplete month
    #[serde(rename = "mtd")]
    pub month_to_date: bool,
    /// Only return verified data
    pub show_verified: bool,
    /// Response format requested from the provider
    pub format: String,
    /// First month of the series (inclusive)
    pub start_date: Option<YearMonth>,
    /// Last month of the series (inclusive)
    pub end_date: Option<YearMonth>,
    /// Country scope
    pub country: Country,
}

impl Default for TrafficQuery {
    fn default() -> Self {
        Self {
            granularity: Granularity::Monthly,
            main_domain_only: false,
            month_to_date: false,
            show_verified: false,
            format: JSON_FORMAT.to_string(),
            start_date: None,
            end_date: None,
            country: Country::World,
        }
    }
}

/// Per-invocation overrides applied on top of the configured default query.
#[derive(Debug, Clone, Default)]
pub struct QueryOverrides {
    /// Replaces the granularity
    pub granularity: Option<Granularity>,
    /// Replaces the first month
    pub start_date: Option<YearMonth>,
    /// Replaces the last month
    pub end_date: Option<YearMonth>,
    /// Replaces the country
    pub country: Option<Country>,
    /// Replaces `main_domain_only`
    pub main_domain_only: Option<bool>,
    /// Replaces `month_to_date`
    pub month_to_date: Option<bool>,
    /// Replaces `show_verified`
    pub show_verified: Option<bool>,
}

impl TrafficQuery {
    /// Checks the query is something the traffic client can send.
    pub fn validate(&self) -> Result<(), QueryError> {
        if !self.format.eq_ignore_ascii_case(JSON_FORMAT) {
            return Err(QueryError::UnsupportedFormat(self.format.clone()));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(QueryError::InvalidRange { start, end });
            }
        }
        Ok(())
    }

    /// Returns a copy with the given overrides applied, validated.
    pub fn with_overrides(&self, overrides: QueryOverrides) -> Result<Self, QueryError> {
        let query = Self {
            granularity: overrides.granularity.unwrap_or(self.granularity),
            main_domain_only: overrides.main_domain_only.unwrap_or(self.main_domain_only),
            month_to_date: overrides.month_to_date.unwrap_or(self.month_to_date),
            show_verified: overrides.show_verified.unwrap_or(self.show_verified),
            format: self.format.clone(),
            start_date: overrides.start_date.or(self.start_date),
            end_date: overrides.end_date.or(self.end_date),
            country: overrides.country.unwrap_or_else(|| self.country.clone()),
        };
        query.validate()?;
        Ok(query)
    }

    /// True when `month` falls inside the requested range (open ends match everything).
    pub fn covers(&self, month: YearMonth) -> bool {
        self.start_date.map_or(true, |start| month >= start)
            && self.end_date.map_or(true, |end| month <= end)
    }
}
