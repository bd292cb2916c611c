use std::collections::BTreeSet;
use std::{fmt::Display, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
#[error("Invalid chamber '{0}'. Accepted values: 'house', 'h', 'senate', 's'")]
pub struct ChamberParseError(String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chamber {
    #[default]
    House,
    Senate,
}

impl Chamber {
    /// Single-letter code used in ncleg.gov member URLs.
    pub fn code(&self) -> char {
        match self {
            Chamber::House => 'H',
            Chamber::Senate => 'S',
        }
    }
}

impl FromStr for Chamber {
    type Err = ChamberParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "house" | "h" => Ok(Chamber::House),
            "senate" | "s" => Ok(Chamber::Senate),
            _ => Err(ChamberParseError(s.to_string())),
        }
    }
}

impl Display for Chamber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Chamber::House => write!(f, "House"),
            Chamber::Senate => write!(f, "Senate"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid party '{0}'. Accepted values: 'd', 'r', 'u' or the full party name")]
pub struct PartyParseError(String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    #[serde(rename = "D")]
    Democrat,
    #[serde(rename = "R")]
    Republican,
    #[serde(rename = "U")]
    Unaffiliated,
    #[default]
    #[serde(rename = "")]
    Unknown,
}

impl Party {
    /// Maps the parenthesised marker printed after a member's name.
    /// Independent members are folded into `Unaffiliated`.
    pub fn from_marker(marker: &str) -> Party {
        match marker.trim() {
            "D" => Party::Democrat,
            "R" => Party::Republican,
            "Unaffiliated" | "Independent" => Party::Unaffiliated,
            _ => Party::Unknown,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Party::Democrat => "D",
            Party::Republican => "R",
            Party::Unaffiliated => "U",
            Party::Unknown => "",
        }
    }
}

impl FromStr for Party {
    type Err = PartyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "d" | "democrat" | "democratic" => Ok(Party::Democrat),
            "r" | "republican" => Ok(Party::Republican),
            "u" | "unaffiliated" | "independent" => Ok(Party::Unaffiliated),
            _ => Err(PartyParseError(s.to_string())),
        }
    }
}

impl Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legislator {
    pub id: String,
    pub name: String,
    pub party: Party,
    pub district: String,
    pub counties: Vec<String>,
    pub office_phone: String,
    pub assistant: String,
    pub profile_url: String,
    pub votes_url: String,
    pub email: Option<String>,
    pub contact_phone: Option<String>,
}

impl Legislator {
    pub fn counties_joined(&self) -> String {
        self.counties.join(", ")
    }
}

impl Display for Legislator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if self.party != Party::Unknown {
            write!(f, " ({})", self.party)?;
        }
        if !self.district.is_empty() {
            write!(f, " — District {}", self.district)?;
        }
        if !self.counties.is_empty() {
            write!(f, " [{}]", self.counties_joined())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillMetadata {
    pub url: String,
    pub keywords: BTreeSet<String>,
    pub short_title: String,
}

impl BillMetadata {
    pub fn empty(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn keywords_joined(&self) -> String {
        self.keywords
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl Display for BillMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.short_title.is_empty() {
            write!(f, "{}", self.url)
        } else {
            write!(f, "{} — {}", self.short_title, self.url)
        }
    }
}

/// Layouts seen in the roll-call date column, most specific first.
const VOTE_DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub legislator_id: String,
    pub roll_call: String,
    pub bill: String,
    pub bill_url: Option<String>,
    pub motion: String,
    pub date: String,
    pub member_vote: String,
    pub result: String,
}

impl VoteRecord {
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        let date = self.date.trim();
        VOTE_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(date, fmt).ok())
            .or_else(|| {
                ["%m/%d/%Y", "%Y-%m-%d"]
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }
}

impl Display for VoteRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} — {} — {} [{}] {}",
            self.roll_call, self.date, self.bill, self.motion, self.member_vote, self.result
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str) -> VoteRecord {
        VoteRecord {
            legislator_id: "1".into(),
            roll_call: "1".into(),
            bill: "HB 1".into(),
            bill_url: None,
            motion: String::new(),
            date: date.into(),
            member_vote: String::new(),
            result: String::new(),
        }
    }

    #[test]
    fn test_party_from_marker() {
        assert_eq!(Party::from_marker("R"), Party::Republican);
        assert_eq!(Party::from_marker("D"), Party::Democrat);
        assert_eq!(Party::from_marker("Independent"), Party::Unaffiliated);
        assert_eq!(Party::from_marker("Unaffiliated"), Party::Unaffiliated);
        assert_eq!(Party::from_marker("L"), Party::Unknown);
    }

    #[test]
    fn test_party_from_str() {
        assert_eq!("d".parse::<Party>().unwrap(), Party::Democrat);
        assert_eq!("Republican".parse::<Party>().unwrap(), Party::Republican);
        assert!("green".parse::<Party>().is_err());
    }

    #[test]
    fn test_chamber_codes() {
        assert_eq!("senate".parse::<Chamber>().unwrap().code(), 'S');
        assert_eq!("H".parse::<Chamber>().unwrap(), Chamber::House);
        assert!("assembly".parse::<Chamber>().is_err());
    }

    #[test]
    fn test_vote_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 5)
            .unwrap()
            .and_hms_opt(14, 31, 10)
            .unwrap();
        assert_eq!(record("03/05/2025 02:31:10 PM").timestamp(), Some(expected));
        assert_eq!(record("2025-03-05 14:31:10").timestamp(), Some(expected));
        assert_eq!(
            record("03/05/2025").timestamp(),
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(record("yesterday").timestamp(), None);
    }

    #[test]
    fn test_keywords_joined_sorted() {
        let meta = BillMetadata {
            url: "u".into(),
            keywords: ["CANCER".to_string(), "9-1-1".to_string()].into(),
            short_title: String::new(),
        };
        assert_eq!(meta.keywords_joined(), "9-1-1; CANCER");
    }
}
