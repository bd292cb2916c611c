use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::types::Chamber;

pub const DEFAULT_BASE_URL: &str = "https://www.ncleg.gov";

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "FIREFIGHTERS & FIREFIGHTING",
    "EMERGENCY MEDICAL SERVICES",
    "RESCUE SQUADS",
    "FIREMENS PENSION FUND",
    "PENSION & RETIREMENT FUNDS",
    "9-1-1",
    "EMERGENCY SERVICES",
    "WORKERS' COMPENSATION",
    "CANCER",
];

pub const DEFAULT_MOTIONS: &[Motion] = &[
    Motion::SecondReading,
    Motion::ThirdReading,
    Motion::Concur,
    Motion::ForAdoption,
];

/// Where the chamber's pages live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub base_url: String,
    pub chamber: Chamber,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            chamber: Chamber::House,
        }
    }
}

impl SiteConfig {
    pub fn new(base_url: &str, chamber: Chamber) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            chamber,
        }
    }

    pub fn member_list_url(&self) -> String {
        format!(
            "{}/Members/MemberList/{}",
            self.base_url,
            self.chamber.code()
        )
    }

    pub fn contacts_url(&self) -> String {
        format!(
            "{}/Members/ContactInfo/{}",
            self.base_url,
            self.chamber.code()
        )
    }

    /// Path fragment shared by every biography link in the member list.
    pub fn biography_marker(&self) -> String {
        format!("/Members/Biography/{}/", self.chamber.code())
    }

    pub fn votes_url(&self, legislator_id: &str) -> String {
        format!(
            "{}/Members/Votes/{}/{}",
            self.base_url,
            self.chamber.code(),
            legislator_id
        )
    }
}

/// Picks one cell out of a vote-table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    At(usize),
    Last,
}

impl Column {
    pub fn pick<'a>(&self, cells: &'a [String]) -> &'a str {
        let cell = match self {
            Column::At(i) => cells.get(*i),
            Column::Last => cells.last(),
        };
        cell.map(String::as_str).unwrap_or_default()
    }
}

/// Positional layout of a member's roll-call table:
/// `RCS# | Doc. | Subject/Motion | Date | Vote | Aye | No | ... | Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub min_cells: usize,
    pub roll_call: Column,
    pub motion: Column,
    pub date: Column,
    pub member_vote: Column,
    pub result: Column,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            min_cells: 6,
            roll_call: Column::At(0),
            motion: Column::At(2),
            date: Column::At(3),
            member_vote: Column::At(4),
            result: Column::Last,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error(
    "Invalid motion '{0}'. Accepted values: 'second-reading', 'third-reading', 'concur', 'not-concur', 'for-adoption'"
)]
pub struct MotionParseError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Motion {
    SecondReading,
    ThirdReading,
    Concur,
    NotConcur,
    ForAdoption,
}

impl Motion {
    pub const ALL: [Motion; 5] = [
        Motion::SecondReading,
        Motion::ThirdReading,
        Motion::Concur,
        Motion::NotConcur,
        Motion::ForAdoption,
    ];

    /// Substring looked for in a roll call's subject/motion text.
    pub fn label(&self) -> &'static str {
        match self {
            Motion::SecondReading => "Second Reading",
            Motion::ThirdReading => "Third Reading",
            Motion::Concur => "Concur",
            Motion::NotConcur => "Not Concur",
            Motion::ForAdoption => "For Adoption",
        }
    }
}

impl FromStr for Motion {
    type Err = MotionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "second-reading" => Ok(Motion::SecondReading),
            "third-reading" => Ok(Motion::ThirdReading),
            "concur" => Ok(Motion::Concur),
            "not-concur" => Ok(Motion::NotConcur),
            "for-adoption" => Ok(Motion::ForAdoption),
            _ => Err(MotionParseError(s.to_string())),
        }
    }
}

impl Display for Motion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Topic of interest and the motions whose passing votes are tallied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicConfig {
    pub keywords: Vec<String>,
    pub counted_motions: Vec<Motion>,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            counted_motions: DEFAULT_MOTIONS.to_vec(),
        }
    }
}

impl TopicConfig {
    /// Builds a config from a semicolon-delimited keyword list.
    pub fn new(keywords: &str, counted_motions: Vec<Motion>) -> Self {
        Self {
            keywords: parse_keyword_list(keywords),
            counted_motions,
        }
    }

    pub fn validate(self) -> Result<Self, String> {
        if self.keywords.is_empty() {
            return Err("At least one keyword is required".to_string());
        }
        Ok(self)
    }
}

pub fn parse_keyword_list(raw: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for keyword in raw.split(';').map(|k| k.trim().to_uppercase()) {
        if !keyword.is_empty() && !keywords.contains(&keyword) {
            keywords.push(keyword);
        }
    }
    keywords
}
