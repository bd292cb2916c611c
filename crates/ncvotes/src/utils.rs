use std::collections::HashSet;

use crate::aggregate::RollCallMatrix;
use crate::types::{Legislator, Party};

#[derive(Debug, Default)]
pub struct LegislatorFilter {
    pub parties: Vec<Party>,
    pub district: Option<String>,
    pub county: Option<String>,
    pub name: Option<String>,
    pub limit: Option<usize>,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl LegislatorFilter {
    pub fn apply(&self, mut legislators: Vec<Legislator>) -> Vec<Legislator> {
        if !self.parties.is_empty() {
            legislators.retain(|l| self.parties.contains(&l.party));
        }
        if let Some(district) = &self.district {
            legislators.retain(|l| contains_ci(&l.district, district));
        }
        if let Some(county) = &self.county {
            legislators.retain(|l| contains_ci(&l.counties_joined(), county));
        }
        if let Some(name) = &self.name {
            legislators.retain(|l| contains_ci(&l.name, name));
        }
        if let Some(lim) = self.limit {
            legislators.truncate(lim);
        }
        legislators
    }

    pub fn validate(self) -> Result<Self, String> {
        if self.limit.is_some_and(|l| l == 0) {
            return Err("Limit must be greater than 0".to_string());
        }
        Ok(self)
    }
}

#[derive(Debug)]
pub struct MatrixStats {
    pub bills: usize,
    pub members: usize,
    pub supports: usize,
    pub opposes: usize,
    pub no_vote: usize,
}

impl MatrixStats {
    pub fn from_matrix(matrix: &RollCallMatrix) -> MatrixStats {
        let bills: HashSet<&str> = matrix.rows.iter().map(|r| r.bill_page.as_str()).collect();
        let members: HashSet<&str> = matrix.rows.iter().map(|r| r.member.as_str()).collect();
        MatrixStats {
            bills: bills.len(),
            members: members.len(),
            supports: matrix.rows.iter().filter(|r| r.vote == "Aye").count(),
            opposes: matrix.rows.iter().filter(|r| r.vote == "No").count(),
            no_vote: matrix.rows.iter().filter(|r| r.vote.is_empty()).count(),
        }
    }
}

impl std::fmt::Display for MatrixStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "\nMatrix built for {} bills across {} members:",
            self.bills, self.members
        )?;
        writeln!(f, "  Aye:     {}", self.supports)?;
        writeln!(f, "  No:      {}", self.opposes)?;
        writeln!(f, "  No vote: {}", self.no_vote)
    }
}
