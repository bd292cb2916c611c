use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::classify::{Category, Relevance, classify, counting_category, tally};
use crate::config::TopicConfig;
use crate::scraper::PageSource;
use crate::session::Session;
use crate::types::{BillMetadata, Legislator, Party, VoteRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrilldownRow {
    #[serde(rename = "Bill")]
    pub bill: String,
    #[serde(rename = "Short Title")]
    pub short_title: String,
    #[serde(rename = "Motion")]
    pub motion: String,
    #[serde(rename = "Member Vote")]
    pub member_vote: String,
    #[serde(rename = "Counted As")]
    pub counted_as: String,
    #[serde(rename = "Result")]
    pub result: String,
    #[serde(rename = "Bill Page")]
    pub bill_page: String,
    #[serde(rename = "Keywords")]
    pub keywords: String,
    #[serde(skip)]
    pub category: Option<Category>,
}

impl Display for DrilldownRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bill)?;
        if !self.short_title.is_empty() {
            write!(f, " — {}", self.short_title)?;
        }
        write!(
            f,
            " | {} | {} | {}",
            self.motion, self.counted_as, self.result
        )
    }
}

/// One legislator's topic-relevant votes and the bills they touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drilldown {
    pub rows: Vec<DrilldownRow>,
    pub bills: Vec<BillMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRow {
    #[serde(rename = "Member")]
    pub member: String,
    #[serde(rename = "Party")]
    pub party: Party,
    #[serde(rename = "District")]
    pub district: String,
    #[serde(rename = "Bill Page")]
    pub bill_page: String,
    #[serde(rename = "Bill Title")]
    pub bill_title: String,
    #[serde(rename = "Vote")]
    pub vote: String,
}

impl Display for MatrixRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let vote = if self.vote.is_empty() { "—" } else { self.vote.as_str() };
        write!(
            f,
            "{} ({}) District {} | {} | {}",
            self.member, self.party, self.district, self.bill_title, vote
        )
    }
}

/// Dense legislator × topic-bill table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollCallMatrix {
    pub bills: Vec<BillMetadata>,
    pub rows: Vec<MatrixRow>,
}

impl RollCallMatrix {
    /// Orders rows by bill title, then party, then member name.
    pub fn sort_for_display(&mut self) {
        self.rows.sort_by(|a, b| {
            (&a.bill_title, a.party.code(), &a.member).cmp(&(
                &b.bill_title,
                b.party.code(),
                &b.member,
            ))
        });
    }
}

fn distinct_bill_urls<'a>(votes: impl IntoIterator<Item = &'a VoteRecord>) -> Vec<String> {
    let mut seen = HashSet::new();
    votes
        .into_iter()
        .filter_map(|v| v.bill_url.as_deref())
        .filter(|url| seen.insert(*url))
        .map(str::to_string)
        .collect()
}

pub async fn drilldown<S: PageSource>(
    session: &Session<S>,
    legislator_id: &str,
    config: &TopicConfig,
) -> Drilldown {
    let votes = session.vote_history(legislator_id).await;

    let mut bills = Vec::new();
    for url in distinct_bill_urls(votes.iter()) {
        bills.push(session.bill_metadata(&url).await);
    }
    let by_url: HashMap<&str, &BillMetadata> =
        bills.iter().map(|b| (b.url.as_str(), b)).collect();

    let mut rows: Vec<DrilldownRow> = votes
        .iter()
        .filter_map(|record| {
            let meta = record
                .bill_url
                .as_deref()
                .and_then(|url| by_url.get(url).copied());
            let classified = classify(record, meta, config, Relevance::WithTitleFallback);
            if !classified.topic_relevant {
                return None;
            }
            Some(DrilldownRow {
                bill: record.bill.clone(),
                short_title: meta.map(|m| m.short_title.clone()).unwrap_or_default(),
                motion: record.motion.clone(),
                member_vote: record.member_vote.clone(),
                counted_as: classified.counted_as,
                result: record.result.clone(),
                bill_page: record.bill_url.clone().unwrap_or_default(),
                keywords: meta.map(BillMetadata::keywords_joined).unwrap_or_default(),
                category: Some(classified.category),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        let rank = |r: &DrilldownRow| r.category.map_or(2, |c| c.priority());
        rank(a).cmp(&rank(b)).then_with(|| a.bill.cmp(&b.bill))
    });

    log::info!(
        "{} topic-relevant votes across {} bills for member {}",
        rows.len(),
        bills.len(),
        legislator_id
    );

    Drilldown { rows, bills }
}

/// Latest counted vote on `bill_url`; equal or unparsable dates fall back to
/// table order, last row winning.
pub fn last_counted_vote<'a>(
    votes: &'a [VoteRecord],
    bill_url: &str,
    config: &TopicConfig,
) -> Option<&'a VoteRecord> {
    votes
        .iter()
        .filter(|v| v.bill_url.as_deref() == Some(bill_url))
        .filter(|v| counting_category(v, config).is_counted())
        .fold(None, |best: Option<&VoteRecord>, v| match best {
            Some(b) if b.timestamp() > v.timestamp() => Some(b),
            _ => Some(v),
        })
}

/// "Aye", "No", the verbatim vote text, or empty when no counted vote exists.
pub fn matrix_status(vote: Option<&VoteRecord>) -> String {
    match vote {
        None => String::new(),
        Some(v) => match tally(&v.member_vote) {
            Category::Support => "Aye".to_string(),
            Category::Oppose => "No".to_string(),
            _ => v.member_vote.clone(),
        },
    }
}

pub async fn roll_call_matrix<S: PageSource>(
    session: &Session<S>,
    legislators: &[Legislator],
    config: &TopicConfig,
    concurrency: usize,
) -> RollCallMatrix {
    let concurrency = concurrency.max(1);

    log::info!(
        "Loading vote histories for {} members...",
        legislators.len()
    );
    let histories: Vec<_> = stream::iter(legislators)
        .map(|l| session.vote_history(&l.id))
        .buffered(concurrency)
        .collect()
        .await;

    let urls = distinct_bill_urls(histories.iter().flat_map(|h| h.iter()));
    log::info!("Checking keywords on {} distinct bills...", urls.len());
    let bills: Vec<BillMetadata> = stream::iter(&urls)
        .map(|url| session.bill_metadata(url))
        .buffered(concurrency)
        .filter(|meta| futures::future::ready(config.matches_keywords(meta)))
        .collect()
        .await;

    let mut rows = Vec::with_capacity(legislators.len() * bills.len());
    for (legislator, history) in legislators.iter().zip(&histories) {
        for bill in &bills {
            let vote = last_counted_vote(history, &bill.url, config);
            rows.push(MatrixRow {
                member: legislator.name.clone(),
                party: legislator.party,
                district: legislator.district.clone(),
                bill_page: bill.url.clone(),
                bill_title: bill.short_title.clone(),
                vote: matrix_status(vote),
            });
        }
    }

    log::info!(
        "Matrix built for {} bills across {} members",
        bills.len(),
        legislators.len()
    );

    RollCallMatrix { bills, rows }
}
