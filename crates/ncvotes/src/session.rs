use std::sync::Arc;

use crate::cache::Cache;
use crate::config::{ColumnSchema, SiteConfig};
use crate::parser::{
    merge_contacts, parse_bill_metadata, parse_contacts, parse_roster, parse_vote_history,
};
use crate::scraper::{FetchError, Fetcher, HttpSource, PageSource};
use crate::types::{BillMetadata, Contact, Legislator, VoteRecord};

/// Everything fetched or derived during one run, plus the means to drop it.
///
/// Roster and contacts failures propagate; vote-history and bill-page
/// failures degrade to empty data so a single bad page cannot stall an
/// aggregation.
#[derive(Debug)]
pub struct Session<S> {
    fetcher: Fetcher<S>,
    site: SiteConfig,
    schema: ColumnSchema,
    rosters: Cache<String, Arc<Vec<Legislator>>>,
    contacts: Cache<String, Arc<Vec<Contact>>>,
    votes: Cache<String, Arc<Vec<VoteRecord>>>,
    bills: Cache<String, BillMetadata>,
}

impl Session<HttpSource> {
    pub fn connect(site: SiteConfig) -> Result<Self, FetchError> {
        Ok(Self::new(HttpSource::new()?, site, ColumnSchema::default()))
    }
}

impl<S: PageSource> Session<S> {
    pub fn new(source: S, site: SiteConfig, schema: ColumnSchema) -> Self {
        Self {
            fetcher: Fetcher::new(source),
            site,
            schema,
            rosters: Cache::new(),
            contacts: Cache::new(),
            votes: Cache::new(),
            bills: Cache::new(),
        }
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub fn fetcher(&self) -> &Fetcher<S> {
        &self.fetcher
    }

    pub async fn roster(&self) -> Result<Arc<Vec<Legislator>>, FetchError> {
        let url = self.site.member_list_url();
        if let Some(roster) = self.rosters.get(&url) {
            return Ok(roster);
        }

        log::info!("Fetching {} member list...", self.site.chamber);
        let html = self.fetcher.fetch(&url).await?;
        let roster = parse_roster(&html, &self.site);
        log::info!("Parsed {} members", roster.len());

        Ok(self.rosters.insert(url, Arc::new(roster)))
    }

    pub async fn contacts(&self) -> Result<Arc<Vec<Contact>>, FetchError> {
        let url = self.site.contacts_url();
        if let Some(contacts) = self.contacts.get(&url) {
            return Ok(contacts);
        }

        log::info!("Fetching {} contact list...", self.site.chamber);
        let html = self.fetcher.fetch(&url).await?;
        let contacts = parse_contacts(&html);
        log::info!("Parsed {} contacts", contacts.len());

        Ok(self.contacts.insert(url, Arc::new(contacts)))
    }

    /// Roster records joined with contact details by name.
    pub async fn legislators(&self) -> Result<Vec<Legislator>, FetchError> {
        let roster = self.roster().await?;
        let contacts = self.contacts().await?;
        Ok(merge_contacts(roster.to_vec(), &contacts))
    }

    pub async fn vote_history(&self, legislator_id: &str) -> Arc<Vec<VoteRecord>> {
        if let Some(votes) = self.votes.get(legislator_id) {
            return votes;
        }

        let url = self.site.votes_url(legislator_id);
        match self.fetcher.fetch(&url).await {
            Ok(html) => {
                let votes =
                    parse_vote_history(&html, legislator_id, &self.site.base_url, &self.schema);
                log::debug!("Parsed {} votes for member {}", votes.len(), legislator_id);
                self.votes.insert(legislator_id.to_string(), Arc::new(votes))
            }
            Err(e) => {
                log::warn!("No vote history for member {}: {}", legislator_id, e);
                Arc::new(Vec::new())
            }
        }
    }

    /// Memoized per URL; a failed fetch is remembered as empty metadata.
    pub async fn bill_metadata(&self, url: &str) -> BillMetadata {
        if let Some(meta) = self.bills.get(url) {
            return meta;
        }

        let meta = match self.fetcher.fetch(url).await {
            Ok(html) => parse_bill_metadata(&html, url),
            Err(e) => {
                log::warn!("Failed to fetch bill page: {}", e);
                BillMetadata::empty(url)
            }
        };

        self.bills.insert(url.to_string(), meta)
    }

    /// Drops every cached page and every record derived from one.
    pub fn invalidate(&self) {
        self.fetcher.clear();
        self.rosters.clear();
        self.contacts.clear();
        self.votes.clear();
        self.bills.clear();
        log::info!("Session caches cleared");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::fs;

    use super::*;
    use crate::scraper::testing::StaticSource;
    use crate::types::Chamber;

    pub const BASE: &str = "https://www.ncleg.gov";
    pub const HB123: &str = "https://www.ncleg.gov/BillLookup/2025/H123";
    pub const SB40: &str = "https://www.ncleg.gov/BillLookup/2025/S40";

    pub fn fixture(name: &str) -> String {
        fs::read_to_string(format!("fixtures/{name}")).expect("Failed to read fixture")
    }

    /// Jane Doe (771) has the fixture vote table; SB 40 has no page.
    pub fn fixture_source() -> StaticSource {
        StaticSource::new()
            .with_page(&format!("{BASE}/Members/MemberList/H"), &fixture("member_list.html"))
            .with_page(&format!("{BASE}/Members/ContactInfo/H"), &fixture("contacts.html"))
            .with_page(&format!("{BASE}/Members/Votes/H/771"), &fixture("member_votes.html"))
            .with_page(HB123, &fixture("bill_page.html"))
    }

    pub fn session(source: StaticSource) -> Session<StaticSource> {
        Session::new(
            source,
            SiteConfig::new(BASE, Chamber::House),
            ColumnSchema::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use crate::scraper::testing::StaticSource;

    #[tokio::test]
    async fn test_legislators_joined_with_contacts() {
        let session = session(fixture_source());

        let legislators = session.legislators().await.expect("roster should load");

        assert_eq!(legislators.len(), 3);
        assert_eq!(legislators[0].email.as_deref(), Some("Jane.Doe@ncleg.gov"));
        assert!(legislators[2].email.is_none());
    }

    #[tokio::test]
    async fn test_missing_roster_is_fatal() {
        let session = session(StaticSource::new());

        let err = session.legislators().await.unwrap_err();
        assert_eq!(err.url(), Some("https://www.ncleg.gov/Members/MemberList/H"));
    }

    #[tokio::test]
    async fn test_missing_contacts_is_fatal() {
        let source = StaticSource::new().with_page(
            "https://www.ncleg.gov/Members/MemberList/H",
            &fixture("member_list.html"),
        );
        let session = session(source);

        assert!(session.roster().await.is_ok());
        assert!(session.legislators().await.is_err());
    }

    #[tokio::test]
    async fn test_missing_vote_history_is_empty() {
        let session = session(fixture_source());

        assert!(session.vote_history("802").await.is_empty());
        assert_eq!(session.vote_history("771").await.len(), 4);
    }

    #[tokio::test]
    async fn test_bill_metadata_fetched_once() {
        let session = session(fixture_source());

        let first = session.bill_metadata(HB123).await;
        let second = session.bill_metadata(HB123).await;

        assert_eq!(first, second);
        assert_eq!(first.short_title, "Firefighter Cancer Presumption");
        assert_eq!(session.fetcher().source().hits(HB123), 1);
    }

    #[tokio::test]
    async fn test_failed_bill_metadata_is_memoized_empty() {
        let session = session(fixture_source());

        let meta = session.bill_metadata(SB40).await;
        assert!(meta.keywords.is_empty());
        assert_eq!(meta.short_title, "");

        session.bill_metadata(SB40).await;
        assert_eq!(session.fetcher().source().hits(SB40), 1);
    }

    #[tokio::test]
    async fn test_invalidate_refetches_everything() {
        let session = session(fixture_source());

        session.legislators().await.unwrap();
        session.vote_history("771").await;
        session.bill_metadata(HB123).await;
        let before = session.fetcher().source().total_hits();

        session.legislators().await.unwrap();
        session.vote_history("771").await;
        session.bill_metadata(HB123).await;
        assert_eq!(session.fetcher().source().total_hits(), before);

        session.invalidate();

        session.legislators().await.unwrap();
        session.vote_history("771").await;
        session.bill_metadata(HB123).await;
        assert_eq!(session.fetcher().source().total_hits(), before * 2);
    }
}
