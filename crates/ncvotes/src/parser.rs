use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::config::{ColumnSchema, SiteConfig};
use crate::types::{BillMetadata, Contact, Legislator, Party, VoteRecord};

static RE_PARTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((R|D|Unaffiliated|Independent)\)").expect("invalid regex: party")
});

static RE_DISTRICT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"District\s+(\d+)").expect("invalid regex: district"));

static RE_OFFICE_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Phone:\s*([\d()\-][\d()\- ]*)").expect("invalid regex: office phone")
});

static RE_ASSISTANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Assistant:\s*([^\n]+)").expect("invalid regex: assistant"));

static RE_CONTACT_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(?\d{3}\)?[-\s]\d{3}-\d{4}").expect("invalid regex: contact phone")
});

static RE_KEYWORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Keywords:\s*([^\n]+)").expect("invalid regex: keywords"));

static RE_BILL_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:House|Senate) Bill \d+[^\n]*\n([^\n]+)").expect("invalid regex: bill heading")
});

static RE_BILL_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/BillLookup/\d{4}/[HS]\d+").expect("invalid regex: bill url"));

const HONORIFICS: &[&str] = &["Rep. ", "Sen. "];

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text nodes joined by single spaces, like a table cell reads on screen.
fn spaced_text(element: ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// One trimmed, non-empty text node per line.
fn flatten_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn capture(re: &Regex, text: &str) -> String {
    re.captures(text)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_default()
}

pub(crate) fn absolutize(base_url: &str, href: &str) -> String {
    Url::parse(base_url)
        .and_then(|base| base.join(href))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| href.to_string())
}

pub fn is_bill_url(url: &str) -> bool {
    RE_BILL_URL.is_match(url)
}

fn trailing_id(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

fn strip_honorific(name: &str) -> String {
    let name = name.trim();
    HONORIFICS
        .iter()
        .find_map(|h| name.strip_prefix(h))
        .unwrap_or(name)
        .trim()
        .to_string()
}

pub fn parse_roster(html: &str, site: &SiteConfig) -> Vec<Legislator> {
    let document = Html::parse_document(html);
    let link_sel = Selector::parse("a[href]").unwrap();
    let county_sel = Selector::parse("a[href*='/Counties/']").unwrap();
    let marker = site.biography_marker();

    let mut seen = HashSet::new();
    let mut legislators = Vec::new();

    for anchor in document.select(&link_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains(&marker) {
            continue;
        }
        let Some(id) = trailing_id(href) else {
            log::debug!("Skipping biography link without an id: {}", href);
            continue;
        };

        let name = normalize_whitespace(&elem_text(anchor));
        if name.is_empty() || seen.contains(&id) {
            continue;
        }

        let block = anchor.parent().and_then(ElementRef::wrap);
        let block_text = block.map(flatten_text).unwrap_or_default();

        let party = RE_PARTY
            .captures(&block_text)
            .map(|caps| Party::from_marker(&caps[1]))
            .unwrap_or_default();

        let mut counties: Vec<String> = Vec::new();
        for county in block.iter().flat_map(|b| b.select(&county_sel)) {
            let county = normalize_whitespace(&elem_text(county));
            if !county.is_empty() && !counties.contains(&county) {
                counties.push(county);
            }
        }

        seen.insert(id.clone());
        legislators.push(Legislator {
            name,
            party,
            district: capture(&RE_DISTRICT, &block_text),
            counties,
            office_phone: capture(&RE_OFFICE_PHONE, &block_text),
            assistant: capture(&RE_ASSISTANT, &block_text),
            profile_url: absolutize(&site.base_url, href),
            votes_url: site.votes_url(&id),
            email: None,
            contact_phone: None,
            id,
        });
    }

    legislators
}

pub fn parse_contacts(html: &str) -> Vec<Contact> {
    let document = Html::parse_document(html);
    let mailto_sel = Selector::parse("a[href^='mailto:']").unwrap();
    let link_sel = Selector::parse("a").unwrap();
    let cell_sel = Selector::parse("td").unwrap();

    let mut seen = HashSet::new();
    let mut contacts = Vec::new();

    for email_anchor in document.select(&mailto_sel) {
        let Some(row) = email_anchor
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "tr")
        else {
            log::debug!("Skipping email link outside of a table row");
            continue;
        };

        let email = Some(normalize_whitespace(&elem_text(email_anchor)))
            .filter(|s| !s.is_empty())
            .or_else(|| {
                email_anchor
                    .value()
                    .attr("href")
                    .and_then(|h| h.strip_prefix("mailto:"))
                    .map(|h| h.trim().to_string())
            })
            .unwrap_or_default();

        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();

        let name = row
            .select(&link_sel)
            .next()
            .map(|a| normalize_whitespace(&elem_text(a)))
            .filter(|s| !s.is_empty())
            .or_else(|| cells.first().map(|c| spaced_text(*c)))
            .map(|n| strip_honorific(&n))
            .unwrap_or_default();

        if name.is_empty() || !seen.insert(name.clone()) {
            continue;
        }

        let phone = cells
            .iter()
            .find_map(|c| {
                RE_CONTACT_PHONE
                    .find(&spaced_text(*c))
                    .map(|m| m.as_str().to_string())
            })
            .unwrap_or_default();

        contacts.push(Contact { name, email, phone });
    }

    contacts
}

/// Joins contact details onto roster records by exact name.
pub fn merge_contacts(legislators: Vec<Legislator>, contacts: &[Contact]) -> Vec<Legislator> {
    let by_name: HashMap<&str, &Contact> = contacts.iter().map(|c| (c.name.as_str(), c)).collect();

    legislators
        .into_iter()
        .map(|mut legislator| {
            if let Some(contact) = by_name.get(legislator.name.as_str()) {
                legislator.email = Some(contact.email.clone()).filter(|s| !s.is_empty());
                legislator.contact_phone = Some(contact.phone.clone()).filter(|s| !s.is_empty());
            }
            legislator
        })
        .collect()
}

pub fn parse_bill_metadata(html: &str, url: &str) -> BillMetadata {
    let document = Html::parse_document(html);
    let body_sel = Selector::parse("body").unwrap();
    let title_sel = Selector::parse("title").unwrap();

    let text = document
        .select(&body_sel)
        .next()
        .map(flatten_text)
        .unwrap_or_else(|| flatten_text(document.root_element()));

    let keywords: BTreeSet<String> = RE_KEYWORDS
        .captures(&text)
        .map(|caps| {
            caps[1]
                .split(';')
                .map(|k| k.trim().to_uppercase())
                .filter(|k| !k.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let short_title = Some(capture(&RE_BILL_HEADING, &text))
        .filter(|s| !s.is_empty())
        .or_else(|| {
            document
                .select(&title_sel)
                .next()
                .map(|e| normalize_whitespace(&elem_text(e)))
        })
        .unwrap_or_default();

    BillMetadata {
        url: url.to_string(),
        keywords,
        short_title,
    }
}

pub fn parse_vote_history(
    html: &str,
    legislator_id: &str,
    base_url: &str,
    schema: &ColumnSchema,
) -> Vec<VoteRecord> {
    let document = Html::parse_document(html);
    let row_sel = Selector::parse("tr").unwrap();
    let link_sel = Selector::parse("a[href]").unwrap();

    let mut records = Vec::new();

    for row in document.select(&row_sel) {
        let cells: Vec<String> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "td")
            .map(spaced_text)
            .collect();

        if cells.len() < schema.min_cells {
            continue;
        }

        let links: Vec<(ElementRef, String)> = row
            .select(&link_sel)
            .filter_map(|a| {
                let href = a.value().attr("href")?;
                Some((a, absolutize(base_url, href)))
            })
            .collect();

        let Some((link, doc_url)) = links
            .iter()
            .find(|(_, url)| is_bill_url(url))
            .or_else(|| links.first())
        else {
            continue;
        };

        records.push(VoteRecord {
            legislator_id: legislator_id.to_string(),
            roll_call: schema.roll_call.pick(&cells).to_string(),
            bill: normalize_whitespace(&elem_text(*link)),
            bill_url: is_bill_url(doc_url).then(|| doc_url.clone()),
            motion: schema.motion.pick(&cells).to_string(),
            date: schema.date.pick(&cells).to_string(),
            member_vote: schema.member_vote.pick(&cells).to_string(),
            result: schema.result.pick(&cells).to_string(),
        });
    }

    records
}
