use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::TopicConfig;
use crate::types::{BillMetadata, VoteRecord};

/// Safety net for bills whose keyword tagging on the site is incomplete.
static RE_TOPIC_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)FIRE(FIGHT| FIGHTER|MEN)|EMS|RESCUE|9-?1-?1|PENSION")
        .expect("invalid regex: topic title")
});

/// How a bill qualifies as topic-relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relevance {
    /// Declared keyword tags only (whole-chamber matrix).
    KeywordOnly,
    /// Keyword tags, then the title pattern (single-legislator drilldown).
    WithTitleFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Support,
    Oppose,
    Other,
    ExcludedMotion,
    ExcludedResult,
}

impl Category {
    /// Sort key for drilldown rows: supports, then opposes, then the rest.
    pub fn priority(&self) -> u8 {
        match self {
            Category::Support => 0,
            Category::Oppose => 1,
            _ => 2,
        }
    }

    pub fn is_counted(&self) -> bool {
        !matches!(self, Category::ExcludedMotion | Category::ExcludedResult)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedVote {
    pub topic_relevant: bool,
    pub category: Category,
    pub counted_as: String,
}

impl TopicConfig {
    pub fn matches_keywords(&self, bill: &BillMetadata) -> bool {
        self.keywords.iter().any(|k| bill.keywords.contains(k))
    }

    /// True when the motion text contains one of the counted markers. An
    /// empty set counts nothing, for the drilldown and the matrix alike.
    pub fn motion_is_counted(&self, motion: &str) -> bool {
        self.counted_motions.iter().any(|m| motion.contains(m.label()))
    }
}

pub fn title_matches_topic(text: &str) -> bool {
    !text.is_empty() && RE_TOPIC_TITLE.is_match(text)
}

/// Without metadata only the record's own bill text can match the title
/// pattern.
pub fn is_topic_relevant(
    record: &VoteRecord,
    bill: Option<&BillMetadata>,
    config: &TopicConfig,
    relevance: Relevance,
) -> bool {
    if bill.is_some_and(|b| config.matches_keywords(b)) {
        return true;
    }
    match relevance {
        Relevance::KeywordOnly => false,
        Relevance::WithTitleFallback => match bill {
            Some(b) => title_matches_topic(&b.short_title),
            None => title_matches_topic(&record.bill),
        },
    }
}

/// Support/Oppose for aye/no, `Other` for any other recorded vote.
pub fn tally(member_vote: &str) -> Category {
    match member_vote.trim().to_uppercase().as_str() {
        "AYE" | "AY" => Category::Support,
        "NO" => Category::Oppose,
        _ => Category::Other,
    }
}

/// A vote counts when its motion is configured and the roll call passed.
pub fn counting_category(record: &VoteRecord, config: &TopicConfig) -> Category {
    if !config.motion_is_counted(&record.motion) {
        Category::ExcludedMotion
    } else if !record.result.to_uppercase().contains("PASS") {
        Category::ExcludedResult
    } else {
        tally(&record.member_vote)
    }
}

pub fn counted_label(category: Category, member_vote: &str) -> String {
    match category {
        Category::Support => "Aye (supports)".to_string(),
        Category::Oppose => "No (opposes)".to_string(),
        Category::Other => member_vote.to_string(),
        Category::ExcludedMotion | Category::ExcludedResult => {
            format!("{} (not counted)", member_vote)
        }
    }
}

pub fn classify(
    record: &VoteRecord,
    bill: Option<&BillMetadata>,
    config: &TopicConfig,
    relevance: Relevance,
) -> ClassifiedVote {
    let category = counting_category(record, config);
    ClassifiedVote {
        topic_relevant: is_topic_relevant(record, bill, config, relevance),
        category,
        counted_as: counted_label(category, &record.member_vote),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Motion;

    fn vote(motion: &str, result: &str, member_vote: &str) -> VoteRecord {
        VoteRecord {
            legislator_id: "771".into(),
            roll_call: "101".into(),
            bill: "HB 123".into(),
            bill_url: Some("https://www.ncleg.gov/BillLookup/2025/H123".into()),
            motion: motion.into(),
            date: "03/05/2025 02:31:10 PM".into(),
            member_vote: member_vote.into(),
            result: result.into(),
        }
    }

    fn bill(keywords: &[&str], short_title: &str) -> BillMetadata {
        BillMetadata {
            url: "https://www.ncleg.gov/BillLookup/2025/H123".into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            short_title: short_title.into(),
        }
    }

    fn firefighting() -> TopicConfig {
        TopicConfig::new("Firefighters & Firefighting", vec![Motion::SecondReading])
    }

    #[test]
    fn test_aye_on_passed_second_reading_supports() {
        let record = vote("Second Reading", "PASSED ON SECOND", "AYE");
        let meta = bill(&["FIREFIGHTERS & FIREFIGHTING"], "");

        let classified = classify(&record, Some(&meta), &firefighting(), Relevance::KeywordOnly);

        assert!(classified.topic_relevant);
        assert_eq!(classified.category, Category::Support);
        assert_eq!(classified.counted_as, "Aye (supports)");
    }

    #[test]
    fn test_failed_result_is_not_counted() {
        let record = vote("Second Reading", "FAILED", "AYE");
        let meta = bill(&["FIREFIGHTERS & FIREFIGHTING"], "");

        let classified =
            classify(&record, Some(&meta), &firefighting(), Relevance::WithTitleFallback);

        assert_eq!(classified.category, Category::ExcludedResult);
        assert_eq!(classified.counted_as, "AYE (not counted)");
        assert!(!classified.category.is_counted());
    }

    #[test]
    fn test_unconfigured_motion_is_not_counted() {
        let record = vote("Third Reading", "PASSED 3RD READING", "NO");

        let category = counting_category(&record, &firefighting());

        assert_eq!(category, Category::ExcludedMotion);
        assert_eq!(counted_label(category, "NO"), "NO (not counted)");
    }

    #[test]
    fn test_tally_normalizes_votes() {
        assert_eq!(tally(" aye "), Category::Support);
        assert_eq!(tally("Ay"), Category::Support);
        assert_eq!(tally("no"), Category::Oppose);
        assert_eq!(tally("NOT VOTING"), Category::Other);
        assert_eq!(
            counted_label(tally("EXCUSED ABSENCE"), "EXCUSED ABSENCE"),
            "EXCUSED ABSENCE"
        );
    }

    #[test]
    fn test_result_match_is_case_insensitive() {
        let record = vote("Second Reading", "Passed", "No");
        assert_eq!(counting_category(&record, &firefighting()), Category::Oppose);
    }

    #[test]
    fn test_title_fallback_only_with_fallback_relevance() {
        let record = vote("Second Reading", "PASSED", "AYE");
        let meta = bill(
            &["PENSION & RETIREMENT FUNDS"],
            "AN ACT TO AMEND FIREFIGHTER RETIREMENT",
        );
        let config = firefighting();

        assert!(is_topic_relevant(
            &record,
            Some(&meta),
            &config,
            Relevance::WithTitleFallback
        ));
        assert!(!is_topic_relevant(
            &record,
            Some(&meta),
            &config,
            Relevance::KeywordOnly
        ));
    }

    #[test]
    fn test_missing_metadata_uses_record_text() {
        let mut record = vote("For Adoption", "PASSED", "AYE");
        record.bill_url = None;
        let config = firefighting();

        assert!(!is_topic_relevant(&record, None, &config, Relevance::WithTitleFallback));

        record.bill = "HR 12 Honor Rescue Squad Volunteers".into();
        assert!(is_topic_relevant(&record, None, &config, Relevance::WithTitleFallback));
        assert!(!is_topic_relevant(&record, None, &config, Relevance::KeywordOnly));
    }

    #[test]
    fn test_unrelated_bill_is_not_relevant() {
        let record = vote("Second Reading", "PASSED", "AYE");
        let meta = bill(&["TRANSPORTATION"], "Highway Signage Updates");

        let classified =
            classify(&record, Some(&meta), &firefighting(), Relevance::WithTitleFallback);

        assert!(!classified.topic_relevant);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let record = vote("Second Reading", "PASSED", "NO");
        let meta = bill(&["FIREFIGHTERS & FIREFIGHTING"], "Fire Safety");
        let config = firefighting();

        let first = classify(&record, Some(&meta), &config, Relevance::WithTitleFallback);
        let second = classify(&record, Some(&meta), &config, Relevance::WithTitleFallback);

        assert_eq!(first, second);
    }

    #[test]
    fn test_concur_marker_also_matches_not_concur() {
        let config = TopicConfig::new("CANCER", vec![Motion::Concur]);
        assert!(config.motion_is_counted("Not Concur"));
        assert!(!config.motion_is_counted("Second Reading"));
    }

    #[test]
    fn test_empty_motion_set_counts_nothing() {
        let config = TopicConfig::new("CANCER", vec![]);
        let record = vote("Second Reading", "PASSED", "AYE");
        assert_eq!(counting_category(&record, &config), Category::ExcludedMotion);
    }
}
