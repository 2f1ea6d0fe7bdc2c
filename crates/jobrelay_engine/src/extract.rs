use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use jobrelay_core::{JobRecord, DEFAULT_PLATFORM, ELLIPSIS_MARKER, SUMMARY_LIMIT};
use jobrelay_logging::relay_trace;

use crate::document::Document;
use crate::rules::{Field, RuleSet, DEFAULT_RULES};
use crate::PageSource;

const TITLE_SELECTORS: &[&str] = &[
    "h1",
    "[data-job-title]",
    ".jobs-unified-top-card__job-title",
];
const COMPANY_SELECTORS: &[&str] = &[
    ".job-details-jobs-unified-top-card__company-name a",
    ".jobs-unified-top-card__company-name a",
    "[data-company-name]",
];
const LOCATION_SELECTORS: &[&str] = &[
    ".job-details-jobs-unified-top-card__tertiary-description-container span",
    ".jobs-unified-top-card__bullet",
    "[data-job-location]",
];
const META_BLOCK_SELECTORS: &[&str] = &[
    ".job-details-jobs-unified-top-card__tertiary-description-container",
    ".jobs-unified-top-card__tertiary-description-container",
];
const INSIGHT_SELECTOR: &str =
    ".job-details-jobs-unified-top-card__job-insight, .jobs-unified-top-card__job-insight";
const DESCRIPTION_SELECTORS: &[&str] = &[
    ".jobs-description-content__text",
    ".job-details-jobs-unified-top-card__job-description",
    ".jobs-unified-top-card__job-description",
    ".jobs-description__content",
    ".jobs-box__content",
    "[data-job-description]",
];

const CLAUSE_SEPARATOR: char = '·';
const INSIGHT_SEPARATOR: &str = " | ";
const BULLET_MARKERS: &[char] = &['-', '•', '·', '*'];

/// Derives a [`JobRecord`] from the current state of a page.
///
/// Implementations never fail: a field that cannot be found is left empty.
pub trait RecordExtractor: Send + Sync {
    fn extract(&self, page: &PageSource) -> JobRecord;
}

pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Extractor for the job-listing page template.
pub struct ListingExtractor {
    rules: &'static RuleSet,
    today: Clock,
}

impl ListingExtractor {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(|| Utc::now().date_naive()))
    }

    pub fn with_clock(today: Clock) -> Self {
        Self {
            rules: &DEFAULT_RULES,
            today,
        }
    }
}

impl Default for ListingExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordExtractor for ListingExtractor {
    fn extract(&self, page: &PageSource) -> JobRecord {
        let doc = Document::parse(&page.html);
        let today = (self.today)().format("%Y-%m-%d").to_string();

        let title = doc.first_text(TITLE_SELECTORS);
        let company = doc.first_text(COMPANY_SELECTORS);
        let location = clean_location(&doc.first_text(LOCATION_SELECTORS));

        let meta_block = doc.first_text(META_BLOCK_SELECTORS);
        let (applicants, posting_date) = parse_meta_block(self.rules, &meta_block);

        let insights = insight_text(self.rules, &doc.all_texts(INSIGHT_SELECTOR));
        let (experience, office_presence) = split_insights(self.rules, &insights);

        let summary = self
            .rules
            .insight_skills
            .as_ref()
            .and_then(|regex| regex.captures(&insights))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .or_else(|| {
                doc.first_present_text(DESCRIPTION_SELECTORS)
                    .and_then(|text| labelled_section(self.rules, &text))
            })
            .map(|raw| clean_summary(&raw))
            .unwrap_or_default();

        relay_trace!(
            "extracted title={:?} company={:?} from {}",
            title,
            company,
            page.url
        );

        JobRecord {
            title,
            company,
            office_presence,
            experience,
            location,
            application_date: today.clone(),
            summary,
            platform: DEFAULT_PLATFORM.to_string(),
            additional_details: String::new(),
            viewed_on: today,
            applicants,
            posting_date,
            url: page.url.clone(),
        }
    }
}

/// Keeps only the part before the first separator; the rest is posting metadata.
pub fn clean_location(raw: &str) -> String {
    raw.split(CLAUSE_SEPARATOR)
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Splits the meta block into clauses and picks the applicant count and the
/// posting recency.
///
/// The first clause that yields a value wins per field; later matches do not
/// overwrite it. For "Reposted 3 weeks ago · 2 days ago" the posting date is
/// "3 weeks ago", where a last-match scan would report "2 days ago".
pub fn parse_meta_block(rules: &RuleSet, meta_block: &str) -> (String, String) {
    let mut applicants: Option<String> = None;
    let mut posting_date: Option<String> = None;

    for clause in meta_block.split(CLAUSE_SEPARATOR).map(str::trim) {
        if let Some(found) = rules.first_match(Field::Applicants, clause) {
            applicants.get_or_insert(found);
        } else if let Some(found) = rules.first_match(Field::PostingDate, clause) {
            posting_date.get_or_insert(found);
        }
    }

    (
        applicants.unwrap_or_default(),
        posting_date.unwrap_or_default(),
    )
}

/// Joins the insight badges after removing promotional lines.
pub fn insight_text(rules: &RuleSet, badges: &[String]) -> String {
    badges
        .iter()
        .map(|badge| collapse_whitespace(&rules.strip_boilerplate(badge.trim())))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(INSIGHT_SEPARATOR)
}

/// Returns `(experience, office_presence)` for the joined insight text.
pub fn split_insights(rules: &RuleSet, insights: &str) -> (String, String) {
    let experience = rules
        .first_match(Field::Experience, insights)
        .unwrap_or_default();
    let office_presence = rules
        .for_field(Field::OfficePresence)
        .filter_map(|rule| rule.apply(insights))
        .collect::<Vec<_>>()
        .join(" ");

    if !experience.is_empty() || !office_presence.is_empty() || insights.is_empty() {
        return (experience, office_presence);
    }

    // Nothing recognisable: assume the first badge is the level and the rest the arrangement.
    let mut parts = insights.split(INSIGHT_SEPARATOR);
    let first = parts.next().unwrap_or_default().to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, rest)
}

/// Finds the first labelled section in `text` and returns its body.
pub fn labelled_section(rules: &RuleSet, text: &str) -> Option<String> {
    let label = rules.section_labels.iter().find_map(|regex| regex.find(text))?;
    let body = &text[label.end()..];
    let end = rules
        .section_end
        .as_ref()
        .and_then(|regex| regex.find(body))
        .map_or(body.len(), |m| m.start());
    Some(body[..end].trim().to_string())
}

/// Strips bullet markers per line, collapses whitespace and caps the length.
pub fn clean_summary(raw: &str) -> String {
    let unbulleted = raw
        .lines()
        .map(|line| {
            let line = line.trim_start();
            line.strip_prefix(BULLET_MARKERS).unwrap_or(line).trim_start()
        })
        .collect::<Vec<_>>()
        .join("\n");
    let summary = collapse_whitespace(&unbulleted);
    if summary.chars().count() > SUMMARY_LIMIT {
        let truncated: String = summary.chars().take(SUMMARY_LIMIT).collect();
        format!("{truncated}{ELLIPSIS_MARKER}")
    } else {
        summary
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
