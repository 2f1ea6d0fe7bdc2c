use serde::{Deserialize, Serialize};

/// Platform written into records whose source did not name one.
pub const DEFAULT_PLATFORM: &str = "LinkedIn";
/// Maximum summary length in characters before the ellipsis marker is appended.
pub const SUMMARY_LIMIT: usize = 500;
pub const ELLIPSIS_MARKER: &str = "...";

/// Field names in the order they are displayed and relayed.
pub const FIELD_NAMES: [&str; 13] = [
    "title",
    "company",
    "officePresence",
    "experience",
    "location",
    "applicationDate",
    "summary",
    "platform",
    "additionalDetails",
    "viewedOn",
    "applicants",
    "postingDate",
    "url",
];

/// Canonical extracted listing. An empty string means "not found".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub office_presence: String,
    pub experience: String,
    pub location: String,
    pub application_date: String,
    pub summary: String,
    pub platform: String,
    pub additional_details: String,
    pub viewed_on: String,
    pub applicants: String,
    pub posting_date: String,
    pub url: String,
}

impl JobRecord {
    /// A record is worth relaying once either of its identifying fields was found.
    pub fn has_identity(&self) -> bool {
        !self.title.is_empty() || !self.company.is_empty()
    }

    /// `(name, value)` pairs in [`FIELD_NAMES`] order.
    pub fn fields(&self) -> [(&'static str, &str); 13] {
        [
            (FIELD_NAMES[0], self.title.as_str()),
            (FIELD_NAMES[1], self.company.as_str()),
            (FIELD_NAMES[2], self.office_presence.as_str()),
            (FIELD_NAMES[3], self.experience.as_str()),
            (FIELD_NAMES[4], self.location.as_str()),
            (FIELD_NAMES[5], self.application_date.as_str()),
            (FIELD_NAMES[6], self.summary.as_str()),
            (FIELD_NAMES[7], self.platform.as_str()),
            (FIELD_NAMES[8], self.additional_details.as_str()),
            (FIELD_NAMES[9], self.viewed_on.as_str()),
            (FIELD_NAMES[10], self.applicants.as_str()),
            (FIELD_NAMES[11], self.posting_date.as_str()),
            (FIELD_NAMES[12], self.url.as_str()),
        ]
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable `key: value` listing, one field per line.
    pub fn display_lines(&self) -> String {
        self.fields()
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A record as it arrives from another context: any key may be absent or null.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawJobRecord {
    pub title: Option<String>,
    pub company: Option<String>,
    pub office_presence: Option<String>,
    pub experience: Option<String>,
    pub location: Option<String>,
    pub application_date: Option<String>,
    pub summary: Option<String>,
    pub platform: Option<String>,
    pub additional_details: Option<String>,
    pub viewed_on: Option<String>,
    pub applicants: Option<String>,
    pub posting_date: Option<String>,
    pub url: Option<String>,
}

impl RawJobRecord {
    /// Builds the canonical record: missing fields become empty and an
    /// unknown platform falls back to [`DEFAULT_PLATFORM`].
    pub fn normalize(self) -> JobRecord {
        let platform = self
            .platform
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PLATFORM.to_string());
        JobRecord {
            title: self.title.unwrap_or_default(),
            company: self.company.unwrap_or_default(),
            office_presence: self.office_presence.unwrap_or_default(),
            experience: self.experience.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            application_date: self.application_date.unwrap_or_default(),
            summary: self.summary.unwrap_or_default(),
            platform,
            additional_details: self.additional_details.unwrap_or_default(),
            viewed_on: self.viewed_on.unwrap_or_default(),
            applicants: self.applicants.unwrap_or_default(),
            posting_date: self.posting_date.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
        }
    }
}

impl From<JobRecord> for RawJobRecord {
    fn from(record: JobRecord) -> Self {
        Self {
            title: Some(record.title),
            company: Some(record.company),
            office_presence: Some(record.office_presence),
            experience: Some(record.experience),
            location: Some(record.location),
            application_date: Some(record.application_date),
            summary: Some(record.summary),
            platform: Some(record.platform),
            additional_details: Some(record.additional_details),
            viewed_on: Some(record.viewed_on),
            applicants: Some(record.applicants),
            posting_date: Some(record.posting_date),
            url: Some(record.url),
        }
    }
}
