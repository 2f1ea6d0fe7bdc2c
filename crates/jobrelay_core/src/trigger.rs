use url::Url;

/// The single command this system responds to.
pub const EXTRACT_COMMAND: &str = "extract-job-data";

const LISTING_HOST: &str = "linkedin.com";
const DETAIL_PATH: &str = "/jobs/view/";
const COLLECTION_PATHS: [&str; 2] = ["/jobs/collections", "/jobs/search"];
const JOB_ID_PARAM: &str = "currentJobId";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ExtractJobData,
}

impl Command {
    pub fn parse(raw: &str) -> Option<Self> {
        (raw.trim() == EXTRACT_COMMAND).then_some(Command::ExtractJobData)
    }
}

/// Shape of the page a trigger was invoked on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    /// A list/search view with a selected job; extraction needs a derived page.
    CollectionView { job_id: String },
    /// Already an individual listing.
    DetailView,
    Unsupported,
}

pub fn classify(url: &str) -> PageKind {
    let Ok(parsed) = Url::parse(url) else {
        return PageKind::Unsupported;
    };
    let on_listing_host = parsed
        .host_str()
        .is_some_and(|host| host == LISTING_HOST || host.ends_with(".linkedin.com"));
    if !on_listing_host {
        return PageKind::Unsupported;
    }

    let path = parsed.path();
    if COLLECTION_PATHS.iter().any(|marker| path.starts_with(marker)) {
        return match job_id_param(&parsed) {
            Some(job_id) => PageKind::CollectionView { job_id },
            None => PageKind::Unsupported,
        };
    }
    if path.starts_with(DETAIL_PATH) {
        return PageKind::DetailView;
    }
    PageKind::Unsupported
}

/// Canonical detail URL for a job identifier.
pub fn detail_url(job_id: &str) -> String {
    format!("https://www.linkedin.com/jobs/view/{job_id}")
}

// Only the leading digits count, mirroring how the id is embedded in list views.
fn job_id_param(url: &Url) -> Option<String> {
    let (_, value) = url.query_pairs().find(|(key, _)| key == JOB_ID_PARAM)?;
    let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_view_yields_job_id() {
        let kind =
            classify("https://www.linkedin.com/jobs/collections/recommended/?currentJobId=12345");
        assert_eq!(
            kind,
            PageKind::CollectionView {
                job_id: "12345".into()
            }
        );
        assert_eq!(detail_url("12345"), "https://www.linkedin.com/jobs/view/12345");
    }

    #[test]
    fn search_view_is_a_collection() {
        let kind = classify("https://www.linkedin.com/jobs/search/?keywords=rust&currentJobId=987");
        assert_eq!(kind, PageKind::CollectionView { job_id: "987".into() });
    }

    #[test]
    fn collection_without_numeric_id_is_unsupported() {
        assert_eq!(
            classify("https://www.linkedin.com/jobs/collections/recommended/"),
            PageKind::Unsupported
        );
        assert_eq!(
            classify("https://www.linkedin.com/jobs/collections/recommended/?currentJobId=abc"),
            PageKind::Unsupported
        );
    }

    #[test]
    fn detail_and_foreign_pages() {
        assert_eq!(
            classify("https://www.linkedin.com/jobs/view/4242/"),
            PageKind::DetailView
        );
        assert_eq!(classify("https://example.com/jobs/view/1"), PageKind::Unsupported);
        assert_eq!(classify("not a url"), PageKind::Unsupported);
    }

    #[test]
    fn command_parsing() {
        assert_eq!(Command::parse("extract-job-data"), Some(Command::ExtractJobData));
        assert_eq!(Command::parse("copy"), None);
    }
}
