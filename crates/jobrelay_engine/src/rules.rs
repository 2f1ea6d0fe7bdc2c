//! Declarative pattern tables for the free-text fields of a listing.
//!
//! Each table is ordered by `priority` (lowest first). Adding a locale or a
//! layout variant means adding rows here; the extractor's control flow does
//! not change.
use std::sync::LazyLock;

use jobrelay_logging::relay_error;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Applicants,
    PostingDate,
    Experience,
    OfficePresence,
}

/// Which text a matching rule contributes to its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// The matched substring.
    Match,
    /// The whole clause the pattern was found in.
    Clause,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub field: Field,
    pub priority: u16,
    pub pattern: &'static str,
    pub capture: Capture,
}

const fn rule(field: Field, priority: u16, pattern: &'static str) -> Rule {
    Rule {
        field,
        priority,
        pattern,
        capture: Capture::Match,
    }
}

pub const FIELD_RULES: &[Rule] = &[
    rule(Field::Applicants, 10, r"(?i)\d+.*?candidați"),
    rule(Field::Applicants, 20, r"(?i)\d+.*?applicants?"),
    rule(Field::PostingDate, 10, r"(?i)cu.*?în urmă"),
    rule(Field::PostingDate, 20, r"(?i)\d+.*?ago"),
    rule(Field::PostingDate, 30, r"(?i)repostat.*?în urmă"),
    rule(Field::PostingDate, 40, r"(?i)posted.*?ago"),
    Rule {
        field: Field::PostingDate,
        priority: 90,
        pattern: r"(?i)repostat|posted",
        capture: Capture::Clause,
    },
    rule(Field::Experience, 10, r"(?i)nivel\s+mediu\s+de\s+experiență"),
    rule(Field::Experience, 11, r"(?i)nivel\s+mare\s+de\s+experiență"),
    rule(Field::Experience, 12, r"(?i)nivel\s+mic\s+de\s+experiență"),
    rule(Field::Experience, 13, r"(?i)nivel\s+mediu\s+de\s+experienta"),
    rule(Field::Experience, 14, r"(?i)nivel\s+mare\s+de\s+experienta"),
    rule(Field::Experience, 15, r"(?i)nivel\s+mic\s+de\s+experienta"),
    rule(Field::Experience, 20, r"(?i)entry\s*level"),
    rule(Field::Experience, 21, r"(?i)junior\s*level"),
    rule(Field::Experience, 22, r"(?i)senior\s*level"),
    rule(Field::Experience, 23, r"(?i)mid\s*level"),
    rule(Field::Experience, 30, r"(?i)junior"),
    rule(Field::Experience, 31, r"(?i)senior"),
    rule(Field::Experience, 32, r"(?i)experient"),
    rule(Field::Experience, 33, r"(?i)începător"),
    rule(Field::Experience, 34, r"(?i)experienced"),
    rule(Field::Experience, 35, r"(?i)intern"),
    rule(Field::Experience, 36, r"(?i)associate"),
    rule(Field::Experience, 37, r"(?i)director"),
    rule(Field::Experience, 38, r"(?i)manager"),
    rule(Field::OfficePresence, 10, r"(?i)regim\s+hibrid"),
    rule(Field::OfficePresence, 11, r"(?i)hibrid"),
    rule(Field::OfficePresence, 20, r"(?i)full\s*time"),
    rule(Field::OfficePresence, 21, r"(?i)part\s*time"),
    rule(Field::OfficePresence, 30, r"(?i)remote"),
    rule(Field::OfficePresence, 31, r"(?i)la\s+distanță"),
    rule(Field::OfficePresence, 32, r"(?i)la\s+distanta"),
    rule(Field::OfficePresence, 40, r"(?i)norma\s+întreagă"),
    rule(Field::OfficePresence, 41, r"(?i)norma\s+intreaga"),
    rule(Field::OfficePresence, 42, r"(?i)jumătate\s+normă"),
    rule(Field::OfficePresence, 43, r"(?i)jumatate\s+norma"),
    rule(Field::OfficePresence, 50, r"(?i)contract"),
    rule(Field::OfficePresence, 51, r"(?i)on\s*site"),
    rule(Field::OfficePresence, 52, r"(?i)office"),
];

/// Promotional badges removed from insight text, each through end of line.
pub const BOILERPLATE_PHRASES: &[&str] = &[
    "Promovat de client",
    "Candidații sunt analizați în mod activ",
    "Se potrivește preferințelor dvs",
    "Reactivați Premium",
    "Vedeți o comparație între dvs",
];

/// Label of the skills clause that may appear inside the insight badges.
pub const INSIGHT_SKILLS_PATTERN: &str = r"(?i)Aptitudini:\s*(.*)$";

/// Section labels searched in the job description, in order.
pub const SECTION_LABELS: &[&str] = &[
    r"Aptitudini:\s*",
    r"Aptitudini\s*",
    r"Skills:\s*",
    r"Cerințe:\s*",
    r"Requirements:\s*",
];

/// A labelled section ends at a blank line or at the next `Label:` line.
pub const SECTION_END_PATTERN: &str = r"\n\n|\n[A-Z][a-z]+:";

pub struct CompiledRule {
    pub field: Field,
    pub priority: u16,
    pub regex: Regex,
    pub capture: Capture,
}

impl CompiledRule {
    /// Text this rule contributes for `text`, if it fires.
    pub fn apply(&self, text: &str) -> Option<String> {
        let found = self.regex.find(text)?;
        Some(match self.capture {
            Capture::Match => found.as_str().trim().to_string(),
            Capture::Clause => text.trim().to_string(),
        })
    }
}

pub struct RuleSet {
    rules: Vec<CompiledRule>,
    boilerplate: Vec<Regex>,
    pub insight_skills: Option<Regex>,
    pub section_labels: Vec<Regex>,
    pub section_end: Option<Regex>,
}

impl RuleSet {
    pub fn compile(rules: &[Rule]) -> Self {
        let mut compiled: Vec<CompiledRule> = rules
            .iter()
            .filter_map(|rule| {
                compile(rule.pattern).map(|regex| CompiledRule {
                    field: rule.field,
                    priority: rule.priority,
                    regex,
                    capture: rule.capture,
                })
            })
            .collect();
        compiled.sort_by_key(|rule| (rule.field, rule.priority));

        Self {
            rules: compiled,
            boilerplate: BOILERPLATE_PHRASES
                .iter()
                .filter_map(|phrase| compile(&format!("(?i){}[^\\n]*", regex::escape(phrase))))
                .collect(),
            insight_skills: compile(INSIGHT_SKILLS_PATTERN),
            section_labels: SECTION_LABELS.iter().filter_map(|p| compile(p)).collect(),
            section_end: compile(SECTION_END_PATTERN),
        }
    }

    /// Rules for one field, highest priority first.
    pub fn for_field(&self, field: Field) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter().filter(move |rule| rule.field == field)
    }

    /// First rule of `field` that fires on `text`.
    pub fn first_match(&self, field: Field, text: &str) -> Option<String> {
        self.for_field(field).find_map(|rule| rule.apply(text))
    }

    pub fn strip_boilerplate(&self, text: &str) -> String {
        self.boilerplate
            .iter()
            .fold(text.to_string(), |acc, regex| regex.replace_all(&acc, "").into_owned())
    }
}

pub static DEFAULT_RULES: LazyLock<RuleSet> = LazyLock::new(|| RuleSet::compile(FIELD_RULES));

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            relay_error!("Dropping invalid extraction pattern {:?}: {}", pattern, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pattern_compiles() {
        let set = RuleSet::compile(FIELD_RULES);
        assert_eq!(set.rules.len(), FIELD_RULES.len());
        assert_eq!(set.boilerplate.len(), BOILERPLATE_PHRASES.len());
        assert_eq!(set.section_labels.len(), SECTION_LABELS.len());
        assert!(set.insight_skills.is_some());
        assert!(set.section_end.is_some());
    }

    #[test]
    fn rules_are_ordered_by_priority_within_a_field() {
        let set = RuleSet::compile(FIELD_RULES);
        let priorities: Vec<_> = set
            .for_field(Field::PostingDate)
            .map(|rule| rule.priority)
            .collect();
        assert_eq!(priorities, vec![10, 20, 30, 40, 90]);
    }

    #[test]
    fn clause_capture_keeps_whole_clause() {
        let set = RuleSet::compile(FIELD_RULES);
        assert_eq!(
            set.first_match(Field::PostingDate, "Reposted recently"),
            Some("Reposted recently".to_string())
        );
        assert_eq!(
            set.first_match(Field::PostingDate, "Repostat cu 3 zile în urmă"),
            Some("cu 3 zile în urmă".to_string())
        );
    }

    #[test]
    fn boilerplate_is_removed_through_end_of_line() {
        let set = RuleSet::compile(FIELD_RULES);
        assert_eq!(
            set.strip_boilerplate("Hibrid\nReactivați Premium: vedeți mai mult\nSenior"),
            "Hibrid\n\nSenior"
        );
    }
}
