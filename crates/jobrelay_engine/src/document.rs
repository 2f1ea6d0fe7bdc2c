use scraper::{ElementRef, Html, Selector};

use crate::text::inner_text;

/// A parsed page, queried with CSS selectors.
///
/// Selectors that fail to parse simply match nothing.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Text of the first selector whose first match has non-empty trimmed text.
    pub fn first_text(&self, selectors: &[&str]) -> String {
        selectors
            .iter()
            .filter_map(|selector| self.select_first(selector))
            .map(|element| inner_text(element).trim().to_string())
            .find(|text| !text.is_empty())
            .unwrap_or_default()
    }

    /// Text of the first selector that matches any element at all, even if
    /// that element turns out to be empty.
    pub fn first_present_text(&self, selectors: &[&str]) -> Option<String> {
        selectors
            .iter()
            .find_map(|selector| self.select_first(selector))
            .map(inner_text)
    }

    /// Texts of every element matching `selector`, in document order.
    pub fn all_texts(&self, selector: &str) -> Vec<String> {
        let Ok(sel) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.html.select(&sel).map(inner_text).collect()
    }

    fn select_first(&self, selector: &str) -> Option<ElementRef<'_>> {
        let sel = Selector::parse(selector).ok()?;
        self.html.select(&sel).next()
    }
}
