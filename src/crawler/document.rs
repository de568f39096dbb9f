//! Parsed view of one fetched page

use crate::extract::resolve_link;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A fetched page, owned by the handler invocation that receives it
///
/// The underlying tree is not `Send`; a `ParsedPage` never lives across an
/// await point.
pub struct ParsedPage {
    url: Url,
    html: Html,
}

impl ParsedPage {
    /// Parses a body fetched from `url`
    ///
    /// # Example
    ///
    /// ```
    /// use bead_harvest::crawler::ParsedPage;
    /// use scraper::Selector;
    /// use url::Url;
    ///
    /// let url = Url::parse("https://shop.example/delica").unwrap();
    /// let page = ParsedPage::parse(url, r#"<a class="next" href="?page=2">Next</a>"#);
    /// let next = Selector::parse("a.next").unwrap();
    /// assert_eq!(page.select_all(&next).len(), 1);
    /// ```
    pub fn parse(url: Url, body: &str) -> Self {
        Self {
            url,
            html: Html::parse_document(body),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn select_all<'a>(&'a self, selector: &'a Selector) -> Vec<ElementRef<'a>> {
        self.html.select(selector).collect()
    }

    pub fn select_first<'a>(&'a self, selector: &'a Selector) -> Option<ElementRef<'a>> {
        self.html.select(selector).next()
    }

    /// Resolves a possibly relative link against this page's URL
    pub fn resolve(&self, href: &str) -> Option<Url> {
        resolve_link(&self.url, href)
    }
}
