use crate::extract::RawItemFields;
use url::Url;

/// Small context carried from the page that emitted a task to its handler
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskContext {
    /// Category name from a directory page; becomes the item Type
    pub category: Option<String>,

    /// Listing-derived fields awaiting completion by the detail handler
    pub item: Option<Box<RawItemFields>>,
}

impl TaskContext {
    pub fn with_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            item: None,
        }
    }
}

/// One unit of crawl work: fetch `url` and hand the page to `handler`
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTask {
    pub url: Url,
    pub handler: String,
    pub context: TaskContext,
}

impl FetchTask {
    pub fn new(url: Url, handler: impl Into<String>) -> Self {
        Self {
            url,
            handler: handler.into(),
            context: TaskContext::default(),
        }
    }

    pub fn with_context(url: Url, handler: impl Into<String>, context: TaskContext) -> Self {
        Self {
            url,
            handler: handler.into(),
            context,
        }
    }
}
