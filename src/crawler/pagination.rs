use crate::crawler::{FetchTask, ParsedPage, TaskContext};
use scraper::Selector;

/// Detects a "next page" affordance and turns it into one follow-up task
pub struct PaginationFollower<'a> {
    chain: &'a [Selector],
}

impl<'a> PaginationFollower<'a> {
    /// `chain` is tried in order; the first selector yielding a usable link wins
    pub fn new(chain: &'a [Selector]) -> Self {
        Self { chain }
    }

    /// The follow-up task for `page`, carrying the same handler and context
    ///
    /// Pure over its inputs; calling it twice on one page yields equal tasks.
    pub fn follow(&self, page: &ParsedPage, handler: &str, context: &TaskContext) -> Option<FetchTask> {
        self.chain.iter().find_map(|selector| {
            page.select_all(selector)
                .into_iter()
                .filter_map(|link| link.value().attr("href"))
                .find_map(|href| page.resolve(href))
                .map(|url| FetchTask::with_context(url, handler, context.clone()))
        })
    }
}
