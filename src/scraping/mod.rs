pub mod base;
pub mod curtin_html;

use anyhow::{anyhow, Context, Result};

use crate::keywords::KeywordClassifier;
use crate::models::Event;

use base::PageFetcher;

/// A paginated events listing.
pub trait EventSource {
    fn source_id(&self) -> &'static str;
    fn origin(&self) -> &str;
    fn page_url(&self, page: u32) -> String;
    /// Parses one listing page, keeping only cards the classifier accepts.
    fn parse_page(&self, html: &str, classifier: &KeywordClassifier) -> ListingPage;
}

#[derive(Debug, Default)]
pub struct ListingPage {
    /// Every event card seen on the page, matched or not.
    pub card_count: usize,
    pub events: Vec<Event>,
}

/// Walks listing pages `1, 2, 3, …` one fetch at a time and stops at the
/// first page without event cards. A transiently empty page ends the walk
/// early; there is no way to tell it apart from the real end.
pub struct Pages<'a, S: EventSource, F: PageFetcher> {
    source: &'a S,
    fetcher: &'a F,
    classifier: &'a KeywordClassifier,
    next_page: u32,
    max_pages: u32,
    done: bool,
}

impl<'a, S: EventSource, F: PageFetcher> Pages<'a, S, F> {
    pub fn new(
        source: &'a S,
        fetcher: &'a F,
        classifier: &'a KeywordClassifier,
        max_pages: u32,
    ) -> Self {
        Self {
            source,
            fetcher,
            classifier,
            next_page: 1,
            max_pages,
            done: false,
        }
    }

    fn load(&self, page: u32) -> Result<ListingPage> {
        let url = self.source.page_url(page);
        let html = self
            .fetcher
            .fetch_html(&url)
            .with_context(|| format!("{}: listing page {page}", self.source.source_id()))?;
        Ok(self.source.parse_page(&html, self.classifier))
    }
}

impl<S: EventSource, F: PageFetcher> Iterator for Pages<'_, S, F> {
    type Item = Result<(u32, ListingPage)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let page = self.next_page;
        if page > self.max_pages {
            self.done = true;
            return Some(Err(anyhow!(
                "pagination limit reached for {}: exceeded {} pages",
                self.source.source_id(),
                self.max_pages
            )));
        }

        match self.load(page) {
            Ok(listing) if listing.card_count == 0 => {
                tracing::debug!(page, "no event cards, end of listing");
                self.done = true;
                None
            }
            Ok(listing) => {
                self.next_page += 1;
                Some(Ok((page, listing)))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Collects every free-food event across all listing pages, in page order.
pub fn harvest<S: EventSource, F: PageFetcher>(
    source: &S,
    fetcher: &F,
    classifier: &KeywordClassifier,
    max_pages: u32,
) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    for item in Pages::new(source, fetcher, classifier, max_pages) {
        let (page, mut listing) = item?;
        tracing::info!(
            page,
            cards = listing.card_count,
            matched = listing.events.len(),
            "Scanning page {page}..."
        );
        events.append(&mut listing.events);
    }
    Ok(events)
}
