use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::base;
use super::{EventSource, ListingPage};
use crate::keywords::KeywordClassifier;
use crate::models::Event;

pub const DEFAULT_ORIGIN: &str = "https://www.curtin.edu.au";
const SOURCE_ID: &str = "curtin";
const LISTING_PATH: &str = "/events/";
const DETAILS_MARKER: &str = "Event details";

static EVENT_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="/events/"]"#).expect("curtin event link selector"));
static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h3").expect("curtin heading selector"));
static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("curtin paragraph selector"));

/// Where the fields sit among a card's non-empty `<p>` texts.
///
/// Cards currently render `date`, then a category tag, then `location`.
/// The tag is ignored. Missing positions read as an empty string.
#[derive(Debug, Clone, Copy)]
pub struct CardLayout {
    pub date: usize,
    pub location: usize,
}

pub const CARD_LAYOUT: CardLayout = CardLayout {
    date: 0,
    location: 2,
};

impl CardLayout {
    fn field(paragraphs: &[String], index: usize) -> String {
        paragraphs.get(index).cloned().unwrap_or_default()
    }
}

pub struct CurtinEvents {
    origin: String,
    layout: CardLayout,
}

impl CurtinEvents {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            layout: CARD_LAYOUT,
        }
    }

    pub fn with_layout(mut self, layout: CardLayout) -> Self {
        self.layout = layout;
        self
    }

    fn parse_card(&self, card: ElementRef<'_>, classifier: &KeywordClassifier) -> Option<Event> {
        let heading = card.select(&HEADING_SELECTOR).next()?;
        let title = base::inner_text(heading);
        let full_text = base::inner_text(card);

        if !classifier.has_free_food(&full_text) {
            return None;
        }
        if title.is_empty() {
            tracing::debug!(text = %full_text, "skipping event card with an empty heading");
            return None;
        }

        let href = card.value().attr("href").unwrap_or_default();
        let url = base::absolute_url(&self.origin, href);

        let paragraphs: Vec<String> = card
            .select(&PARAGRAPH_SELECTOR)
            .map(base::inner_text)
            .filter(|text| !text.is_empty())
            .collect();

        let raw_date = CardLayout::field(&paragraphs, self.layout.date);
        let location = CardLayout::field(&paragraphs, self.layout.location);
        let description = residual_description(&full_text, &paragraphs, &title);

        Some(Event {
            title,
            raw_date,
            location,
            description,
            url,
        })
    }
}

impl EventSource for CurtinEvents {
    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn page_url(&self, page: u32) -> String {
        if page <= 1 {
            format!("{}{LISTING_PATH}", self.origin)
        } else {
            format!("{}{LISTING_PATH}page/{page}/", self.origin)
        }
    }

    fn parse_page(&self, html: &str, classifier: &KeywordClassifier) -> ListingPage {
        let document = Html::parse_document(html);
        let mut page = ListingPage::default();

        // An event card is a detail link wrapping an <h3>; plain navigation
        // links to /events/ have no heading.
        let cards = document
            .select(&EVENT_LINK_SELECTOR)
            .filter(|link| link.select(&HEADING_SELECTOR).next().is_some());

        for card in cards {
            page.card_count += 1;
            if let Some(event) = self.parse_card(card, classifier) {
                page.events.push(event);
            }
        }

        page
    }
}

/// Card text left over once paragraphs, the heading and the "Event details"
/// call-to-action are cut out.
///
/// Removal is plain substring deletion, so a paragraph whose text also
/// appears inside the blurb takes that part of the blurb with it.
pub fn residual_description(full_text: &str, paragraphs: &[String], title: &str) -> String {
    let mut remaining = full_text.to_string();
    for paragraph in paragraphs {
        remaining = remaining.replace(paragraph.as_str(), "");
    }
    if !title.is_empty() {
        remaining = remaining.replace(title, "");
    }
    remaining = remaining.replace(DETAILS_MARKER, "");
    base::clean_text(&remaining)
}
