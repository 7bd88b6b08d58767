/// Phrases that count as "free food is offered". Matching is a plain
/// lower-case substring test, so "market" also hits "supermarket".
pub const DEFAULT_FOOD_KEYWORDS: &[&str] = &[
    "free food",
    "refreshments",
    "pizza",
    "lunch",
    "snacks",
    "food provided",
    "free drinks",
    "catering",
    "morning tea",
    "afternoon tea",
    "barbecue",
    "barbeque",
    "bbq",
    "free coffee",
    "light lunch",
    "light refreshments",
    "drinks and snacks",
    "free meal",
    "complimentary food",
    "food and drinks",
    "supper",
    "food stall",
    "market",
    "street party",
    "feast",
];

#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_FOOD_KEYWORDS.iter().copied())
    }
}

impl KeywordClassifier {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn has_free_food(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|keyword| lower.contains(keyword.as_str()))
    }
}

/// Classifies with the built-in keyword table.
pub fn has_free_food(text: &str) -> bool {
    let lower = text.to_lowercase();
    DEFAULT_FOOD_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(*keyword))
}
