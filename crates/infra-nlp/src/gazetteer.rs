// Gazetteer - known entity names by label

use sentiq_core::domain::EntityLabel;
use std::collections::HashMap;

const PERSONS: &[&str] = &[
    "Obama", "Barack Obama", "Michelle Obama", "Angela Merkel", "Merkel", "Emmanuel Macron",
    "Macron", "Joe Biden", "Biden", "Donald Trump", "Trump", "Elon Musk", "Musk", "Taylor Swift",
    "Bill Gates", "Tim Cook", "Satya Nadella", "Pope Francis", "Vladimir Putin", "Putin",
];

const LOCATIONS: &[&str] = &[
    "Paris", "London", "Berlin", "Tokyo", "Madrid", "Rome", "Beijing", "Moscow", "New York",
    "Los Angeles", "San Francisco", "Washington", "Brussels", "France", "Germany", "Spain",
    "Italy", "Japan", "China", "Russia", "Ukraine", "India", "Canada", "Brazil", "Europe",
    "Asia", "Africa", "United States", "United Kingdom", "California", "Texas",
];

const ORGANIZATIONS: &[&str] = &[
    "Google", "Microsoft", "Apple", "Amazon", "Meta", "Tesla", "NASA", "Reuters", "BBC",
    "United Nations", "European Union", "NATO", "World Bank", "Congress", "Senate",
    "Federal Reserve", "Red Cross", "FIFA",
];

/// Maximum phrase length (in tokens) considered for a match
const MAX_PHRASE_TOKENS: usize = 4;

/// Case-insensitive phrase lookup of PERSON / LOCATION / ORGANIZATION names
///
/// A token only matches when it starts with an uppercase letter, so common
/// nouns that double as names ("turkey", "apple") are left alone.
pub struct Gazetteer {
    entries: HashMap<String, EntityLabel>,
    longest: usize,
}

impl Default for Gazetteer {
    fn default() -> Self {
        let mut gazetteer = Self::empty();
        gazetteer.extend(EntityLabel::Person, PERSONS.iter().copied());
        gazetteer.extend(EntityLabel::Location, LOCATIONS.iter().copied());
        gazetteer.extend(EntityLabel::Organization, ORGANIZATIONS.iter().copied());
        gazetteer
    }
}

impl Gazetteer {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            longest: 0,
        }
    }

    /// Register a phrase; later registrations win on conflict
    pub fn add(&mut self, label: EntityLabel, phrase: &str) {
        let words: Vec<String> = phrase.split_whitespace().map(str::to_lowercase).collect();
        if words.is_empty() || words.len() > MAX_PHRASE_TOKENS {
            return;
        }
        self.longest = self.longest.max(words.len());
        self.entries.insert(words.join(" "), label);
    }

    pub fn extend<I, S>(&mut self, label: EntityLabel, phrases: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for phrase in phrases {
            self.add(label, phrase.as_ref());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Label each token, preferring the longest phrase starting at a position
    ///
    /// Every token of a matched phrase carries the phrase's label.
    pub fn tag(&self, tokens: &[&str]) -> Vec<Option<EntityLabel>> {
        let mut labels = vec![None; tokens.len()];
        let mut i = 0;

        while i < tokens.len() {
            match self.longest_match(&tokens[i..]) {
                Some((len, label)) => {
                    labels[i..i + len].fill(Some(label));
                    i += len;
                }
                None => i += 1,
            }
        }

        labels
    }

    fn longest_match(&self, tokens: &[&str]) -> Option<(usize, EntityLabel)> {
        let max = self.longest.min(tokens.len());
        (1..=max).rev().find_map(|len| {
            let window = &tokens[..len];
            if !window.iter().all(|t| starts_uppercase(t)) {
                return None;
            }
            let key = window
                .iter()
                .map(|t| t.to_lowercase())
                .collect::<Vec<_>>()
                .join(" ");
            self.entries.get(&key).map(|label| (len, *label))
        })
    }
}

fn starts_uppercase(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_uppercase)
}
