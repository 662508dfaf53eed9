/// Wake words stripped from input before matching, kept longest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WakeWordSet {
    words: Vec<String>,
}

impl WakeWordSet {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for word in words {
            set.insert(word.as_ref());
        }
        set
    }

    /// Adds a wake word; blank and duplicate entries are ignored.
    pub fn insert(&mut self, word: &str) {
        let word = collapse_whitespace(&word.to_lowercase());
        if word.is_empty() || self.words.contains(&word) {
            return;
        }
        // Stable sort keeps configuration order among equal lengths.
        self.words.push(word);
        self.words.sort_by(|a, b| b.len().cmp(&a.len()));
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Lowercases raw input, strips every wake word and collapses whitespace.
pub fn normalize(input: &str, wake_words: &WakeWordSet) -> String {
    let mut text = collapse_whitespace(&input.to_lowercase());
    for word in wake_words.words() {
        if text.contains(word.as_str()) {
            text = text.replace(word.as_str(), " ");
        }
    }
    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
