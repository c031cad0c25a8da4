//! De-duplicated, insertion-ordered string/data pool.
//!
//! Mirrors the interner's dedup-on-insert discipline: a hash map from normalized
//! content to an index gives O(1) duplicate detection, while a parallel `Vec`
//! preserves insertion order for the final `.data` segment.

use ahash::AHashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringEntry {
    /// The literal's decoded content (after the lexer has already resolved escape
    /// sequences): its length is the string's runtime byte length.
    pub raw: String,
    /// The same content re-escaped into assembler-literal form for emission.
    pub escaped: String,
}

impl StringEntry {
    #[must_use]
    pub fn label(index: usize) -> String {
        format!(".msg_{index}")
    }
}

#[derive(Debug, Default)]
pub struct StringPool {
    entries: Vec<StringEntry>,
    index_of: AHashMap<String, usize>,
}

impl StringPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `content` (already escape-decoded) into the pool, returning its label.
    /// A second insert of identical content returns the label from the first.
    pub fn insert(&mut self, content: &str) -> String {
        if let Some(&index) = self.index_of.get(content) {
            return StringEntry::label(index);
        }
        let index = self.entries.len();
        self.entries.push(StringEntry {
            raw: content.to_owned(),
            escaped: escape_for_assembler(content),
        });
        self.index_of.insert(content.to_owned(), index);
        StringEntry::label(index)
    }

    #[must_use]
    pub fn entries(&self) -> &[StringEntry] {
        &self.entries
    }
}

/// Re-escapes decoded string content into the assembler's own two-character escape
/// forms; every other character passes through unchanged.
#[must_use]
pub fn escape_for_assembler(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{c}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_identical_content_to_the_same_label() {
        let mut pool = StringPool::new();
        let a = pool.insert("hello");
        let b = pool.insert("hello");
        assert_eq!(a, b);
        assert_eq!(pool.entries().len(), 1);
    }

    #[test]
    fn distinct_content_gets_distinct_labels() {
        let mut pool = StringPool::new();
        let a = pool.insert("hello");
        let b = pool.insert("world");
        assert_ne!(a, b);
        assert_eq!(pool.entries().len(), 2);
    }

    #[test]
    fn labels_are_sequential_in_insertion_order() {
        let mut pool = StringPool::new();
        assert_eq!(pool.insert("a"), ".msg_0");
        assert_eq!(pool.insert("b"), ".msg_1");
        assert_eq!(pool.insert("a"), ".msg_0");
    }

    #[test]
    fn escape_normalization_is_idempotent_on_text_with_no_specials() {
        let plain = "hello world 123";
        assert_eq!(escape_for_assembler(plain), escape_for_assembler(escape_for_assembler(plain).as_str()));
    }

    #[test]
    fn escapes_newline_and_quote() {
        assert_eq!(escape_for_assembler("a\nb\"c"), "a\\nb\\\"c");
    }
}
