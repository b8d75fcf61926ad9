//! Text normalization for scraped listing fields.
//!
//! Umlauts on the listing pages usually reach us as replacement characters,
//! so normalization runs in two stages that must stay in this order:
//!
//! 1. **Decode**: transliterate to ASCII, dropping anything without an
//!    ASCII equivalent (including `U+FFFD`).
//! 2. **Repair**: apply [`REPAIRS`], an ordered substitution table that
//!    restores the words the first stage mangled.
//!
//! ```ignore
//! assert_eq!(normalize("M\u{FFFD}rz"), "März");
//! ```

use voca_rs::{case, manipulate};

/// An ordered list of literal `(pattern, replacement)` substitutions.
///
/// Rules are applied front to back, each over the output of the previous
/// one, so reordering them changes the result.
#[derive(Debug, Clone, Copy)]
pub struct RepairTable {
    /// Bumped whenever a rule is added, removed or reordered.
    pub version: u32,
    pub rules: &'static [(&'static str, &'static str)],
}

impl RepairTable {
    /// Apply every rule in order.
    pub fn apply(&self, s: &str) -> String {
        self.rules
            .iter()
            .fold(s.to_string(), |acc, &(pattern, replacement)| {
                acc.replace(pattern, replacement)
            })
    }
}

/// Repairs for artifacts of the morgengrau.net encoding.
pub const REPAIRS: RepairTable = RepairTable {
    version: 1,
    rules: &[
        ("m&B", "m'n'B"),
        ("\"", ""),
        ("kc", "küc"),
        ("ebud", "ebäud"),
        ("wlb", "wölb"),
        ("Mrz", "März"),
        (
            "show_event.pl?sts=det&",
            "https://morgengrau.net/cgi-bin/morgengrau/show_event.pl?sts=det&",
        ),
    ],
};

/// Lossy transliteration to ASCII.
pub fn decode(s: &str) -> String {
    manipulate::latinise(&s.replace(char::REPLACEMENT_CHARACTER, ""))
        .chars()
        .filter(char::is_ascii)
        .collect()
}

pub fn repair(s: &str) -> String {
    REPAIRS.apply(s)
}

/// Decode, then repair.
pub fn normalize(s: &str) -> String {
    repair(&decode(s))
}

/// Repair, then strip surrounding whitespace.
pub fn trim(s: &str) -> String {
    repair(s).trim().to_string()
}

/// Full normalization followed by title casing.
pub fn title(s: &str) -> String {
    title_case(&trim(&normalize(s)))
}

/// Remove every whitespace character, not only the surrounding ones.
pub fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Capitalize every word, where a word starts after any character that is
/// neither alphanumeric nor an apostrophe (`hip-hop` → `Hip-Hop`, `don't` → `Don't`).
fn title_case(s: &str) -> String {
    s.split_inclusive(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|word| case::capitalize(word, true))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repair_restores_umlaut_month() {
        assert_eq!(repair("17. Mrz 2023"), "17. März 2023");
    }

    #[test]
    fn test_repair_restores_brand_fragment() {
        assert_eq!(repair("Drum&Bass Night"), "Drum'n'Bass Night");
        assert_eq!(repair("m&B"), "m'n'B");
    }

    #[test]
    fn test_repair_strips_quotes() {
        assert_eq!(repair("\"Live\" im Keller"), "Live im Keller");
    }

    #[test]
    fn test_repair_rewrites_relative_event_link() {
        assert_eq!(
            repair("show_event.pl?sts=det&id=7"),
            "https://morgengrau.net/cgi-bin/morgengrau/show_event.pl?sts=det&id=7"
        );
    }

    #[test]
    fn test_repair_table_is_versioned() {
        assert_eq!(REPAIRS.version, 1);
        assert_eq!(REPAIRS.rules.len(), 7);
    }

    #[test]
    fn test_custom_table_applies_rules_in_order() {
        let table = RepairTable {
            version: 0,
            rules: &[("ab", "b"), ("bb", "c")],
        };
        assert_eq!(table.apply("abb"), "c");
    }

    #[test]
    fn test_decode_drops_replacement_characters() {
        assert_eq!(decode("M\u{FFFD}rz"), "Mrz");
        assert_eq!(normalize("M\u{FFFD}rz"), "März");
    }

    #[test]
    fn test_decode_latinises_diacritics() {
        assert_eq!(decode("Café"), "Cafe");
    }

    #[test]
    fn test_trim() {
        assert_eq!(trim("  \"Club X\"  "), "Club X");
    }

    #[test]
    fn test_title() {
        assert_eq!(title("  club night  "), "Club Night");
        assert_eq!(title("SOMMER fest"), "Sommer Fest");
    }

    #[test]
    fn test_title_starts_words_after_punctuation() {
        assert_eq!(title("hip-hop night"), "Hip-Hop Night");
        assert_eq!(title("rock/pop abend"), "Rock/Pop Abend");
        assert_eq!(title("foo\tbar"), "Foo\tBar");
        assert_eq!(title("rock&roll (live)"), "Rock&Roll (Live)");
    }

    #[test]
    fn test_title_keeps_apostrophes_inside_words() {
        assert_eq!(title("don't stop"), "Don't Stop");
    }

    #[test]
    fn test_strip_whitespace() {
        assert_eq!(strip_whitespace("A  B\tC"), "ABC");
        assert_eq!(strip_whitespace(" Doors\nopen\r\n at 8 "), "Doorsopenat8");
    }
}
