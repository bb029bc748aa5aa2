//! Lexical signatures mined from an item's free text.
//!
//! Two things are extracted from the same text:
//! - a normalized token list (lowercased, accents stripped, short and stop words dropped)
//! - an optional size signature such as `M3x10` (fastener) or `20x40` (generic)

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::model::{CategoryNames, Item};

/// Tokens shorter than this are ignored.
pub const MIN_TOKEN_LEN: usize = 3;

const STOPWORDS: &[&str] = &[
    "de", "du", "des", "la", "le", "les", "un", "une", "et", "ou", "pour", "avec", "dans", "sur",
    "sans", "par", "the", "and", "for", "with", "to", "from", "en", "a", "au", "aux", "ce", "cet",
    "cette", "ces", "is", "are", "of", "on", "at", "x", "mm", "cm", "m", "pcs", "piece", "pieces",
    "lot", "kit", "set",
];

const NUMBER: &str = r"(\d+(?:[.,]\d+)?)";

static FASTENER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\bM{NUMBER}\s*[x×]\s*{NUMBER}"))
        .unwrap_or_else(|err| unreachable!("fastener pattern is a valid regex: {err}"))
});

static GENERIC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i){NUMBER}\s*[x×]\s*{NUMBER}"))
        .unwrap_or_else(|err| unreachable!("generic size pattern is a valid regex: {err}"))
});

/// Which pattern produced a size signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeKind {
    /// `M<diameter>x<length>`, metric screws and bolts.
    Fastener,
    /// Any other `<n>x<m>` pair.
    Generic,
}

impl SizeKind {
    fn prefix(self) -> char {
        match self {
            SizeKind::Fastener => 'M',
            SizeKind::Generic => 'S',
        }
    }
}

/// Parsed size found in an item's text.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SizeSignature {
    pub kind: SizeKind,
    pub diameter: f64,
    pub length: f64,
}

impl SizeSignature {
    /// Family shared by all sizes with the same kind and diameter, e.g. `M3` or `S20`.
    pub fn family(&self) -> String {
        format!("{}{}", self.kind.prefix(), self.diameter)
    }

    /// Orders by diameter, then length.
    pub fn cmp_size(&self, other: &Self) -> Ordering {
        self.diameter
            .total_cmp(&other.diameter)
            .then_with(|| self.length.total_cmp(&other.length))
    }
}

impl fmt::Display for SizeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.family(), self.length)
    }
}

/// Tokens and size signature of one item.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemSignature {
    pub tokens: Vec<String>,
    pub size: Option<SizeSignature>,
}

impl ItemSignature {
    /// Extracts the signature from the item's title, description, content and category name.
    pub fn of(item: &Item, categories: &CategoryNames) -> Self {
        let category_name = item
            .category_id
            .as_deref()
            .and_then(|id| categories.get(id))
            .map(String::as_str);
        let text = item.search_text(category_name);

        Self {
            tokens: tokenize(&text),
            size: extract_size_signature(&text),
        }
    }

    pub fn first_token(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }
}

/// Splits text into normalized, de-duplicated tokens in order of first appearance.
///
/// # Examples
/// ```
/// use drawer_tidy::signature::tokenize;
///
/// assert_eq!(tokenize("Vis à tête fraisée, lot de 50"), vec!["vis", "tete", "fraisee"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let mut tokens: Vec<String> = Vec::new();
    for raw in folded.split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit())) {
        if raw.len() < MIN_TOKEN_LEN || STOPWORDS.contains(&raw) {
            continue;
        }
        if !tokens.iter().any(|existing| existing == raw) {
            tokens.push(raw.to_owned());
        }
    }
    tokens
}

/// Looks for a fastener size first, then a generic `<n>x<m>` size.
///
/// Only the first match of each pattern is used; a decimal comma is read as a dot.
pub fn extract_size_signature(text: &str) -> Option<SizeSignature> {
    first_match(&FASTENER_PATTERN, text, SizeKind::Fastener)
        .or_else(|| first_match(&GENERIC_PATTERN, text, SizeKind::Generic))
}

fn first_match(pattern: &Regex, text: &str, kind: SizeKind) -> Option<SizeSignature> {
    let captures = pattern.captures(text)?;
    let diameter = parse_number(captures.get(1)?.as_str())?;
    let length = parse_number(captures.get(2)?.as_str())?;
    Some(SizeSignature {
        kind,
        diameter,
        length,
    })
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use pretty_assertions::assert_eq;

    #[test]
    fn tokenize_strips_accents_and_stopwords() {
        assert_eq!(
            tokenize("Câbles Dupont pour ÉLECTRONIQUE et Arduino"),
            vec!["cables", "dupont", "electronique", "arduino"]
        );
    }

    #[test]
    fn tokenize_drops_short_tokens_and_duplicates() {
        assert_eq!(
            tokenize("LED 5mm, led rouge / LED verte x 10"),
            vec!["led", "5mm", "rouge", "verte"]
        );
        assert!(tokenize("a b c - 12").is_empty());
    }

    #[test]
    fn fastener_signature_wins_over_generic() {
        let signature = extract_size_signature("Boîte 20x40 de vis m3x10").expect("signature");
        assert_eq!(signature.kind, SizeKind::Fastener);
        assert_eq!(signature.family(), "M3");
        assert_eq!(signature.length, 10.0);
    }

    #[test]
    fn decimal_comma_and_spaces_are_accepted() {
        let signature = extract_size_signature("Vis M2,5 x 8 inox").expect("signature");
        assert_eq!(signature.family(), "M2.5");
        assert_eq!(signature.diameter, 2.5);
        assert_eq!(signature.length, 8.0);
        assert_eq!(signature.to_string(), "M2.5x8");
    }

    #[test]
    fn generic_signature_uses_s_family() {
        let signature = extract_size_signature("Profilé alu 20x20 et 20x40").expect("signature");
        assert_eq!(signature.kind, SizeKind::Generic);
        assert_eq!(signature.family(), "S20");
        assert_eq!(signature.length, 20.0);
    }

    #[test]
    fn no_signature_is_not_an_error() {
        assert_eq!(extract_size_signature("Condensateurs céramique"), None);
        assert_eq!(extract_size_signature(""), None);
    }

    #[test]
    fn sizes_order_by_diameter_then_length() {
        let small = extract_size_signature("M3x12").expect("signature");
        let short = extract_size_signature("M4x6").expect("signature");
        let long = extract_size_signature("M4x20").expect("signature");

        assert_eq!(small.cmp_size(&short), Ordering::Less);
        assert_eq!(short.cmp_size(&long), Ordering::Less);
        assert_eq!(long.cmp_size(&long), Ordering::Equal);
    }

    #[test]
    fn item_signature_includes_category_name() {
        let categories: CategoryNames = [Category::new("c1", "Visserie")]
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        let item = Item::new("b1", "Boulons M6x30", 1, 1).with_category("c1");

        let signature = ItemSignature::of(&item, &categories);
        assert_eq!(signature.tokens, vec!["boulons", "m6x30", "visserie"]);
        assert_eq!(signature.size.map(|s| s.family()), Some("M6".to_string()));
        assert_eq!(signature.first_token(), Some("boulons"));
    }
}
