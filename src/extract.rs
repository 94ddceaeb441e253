//! Entity extraction from event descriptions.
//!
//! Descriptions follow the "Person Name - Company Name" convention; the first
//! occurrence of that pattern is the person and company a report is about.
//!
//! A match whose company trims to nothing (e.g. `"Jane Doe - "`) counts as
//! no match rather than an empty company name.

use crate::report::ExtractedEntities;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Two or more letter-only words, a hyphen, then the company run.
    static ref PERSON_COMPANY: Regex =
        Regex::new(r"(\p{L}+\s+\p{L}+(?:\s+\p{L}+)*)\s*-\s*([\p{L}\p{N}\s&.,]+)")
            .expect("person/company pattern is valid");
}

/// Extract the person and company named in a description.
///
/// Returns `None` when the description is empty or does not contain the
/// pattern; that is a normal outcome, not an error.
pub fn extract_entities(description: &str) -> Option<ExtractedEntities> {
    if !description.contains('-') {
        return None;
    }

    let captures = PERSON_COMPANY.captures(description)?;
    let person_name = captures.get(1)?.as_str().trim();
    let company_name = captures.get(2)?.as_str().trim();

    if person_name.is_empty() || company_name.is_empty() {
        return None;
    }

    Some(ExtractedEntities {
        person_name: person_name.to_string(),
        company_name: company_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(description: &str) -> Option<(String, String)> {
        extract_entities(description).map(|e| (e.person_name, e.company_name))
    }

    #[test]
    fn extracts_simple_pair() {
        assert_eq!(
            pair("Jane Doe - Acme Corp"),
            Some(("Jane Doe".to_string(), "Acme Corp".to_string()))
        );
    }

    #[test]
    fn tolerates_missing_spaces_around_hyphen() {
        assert_eq!(
            pair("Jane Doe-Acme"),
            Some(("Jane Doe".to_string(), "Acme".to_string()))
        );
    }

    #[test]
    fn supports_unicode_names_and_company_punctuation() {
        assert_eq!(
            pair("José Álvarez Núñez - Müller & Söhne, Inc."),
            Some((
                "José Álvarez Núñez".to_string(),
                "Müller & Söhne, Inc.".to_string()
            ))
        );
    }

    #[test]
    fn company_may_contain_digits() {
        assert_eq!(
            pair("Ann Lee - 3M Company"),
            Some(("Ann Lee".to_string(), "3M Company".to_string()))
        );
    }

    #[test]
    fn company_stops_at_unsupported_characters() {
        assert_eq!(
            pair("Jane Doe - Acme Corp (intro call)"),
            Some(("Jane Doe".to_string(), "Acme Corp".to_string()))
        );
    }

    #[test]
    fn returns_first_match_only() {
        assert_eq!(
            pair("Jane Doe - Acme; John Roe - Globex"),
            Some(("Jane Doe".to_string(), "Acme".to_string()))
        );
    }

    #[test]
    fn single_word_name_does_not_match() {
        assert_eq!(pair("Jane - Acme"), None);
    }

    #[test]
    fn no_hyphen_no_match() {
        assert_eq!(pair("Weekly sync"), None);
        assert_eq!(pair(""), None);
    }

    #[test]
    fn empty_company_does_not_match() {
        assert_eq!(pair("Jane Doe - "), None);
    }
}
