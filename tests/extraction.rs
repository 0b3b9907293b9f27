//! Domain extraction from OCR text, through the public API.

use domain_analyzer::{extract_domains, DomainCandidate};

fn hosts(lines: &[&str]) -> Vec<String> {
    extract_domains(lines)
        .into_iter()
        .map(|domain| domain.to_string())
        .collect()
}

#[test]
fn test_screenshot_text_yields_domains_in_discovery_order() {
    let lines = [
        "Search results",
        "Visit EXAMPLE.com today!",
        "https://www.rust-lang.org/learn and example.com again",
        "mail me at admin@docs.example.org",
        "nothing to see here",
    ];
    assert_eq!(
        hosts(&lines),
        vec!["example.com", "www.rust-lang.org", "docs.example.org"]
    );
}

#[test]
fn test_lines_without_domains_yield_nothing() {
    assert!(hosts(&[]).is_empty());
    assert!(hosts(&["", "   ", "no dots here", "version 1.2.3", "192.168.0.1"]).is_empty());
}

#[test]
fn test_disallowed_tlds_are_dropped() {
    assert!(hosts(&["go to example.zzz", "file.txt", "photo.jpeg"]).is_empty());
}

#[test]
fn test_extraction_is_idempotent() {
    let lines = ["a.example.com, b.example.com", "A.EXAMPLE.COM"];
    let first = hosts(&lines);
    let second: Vec<String> = extract_domains(&first)
        .into_iter()
        .map(|domain| domain.to_string())
        .collect();
    assert_eq!(first, second);
    assert_eq!(first, vec!["a.example.com", "b.example.com"]);
}

#[test]
fn test_candidates_serialize_as_plain_strings() {
    let domain = DomainCandidate::parse("Example.COM").unwrap();
    assert_eq!(
        serde_json::to_value(&domain).unwrap(),
        serde_json::json!("example.com")
    );
}
