// Unit tests for session values

use super::*;
use std::collections::HashSet;

#[test]
fn test_unique_credentials_do_not_collide() {
    // A tight loop mints many suffixes inside the same millisecond
    let mut seen = HashSet::new();
    for _ in 0..500 {
        let creds = Credentials::unique("player");
        assert!(creds.email.starts_with("player-"));
        assert!(creds.email.ends_with("@chiprobe.test"));
        assert!(seen.insert(creds.email), "duplicate email generated");
    }
}

#[test]
fn test_unique_names_carry_the_kind() {
    let name = unique_name("Campaign");
    assert!(name.starts_with("Campaign "));

    let mut seen = HashSet::new();
    for _ in 0..500 {
        assert!(seen.insert(unique_name("Fight")), "duplicate name generated");
    }
}

#[test]
fn test_token_from_header_strips_bearer_prefix() {
    let token = AuthToken::from_header_value("Bearer eyJhbGciOiJIUzI1NiJ9.payload.sig").unwrap();
    assert_eq!(token.as_str(), "eyJhbGciOiJIUzI1NiJ9.payload.sig");
    assert_eq!(token.bearer(), "Bearer eyJhbGciOiJIUzI1NiJ9.payload.sig");
}

#[test]
fn test_token_from_bare_header_value() {
    let token = AuthToken::from_header_value("sometoken").unwrap();
    assert_eq!(token.as_str(), "sometoken");
}

#[test]
fn test_empty_token_sources_yield_none() {
    assert!(AuthToken::from_header_value("").is_none());
    assert!(AuthToken::from_header_value("Bearer ").is_none());
    assert!(AuthToken::from_cookie_value("  ").is_none());
}

#[test]
fn test_token_preview_truncates() {
    let token = AuthToken::from_cookie_value("abcdefghijklmnopqrstuvwxyz").unwrap();
    let preview = token.preview();
    assert!(preview.starts_with("abcdefghijkl"));
    assert!(preview.len() < 20);

    let short = AuthToken::from_cookie_value("short").unwrap();
    assert_eq!(short.preview(), "short");
}

#[test]
fn test_token_preview_respects_char_boundaries() {
    // Multibyte chars around the cut point must not panic the truncation
    let token = AuthToken::from_cookie_value("éééééééééééééééé").unwrap();
    let preview = token.preview();
    assert!(preview.ends_with('…'));
    assert_eq!(preview.chars().count(), 13);

    let exact = AuthToken::from_cookie_value("éééééééééééé").unwrap();
    assert_eq!(exact.preview(), "éééééééééééé");
}
