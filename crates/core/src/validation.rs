//! Field rules for authors and posts
//!
//! Write inputs in `domain` derive `validator::Validate`; length rules are
//! declared on the fields and the rules below plug in as custom validators.
//! Name uniqueness needs the stored authors and is checked by the write path
//! in `application`.

use crate::domain::CATEGORIES;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors};

pub const MIN_CONTENT_LENGTH: usize = 250;
pub const MAX_SUMMARY_LENGTH: usize = 250;

/// A title must contain at least one of these (case-sensitive substring match)
pub const TITLE_KEYWORDS: [&str; 4] = ["Won't Believe", "Secret", "Top", "Guess"];

// Kept in sync with the `message` literals on the derived rules in `domain`
pub const MSG_NAME_EMPTY: &str = "Author cannot be empty.";
pub const MSG_NAME_TAKEN: &str = "Author with this name already exists.";
pub const MSG_PHONE_NUMBER: &str = "Phone number must be 10 digits";
pub const MSG_TITLE_EMPTY: &str = "Post must have a title.";
pub const MSG_TITLE_KEYWORD: &str =
    "Post title must contain one of the following: 'Won't Believe', 'Secret', 'Top [number]', 'Guess'";
pub const MSG_CONTENT_LENGTH: &str = "Content must be at least 250 characters";
pub const MSG_SUMMARY_LENGTH: &str = "Post summary must be under 250 characters";
pub const MSG_CATEGORY: &str = "Post category must be either 'Fiction' or 'Non-Fiction'.";

// Ten Unicode decimal digits (general category Nd)
static PHONE_NUMBER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{Nd}{10}$").expect("Failed to compile phone number regex"));

/// Builds a failed rule carrying its human readable message
pub fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// A collection holding a single failed rule for `field`
pub fn field_error(field: &'static str, error: ValidationError) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    errors
}

pub fn name_taken() -> ValidationError {
    rule_error("unique", MSG_NAME_TAKEN)
}

/// Flattens a collection into `(field, message)` pairs sorted by field
pub fn field_messages(errors: &ValidationErrors) -> Vec<(String, String)> {
    let mut messages: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            let field = field.to_string();
            field_errors.iter().map(move |e| (field.clone(), message_of(e)))
        })
        .collect();
    messages.sort();
    messages
}

fn message_of(error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => error.code.to_string(),
    }
}

/// Only runs for a supplied phone number. An empty one is accepted, the field is optional.
pub fn validate_phone_number(phone_number: &str) -> Result<(), ValidationError> {
    if phone_number.is_empty() || PHONE_NUMBER_REGEX.is_match(phone_number) {
        Ok(())
    } else {
        Err(rule_error("phone_number", MSG_PHONE_NUMBER))
    }
}

/// Plain substring containment, so "Topical" passes through "Top"
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        return Err(rule_error("required", MSG_TITLE_EMPTY));
    }
    if !TITLE_KEYWORDS.iter().any(|keyword| title.contains(keyword)) {
        return Err(rule_error("title_keyword", MSG_TITLE_KEYWORD));
    }
    Ok(())
}

pub fn validate_category(category: &str) -> Result<(), ValidationError> {
    if !CATEGORIES.contains(&category) {
        return Err(rule_error("category", MSG_CATEGORY));
    }
    Ok(())
}
