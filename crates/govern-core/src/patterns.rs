//! Shared detection patterns for field names.
//!
//! Used by the analyzer (sensitive-data flag) and by the rule engine
//! (sensitive fields that are not marked as PII). Patterns match against
//! field names, not data values.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // =========================================================================
    // PERSONAL DATA
    // =========================================================================

    pub static ref SSN_PATTERN: Regex = Regex::new(
        r"(?i)(^|_)(ssn|social_?security(_?number)?|national_?id)($|_)"
    ).unwrap();

    pub static ref EMAIL_PATTERN: Regex = Regex::new(
        r"(?i)(^|_)e_?mail(_?address)?($|_)"
    ).unwrap();

    pub static ref PHONE_PATTERN: Regex = Regex::new(
        r"(?i)(^|_)(phone|mobile|cell)(_?(number|no))?($|_)"
    ).unwrap();

    pub static ref BIRTH_DATE_PATTERN: Regex = Regex::new(
        r"(?i)(^|_)(dob|date_?of_?birth|birth_?date|birthday)($|_)"
    ).unwrap();

    pub static ref ADDRESS_PATTERN: Regex = Regex::new(
        r"(?i)(^|_)((street|home|postal|mailing|billing|shipping)_?)?address(_?line_?\d*)?($|_)"
    ).unwrap();

    pub static ref PASSPORT_PATTERN: Regex = Regex::new(
        r"(?i)(^|_)(passport|drivers?_?licen[cs]e|tax_?id|tin)(_?(number|no))?($|_)"
    ).unwrap();

    // =========================================================================
    // HEALTH DATA
    // =========================================================================

    pub static ref HEALTH_PATTERN: Regex = Regex::new(
        r"(?i)(^|_)(patient|diagnos[ie]s|medical|health|prescriptions?|medications?|treatment|symptoms?|allerg(y|ies)|blood_?type|icd_?\d*|mrn)($|_)"
    ).unwrap();

    // =========================================================================
    // FINANCIAL DATA
    // =========================================================================

    pub static ref CREDIT_CARD_PATTERN: Regex = Regex::new(
        r"(?i)(^|_)(credit_?card|card_?number|pan|cvv|cvc)($|_)"
    ).unwrap();

    pub static ref BANK_ACCOUNT_PATTERN: Regex = Regex::new(
        r"(?i)(^|_)(iban|bank_?account|account_?number|routing_?number)($|_)"
    ).unwrap();

    // =========================================================================
    // CREDENTIALS
    // =========================================================================

    pub static ref CREDENTIAL_PATTERN: Regex = Regex::new(
        r"(?i)(^|_)(password|passwd|secret|api_?key|access_?token|auth_?token|private_?key)($|_)"
    ).unwrap();
}

/// Category of sensitive data a field name suggests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensitiveKind {
    Personal,
    Health,
    Financial,
    Credential,
}

/// Normalize camelCase and kebab-case names to snake_case so one set of
/// patterns covers all naming conventions.
fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c == '-' || c == ' ' || c == '.' {
            out.push('_');
            prev_lower = false;
        } else if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            out.push(c);
        }
    }
    out
}

/// Classify a field name, if it looks like it holds sensitive data.
pub fn classify_field_name(name: &str) -> Option<SensitiveKind> {
    let name = normalize(name);

    if CREDENTIAL_PATTERN.is_match(&name) {
        return Some(SensitiveKind::Credential);
    }
    if CREDIT_CARD_PATTERN.is_match(&name) || BANK_ACCOUNT_PATTERN.is_match(&name) {
        return Some(SensitiveKind::Financial);
    }
    if HEALTH_PATTERN.is_match(&name) {
        return Some(SensitiveKind::Health);
    }

    let personal = SSN_PATTERN.is_match(&name)
        || EMAIL_PATTERN.is_match(&name)
        || PHONE_PATTERN.is_match(&name)
        || BIRTH_DATE_PATTERN.is_match(&name)
        || ADDRESS_PATTERN.is_match(&name)
        || PASSPORT_PATTERN.is_match(&name);

    personal.then_some(SensitiveKind::Personal)
}

/// Check if a field name suggests sensitive content.
pub fn is_sensitive_field_name(name: &str) -> bool {
    classify_field_name(name).is_some()
}
