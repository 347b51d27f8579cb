//! Keyword Tables
//!
//! Fixed term lists used by both extractors. All lower-case; matching is
//! case-insensitive substring containment.

/// Payment / identity / urgency terms looked for in OCR text and image URLs
pub const SUSPICIOUS_KEYWORDS: &[&str] = &[
    "http", "www", "aadhar", "aadhaar", "pan", "upi", "credit", "debit",
    "card", "cvv", "otp", "password", "ssn", "account", "bank", "payment",
    "verify", "urgent", "suspended", "locked", "click here",
];

/// Matches needed for a full suspicious-strings score
pub const SUSPICIOUS_MATCHES_FOR_FULL_SCORE: f32 = 5.0;

/// Tokens that mark recognized text as containing a link
pub const LINK_INDICATORS: &[&str] = &["http", "www", ".com", ".net"];

/// Phishing vocabulary counted in popup text
pub const PHISHING_KEYWORDS: &[&str] = &[
    "urgent", "verify", "suspended", "locked", "account", "payment",
    "credit card", "ssn", "social security", "aadhar", "pan", "otp",
    "click here", "act now", "limited time", "expire", "confirm",
];

pub const URGENCY_KEYWORDS: &[&str] = &["urgent", "now", "immediately", "expire"];

pub const PAYMENT_KEYWORDS: &[&str] = &["payment", "pay", "credit", "debit", "bank"];

pub const VERIFICATION_KEYWORDS: &[&str] = &["verify", "confirm", "validate"];

/// Field labels that request sensitive data (substring match)
pub const SENSITIVE_FIELD_TERMS: &[&str] = &[
    "password", "credit_card", "cvv", "ssn", "pin", "otp",
    "card_number", "account_number", "routing", "aadhar", "pan",
];

/// Exact field labels of password inputs
pub const PASSWORD_FIELD_LABELS: &[&str] = &["password"];

/// Exact field labels of payment inputs
pub const PAYMENT_FIELD_LABELS: &[&str] = &["cvv", "credit_card", "card_number"];

/// Host fragments typical of credential-phishing domains
pub const SUSPICIOUS_DOMAIN_TERMS: &[&str] = &["verify", "secure", "account", "update", "login"];

// ============================================================================
// MATCHING HELPERS
// ============================================================================

/// Does lower-cased `haystack` contain any of `terms`?
pub fn contains_any(haystack_lower: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| haystack_lower.contains(t))
}

/// How many of `terms` occur in lower-cased `haystack`
pub fn count_matches(haystack_lower: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|t| haystack_lower.contains(*t)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_lowercase() {
        for table in [
            SUSPICIOUS_KEYWORDS,
            LINK_INDICATORS,
            PHISHING_KEYWORDS,
            URGENCY_KEYWORDS,
            PAYMENT_KEYWORDS,
            VERIFICATION_KEYWORDS,
            SENSITIVE_FIELD_TERMS,
            SUSPICIOUS_DOMAIN_TERMS,
        ] {
            for term in table {
                assert_eq!(*term, term.to_lowercase());
            }
        }
    }

    #[test]
    fn test_count_matches() {
        assert_eq!(count_matches("verify your bank account", SUSPICIOUS_KEYWORDS), 3);
        assert_eq!(count_matches("hello", SUSPICIOUS_KEYWORDS), 0);
        assert!(contains_any("visit www.example.net", LINK_INDICATORS));
    }
}
