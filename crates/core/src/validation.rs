//! Cleaning and validation of brand and seller records before they are
//! stored. Validation never fails; problems are reported through
//! `validation_status` and `validation_issues`.

use std::collections::BTreeMap;

use crate::domain::brand::Brand;
use crate::domain::seller::Seller;
use crate::domain::ValidationStatus;

const SOCIAL_HOSTS: &[(&str, &[&str])] = &[
    ("linkedin", &["linkedin.com"]),
    ("instagram", &["instagram.com"]),
    ("facebook", &["facebook.com"]),
    ("twitter", &["twitter.com", "x.com"]),
];

pub fn validate_brand(brand: &Brand) -> Brand {
    let mut validated = brand.clone();
    let mut issues = Vec::new();

    validated.name = validated_name(&brand.name, "Invalid brand name", "Unknown Brand", &mut issues);

    validated.domain = match non_empty(brand.domain.as_deref()) {
        Some(domain) => {
            let normalized = normalize_url(domain);
            if is_valid_url(&normalized) {
                Some(normalized)
            } else {
                issues.push("Invalid domain".to_string());
                None
            }
        }
        None => None,
    };

    validated.email = validated_email(brand.email.as_deref(), &mut issues);
    validated.phone = non_empty(brand.phone.as_deref()).map(clean_phone);
    validated.social_media = validated_social_media(&brand.social_media);

    finish(&mut validated.validation_status, &mut validated.validation_issues, issues);
    validated
}

pub fn validate_seller(seller: &Seller) -> Seller {
    let mut validated = seller.clone();
    let mut issues = Vec::new();

    validated.name = validated_name(&seller.name, "Invalid name", "Unknown Seller", &mut issues);
    validated.email = validated_email(seller.email.as_deref(), &mut issues);

    validated.store_url = match non_empty(seller.store_url.as_deref()) {
        Some(url) if is_valid_url(url) => Some(normalize_url(url)),
        Some(_) => {
            issues.push("Invalid URL".to_string());
            None
        }
        None => None,
    };

    validated.phone = non_empty(seller.phone.as_deref()).map(clean_phone);

    finish(&mut validated.validation_status, &mut validated.validation_issues, issues);
    validated
}

fn finish(status: &mut ValidationStatus, slot: &mut Vec<String>, issues: Vec<String>) {
    *status = if issues.is_empty() { ValidationStatus::Valid } else { ValidationStatus::Invalid };
    *slot = issues;
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn validated_name(raw: &str, issue: &str, fallback: &str, issues: &mut Vec<String>) -> String {
    let name = raw.trim();
    if name.chars().count() < 2 {
        issues.push(issue.to_string());
        return if name.is_empty() { fallback.to_string() } else { name.to_string() };
    }
    clean_text(name)
}

fn validated_email(raw: Option<&str>, issues: &mut Vec<String>) -> Option<String> {
    let email = non_empty(raw)?;
    if is_valid_email(email) {
        Some(email.to_lowercase())
    } else {
        issues.push("Invalid email format".to_string());
        None
    }
}

fn validated_social_media(links: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    links
        .iter()
        .filter(|(platform, url)| {
            let url = url.trim();
            if url.is_empty() || !is_valid_url(url) {
                return false;
            }
            let lowered = url.to_lowercase();
            SOCIAL_HOSTS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(platform))
                .map(|(_, hosts)| hosts.iter().any(|host| lowered.contains(host)))
                .unwrap_or(true)
        })
        .map(|(platform, url)| (platform.clone(), url.trim().to_string()))
        .collect()
}

/// Collapses whitespace and strips characters other than word characters,
/// whitespace and `-.,&()`.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|ch| {
            ch.is_alphanumeric() || *ch == '_' || ch.is_whitespace() || "-.,&()".contains(*ch)
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// `local@domain.tld` where the tld has at least two letters.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local.chars().all(|ch| ch.is_ascii_alphanumeric() || "._%+-".contains(ch));
    let domain_ok = !domain.is_empty()
        && domain.chars().all(|ch| ch.is_ascii_alphanumeric() || ".-".contains(ch));
    let tld_ok = domain
        .rsplit_once('.')
        .is_some_and(|(host, tld)| {
            !host.is_empty() && tld.len() >= 2 && tld.chars().all(|ch| ch.is_ascii_alphabetic())
        });
    local_ok && domain_ok && tld_ok
}

/// A URL needs a scheme and a host.
pub fn is_valid_url(url: &str) -> bool {
    let Some((scheme, rest)) = url.split_once("://") else {
        return false;
    };
    let scheme_ok = scheme.chars().next().is_some_and(|ch| ch.is_ascii_alphabetic())
        && scheme.chars().all(|ch| ch.is_ascii_alphanumeric() || "+-.".contains(ch));
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    scheme_ok && !host.is_empty() && !host.contains(char::is_whitespace)
}

pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Formats 10-digit and `1`-prefixed 11-digit numbers as US numbers; other
/// inputs are returned trimmed.
pub fn clean_phone(phone: &str) -> String {
    let digits = phone.chars().filter(char::is_ascii_digit).collect::<String>();
    match digits.len() {
        10 => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
        11 if digits.starts_with('1') => {
            format!("+1 ({}) {}-{}", &digits[1..4], &digits[4..7], &digits[7..])
        }
        _ => phone.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{clean_phone, clean_text, is_valid_email, validate_brand, validate_seller};
    use crate::domain::brand::Brand;
    use crate::domain::seller::Seller;
    use crate::domain::ValidationStatus;

    #[test]
    fn brand_fields_are_cleaned_and_normalized() {
        let mut brand = Brand::new("  Acme   Outdoor™ Co. ");
        brand.domain = Some("acme-outdoor.example".to_string());
        brand.email = Some("Hello@Acme-Outdoor.Example".to_string());
        brand.social_media.insert("linkedin".to_string(), "https://linkedin.com/company/acme".to_string());
        brand.social_media.insert("instagram".to_string(), "https://facebook.com/acme".to_string());
        brand.social_media.insert("twitter".to_string(), "https://x.com/acme".to_string());
        brand.social_media.insert("youtube".to_string(), "https://youtube.com/@acme".to_string());
        brand.social_media.insert("facebook".to_string(), String::new());

        let validated = validate_brand(&brand);

        assert_eq!(validated.name, "Acme Outdoor Co.");
        assert_eq!(validated.domain.as_deref(), Some("https://acme-outdoor.example"));
        assert_eq!(validated.email.as_deref(), Some("hello@acme-outdoor.example"));
        assert_eq!(
            validated.social_media.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["linkedin", "twitter", "youtube"]
        );
        assert_eq!(validated.validation_status, ValidationStatus::Valid);
        assert!(validated.validation_issues.is_empty());
    }

    #[test]
    fn invalid_seller_fields_are_dropped_and_reported() {
        let mut seller = Seller::new("X");
        seller.email = Some("not-an-email".to_string());
        seller.store_url = Some("amazon.com/shops/x".to_string());
        seller.phone = Some("555.867.5309".to_string());

        let validated = validate_seller(&seller);

        assert_eq!(validated.validation_status, ValidationStatus::Invalid);
        assert_eq!(
            validated.validation_issues,
            vec!["Invalid name".to_string(), "Invalid email format".to_string(), "Invalid URL".to_string()]
        );
        assert_eq!(validated.email, None);
        assert_eq!(validated.store_url, None);
        assert_eq!(validated.phone.as_deref(), Some("(555) 867-5309"));
        assert_eq!(validated.name, "X");
    }

    #[test]
    fn empty_names_fall_back_to_placeholders() {
        assert_eq!(validate_brand(&Brand::new("   ")).name, "Unknown Brand");
        assert_eq!(validate_seller(&Seller::new("")).name, "Unknown Seller");
    }

    #[test]
    fn email_format_rules() {
        assert!(is_valid_email("a.b+tag@mail.example.com"));
        assert!(!is_valid_email("a@b.c"));
        assert!(!is_valid_email("a@@b.com"));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("a b@c.com"));
    }

    #[test]
    fn phone_and_text_helpers() {
        assert_eq!(clean_phone("1-800-555-0199"), "+1 (800) 555-0199");
        assert_eq!(clean_phone(" +44 20 7946 0958 "), "+44 20 7946 0958");
        assert_eq!(clean_text("Salt & Pepper (Home)!"), "Salt & Pepper (Home)");
    }
}
