//! Phone number string helpers
//!
//! Pure functions used to normalize, compare and classify the raw numbers the
//! telephony layer hands to the cache. None of them validate numbering plans.

use crate::query::Presentation;

/// Prefix carried by SIP addresses that is not useful to display
pub const SIP_SCHEME: &str = "sip:";

/// Separator between a dialed number and its forwarding number
pub const FORWARDING_SEPARATOR: char = '&';

/// Whether `c` is a dialable character rather than a visual separator
pub fn is_non_separator(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '*' | '#' | '+' | 'N' | ';' | ',')
}

/// Remove every visual separator (spaces, dashes, parentheses, dots, ...)
pub fn strip_separators(number: &str) -> String {
    number.chars().filter(|c| is_non_separator(*c)).collect()
}

/// Whether the number is a URI-style address (SIP) rather than a phone number
pub fn is_uri_number(number: &str) -> bool {
    number.contains('@') || number.contains("%40")
}

/// Strip a leading `sip:` scheme, leaving other schemes alone
pub fn strip_sip_prefix(number: &str) -> &str {
    number.strip_prefix(SIP_SCHEME).unwrap_or(number)
}

/// The user part of a URI-style number (`sip:1234@host` → `1234`)
pub fn username_from_uri(number: &str) -> &str {
    let number = strip_sip_prefix(number);
    let end = number
        .find('@')
        .or_else(|| number.find("%40"))
        .unwrap_or(number.len());
    &number[..end]
}

/// Whether `s` looks like a plain global phone number: an optional `+`
/// followed by digits, dots and dashes, with at least one digit.
pub fn is_global_phone_number(s: &str) -> bool {
    let body = s.strip_prefix('+').unwrap_or(s);
    !body.is_empty()
        && body.chars().any(|c| c.is_ascii_digit())
        && body.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-')
}

/// Split a `number&forwarding` string. URI-style numbers are never split.
pub fn split_forwarding(number: &str) -> (&str, Option<&str>) {
    if is_uri_number(number) {
        return (number, None);
    }
    let mut parts = number.split(FORWARDING_SEPARATOR);
    let primary = parts.next().unwrap_or_default();
    let forwarding = parts.next().filter(|s| !s.is_empty());
    (primary, forwarding)
}

/// Map the strings some networks send in place of a number to the
/// presentation they stand for.
pub fn special_cnap_presentation(number: &str) -> Option<Presentation> {
    match number {
        "PRIVATE" | "P" | "RES" | "PRIVATENUMBER" => Some(Presentation::Restricted),
        "UNAVAILABLE" | "UNKNOWN" | "UNA" | "U" => Some(Presentation::Unknown),
        _ => None,
    }
}

/// Compare two numbers ignoring separators; URI-style numbers compare verbatim
///
/// The forwarding part after `&` is compared on its own, so moving digits
/// across the `&` makes a different number.
pub fn same_number(a: &str, b: &str) -> bool {
    if is_uri_number(a) || is_uri_number(b) {
        return a.trim() == b.trim();
    }
    let (a_primary, a_forwarding) = split_forwarding(a);
    let (b_primary, b_forwarding) = split_forwarding(b);
    strip_separators(a_primary) == strip_separators(b_primary)
        && a_forwarding.map(strip_separators) == b_forwarding.map(strip_separators)
}

/// Render a number safe for logs: keeps `-`, `@`, `.` and `&`, masks the rest
pub fn log_safe(number: &str) -> String {
    number
        .chars()
        .map(|c| match c {
            '-' | '@' | '.' | '&' => c,
            _ => 'x',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strip_separators() {
        assert_eq!(strip_separators("(415) 555-1212"), "4155551212");
        assert_eq!(strip_separators("+1 415.555.1212"), "+14155551212");
        assert_eq!(strip_separators("*86#"), "*86#");
        assert_eq!(strip_separators(""), "");
    }

    #[test]
    fn test_uri_numbers() {
        assert!(is_uri_number("sip:alice@example.com"));
        assert!(is_uri_number("4155551212%40carrier"));
        assert!(!is_uri_number("4155551212"));
    }

    #[test]
    fn test_username_from_uri() {
        assert_eq!(username_from_uri("sip:4155551212@example.com"), "4155551212");
        assert_eq!(username_from_uri("alice@example.com"), "alice");
        assert_eq!(username_from_uri("1234%40host"), "1234");
    }

    #[test]
    fn test_global_phone_number() {
        assert!(is_global_phone_number("+14155551212"));
        assert!(is_global_phone_number("415-555-1212"));
        assert!(!is_global_phone_number("alice"));
        assert!(!is_global_phone_number("+"));
        assert!(!is_global_phone_number("--"));
    }

    #[test]
    fn test_split_forwarding() {
        assert_eq!(
            split_forwarding("14155551212&14155550000"),
            ("14155551212", Some("14155550000"))
        );
        assert_eq!(split_forwarding("14155551212"), ("14155551212", None));
        assert_eq!(split_forwarding("14155551212&"), ("14155551212", None));
        assert_eq!(
            split_forwarding("a&b@example.com"),
            ("a&b@example.com", None)
        );
    }

    #[test]
    fn test_special_cnap_presentation() {
        assert_eq!(
            special_cnap_presentation("PRIVATE"),
            Some(Presentation::Restricted)
        );
        assert_eq!(special_cnap_presentation("U"), Some(Presentation::Unknown));
        assert_eq!(special_cnap_presentation("4155551212"), None);
    }

    #[test]
    fn test_same_number_compares_sip_addresses_verbatim() {
        assert!(same_number("alice@example.com", "alice@example.com"));
        assert!(!same_number("alice@example.com", "bob@example.com"));
        assert!(same_number("(415) 555-1212", "4155551212"));
    }

    #[test]
    fn test_same_number_keeps_forwarding_apart() {
        assert!(!same_number("1415&1416", "14151416"));
        assert!(!same_number("1415&1416", "1415&1417"));
        assert!(!same_number("1415&1416", "1415"));
        assert!(same_number("1415 & 14-16", "1415&1416"));
        assert!(same_number("1415&", "1415"));
    }

    #[test]
    fn test_log_safe() {
        assert_eq!(log_safe("415-555-1212"), "xxx-xxx-xxxx");
        assert_eq!(log_safe("a@b.c"), "x@x.x");
    }

    proptest! {
        #[test]
        fn strip_separators_is_idempotent(s in "\\PC{0,32}") {
            let once = strip_separators(&s);
            prop_assert_eq!(strip_separators(&once), once.clone());
        }

        #[test]
        fn stripped_numbers_only_hold_dialable_chars(s in "[0-9 ()+.-]{0,24}") {
            prop_assert!(strip_separators(&s).chars().all(is_non_separator));
        }

        #[test]
        fn same_number_ignores_formatting(digits in "[0-9]{4,12}") {
            let formatted: String = digits
                .chars()
                .enumerate()
                .flat_map(|(i, c)| if i % 3 == 2 { vec![c, '-'] } else { vec![c] })
                .collect();
            prop_assert!(same_number(&digits, &formatted));
        }

        #[test]
        fn log_safe_preserves_length(s in "\\PC{0,32}") {
            prop_assert_eq!(log_safe(&s).chars().count(), s.chars().count());
        }
    }
}
