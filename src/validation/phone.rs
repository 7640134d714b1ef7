//! Georgian phone number normalization.
//!
//! Three input shapes are recognized, all of which normalize to the canonical
//! display form `+995 XXX XX XX XX`:
//!
//! - 9 bare digits: `577189127`
//! - country code and 9 digits: `+995577189127`
//! - country code and 9 digits grouped 3-2-2-2: `+995 577 18 91 27`

use once_cell::sync::Lazy;
use regex::Regex;

static BARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{9}$").expect("valid regex"));
static PREFIXED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+995([0-9]{9})$").expect("valid regex"));
static GROUPED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+995 ([0-9]{3}) ([0-9]{2}) ([0-9]{2}) ([0-9]{2})$").expect("valid regex")
});

/// Extract the 9 national digits from one of the accepted shapes.
fn national_digits(input: &str) -> Option<String> {
    let input = input.trim();
    if BARE.is_match(input) {
        return Some(input.to_string());
    }
    if let Some(caps) = PREFIXED.captures(input) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = GROUPED.captures(input) {
        return Some(format!("{}{}{}{}", &caps[1], &caps[2], &caps[3], &caps[4]));
    }
    None
}

/// Strict formatter. Returns `None` for anything that is not one of the
/// accepted shapes, including blank input.
pub fn normalize_phone(input: &str) -> Option<String> {
    let d = national_digits(input)?;
    Some(format!(
        "+995 {} {} {} {}",
        &d[0..3],
        &d[3..5],
        &d[5..7],
        &d[7..9]
    ))
}

/// Lenient check used by payload validation: absent or blank means "unset"
/// and is accepted, otherwise the value must be one of the accepted shapes.
pub fn is_valid_phone(input: Option<&str>) -> bool {
    match input {
        None => true,
        Some(s) if s.trim().is_empty() => true,
        Some(s) => national_digits(s).is_some(),
    }
}

/// Display helper for clients: canonical form when recognized, input as-is otherwise.
pub fn format_phone_for_display(input: &str) -> String {
    normalize_phone(input).unwrap_or_else(|| input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn all_accepted_shapes_share_canonical_form() {
        let expected = Some("+995 577 18 91 27".to_string());
        assert_eq!(normalize_phone("577189127"), expected);
        assert_eq!(normalize_phone("+995577189127"), expected);
        assert_eq!(normalize_phone("+995 577 18 91 27"), expected);
        assert_eq!(normalize_phone("  577189127 "), expected);
    }

    #[test]
    fn rejects_other_shapes() {
        for bad in [
            "",
            "   ",
            "57718912",
            "5771891270",
            "+99557718912",
            "+995-577-18-91-27",
            "+995 5771 8 91 27",
            "995577189127",
            "phone",
        ] {
            assert_eq!(normalize_phone(bad), None, "{bad:?} should not normalize");
        }
    }

    #[test]
    fn lenient_check_accepts_unset() {
        assert!(is_valid_phone(None));
        assert!(is_valid_phone(Some("")));
        assert!(is_valid_phone(Some("  ")));
        assert!(is_valid_phone(Some("+995 577 18 91 27")));
        assert!(!is_valid_phone(Some("12345")));
    }

    #[test]
    fn display_falls_back_to_input() {
        assert_eq!(format_phone_for_display("577189127"), "+995 577 18 91 27");
        assert_eq!(format_phone_for_display("call us"), "call us");
    }

    proptest! {
        #[test]
        fn nine_digits_normalize_by_slicing(d in "[0-9]{9}") {
            let expected = format!("+995 {} {} {} {}", &d[0..3], &d[3..5], &d[5..7], &d[7..9]);
            prop_assert_eq!(normalize_phone(&d), Some(expected.clone()));
            prop_assert_eq!(normalize_phone(&format!("+995{}", d)), Some(expected.clone()));
            prop_assert_eq!(normalize_phone(&expected), Some(expected));
        }
    }
}
