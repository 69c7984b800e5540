//! Field validators shared by the handlers. Each collects messages into a [`FieldErrors`]
//! so one response can report every bad field at once.

use rust_decimal::Decimal;

use crate::error::{AppError, AppResult, FieldErrors};

pub const MAX_CHAR_FIELD: usize = 255;
/// Price column holds up to 5 digits, 2 of them decimals.
pub const PRICE_MAX_DIGITS: u32 = 5;
pub const PRICE_DECIMAL_PLACES: u32 = 2;

/// Upper bound for tag/ingredient id lists in bodies and query filters.
pub const MAX_LINKED_IDS: usize = 1000;

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_BLANK: &str = "This field may not be blank.";

/// Returns the trimmed value when present and non-blank, otherwise records why not.
pub fn required<'a>(errors: &mut FieldErrors, field: &str, value: Option<&'a str>) -> Option<&'a str> {
    match value.map(str::trim) {
        None => {
            errors.add(field, MSG_REQUIRED);
            None
        }
        Some("") => {
            errors.add(field, MSG_BLANK);
            None
        }
        Some(v) => Some(v),
    }
}

pub fn max_length(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(field, format!("Ensure this field has no more than {} characters.", max));
    }
}

/// Structural check: a local part, a dotted domain, no whitespace.
pub fn email(errors: &mut FieldErrors, value: &str) {
    max_length(errors, "email", value, MAX_CHAR_FIELD);
    let valid = match value.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        errors.add("email", "Enter a valid email address.");
    }
}

pub fn password(errors: &mut FieldErrors, value: &str, min_length: usize) {
    if value.chars().count() < min_length {
        errors.add("password", format!("Ensure this field has at least {} characters.", min_length));
    }
}

/// Non-blank name of at most 255 characters; returns the trimmed name.
pub fn name<'a>(errors: &mut FieldErrors, field: &str, value: Option<&'a str>) -> Option<&'a str> {
    let value = required(errors, field, value)?;
    max_length(errors, field, value, MAX_CHAR_FIELD);
    Some(value)
}

pub fn time_minutes(errors: &mut FieldErrors, value: i64) {
    if value < 0 {
        errors.add("time_minutes", "Ensure this value is greater than or equal to 0.");
    }
}

/// Checks sign, decimal places and total digits; returns the price rescaled to 2 places.
pub fn price(errors: &mut FieldErrors, value: Decimal) -> Decimal {
    if value.is_sign_negative() && !value.is_zero() {
        errors.add("price", "Ensure this value is greater than or equal to 0.");
    }
    let normalized = value.normalize();
    if normalized.scale() > PRICE_DECIMAL_PLACES {
        errors.add(
            "price",
            format!("Ensure that there are no more than {} decimal places.", PRICE_DECIMAL_PLACES),
        );
    }
    let limit = Decimal::from(10_i64.pow(PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES));
    if value.abs() >= limit {
        errors.add("price", format!("Ensure that there are no more than {} digits in total.", PRICE_MAX_DIGITS));
    }
    let mut rescaled = normalized;
    rescaled.rescale(PRICE_DECIMAL_PLACES);
    rescaled
}

/// Parses a comma-separated id list from a query string (`"1,2, 3"`).
pub fn id_list(field: &str, raw: &str) -> AppResult<Vec<i64>> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| AppError::BadRequest(format!("{} must be a comma-separated list of ids", field)))
        })
        .collect::<AppResult<Vec<i64>>>()?;
    if ids.len() > MAX_LINKED_IDS {
        return Err(AppError::BadRequest(format!("{} accepts at most {} ids", field, MAX_LINKED_IDS)));
    }
    Ok(ids)
}

/// Rejects link lists longer than [`MAX_LINKED_IDS`]; each id becomes a bound SQL parameter.
pub fn linked_ids(errors: &mut FieldErrors, field: &str, ids: &[i64]) {
    if ids.len() > MAX_LINKED_IDS {
        errors.add(field, format!("Ensure this field has no more than {} elements.", MAX_LINKED_IDS));
    }
}

/// Query-string boolean: `1`, `true`, `yes` and `on` are true, anything else false.
pub fn flag(raw: Option<&str>) -> bool {
    matches!(raw.map(|s| s.trim().to_ascii_lowercase()).as_deref(), Some("1" | "true" | "yes" | "on"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn required_distinguishes_missing_and_blank() {
        let mut errors = FieldErrors::new();
        assert_eq!(required(&mut errors, "a", None), None);
        assert_eq!(required(&mut errors, "b", Some("   ")), None);
        assert_eq!(required(&mut errors, "c", Some(" x ")), Some("x"));
        assert_eq!(errors.get("a"), Some(&[MSG_REQUIRED.to_string()][..]));
        assert_eq!(errors.get("b"), Some(&[MSG_BLANK.to_string()][..]));
        assert!(!errors.contains("c"));
    }

    #[test]
    fn email_shapes() {
        for ok in ["test@djangoappdev.com", "a@b.co", "first.last+tag@sub.example.org"] {
            let mut errors = FieldErrors::new();
            email(&mut errors, ok);
            assert!(errors.is_empty(), "{ok} should be valid");
        }
        for bad in ["plainaddress", "@example.com", "user@", "a@b", "user@.com", "user@example.", "us er@example.com"] {
            let mut errors = FieldErrors::new();
            email(&mut errors, bad);
            assert!(errors.contains("email"), "{bad} should be invalid");
        }
    }

    #[test]
    fn password_minimum_length() {
        let mut errors = FieldErrors::new();
        password(&mut errors, "pw", 5);
        assert!(errors.contains("password"));

        let mut errors = FieldErrors::new();
        password(&mut errors, "testpass", 5);
        assert!(errors.is_empty());
    }

    #[test]
    fn price_is_rescaled_and_bounded() {
        let mut errors = FieldErrors::new();
        assert_eq!(price(&mut errors, Decimal::from_str("5").unwrap()).to_string(), "5.00");
        assert_eq!(price(&mut errors, Decimal::from_str("12.50").unwrap()).to_string(), "12.50");
        assert!(errors.is_empty());

        let mut errors = FieldErrors::new();
        price(&mut errors, Decimal::from_str("1.234").unwrap());
        assert!(errors.contains("price"));

        let mut errors = FieldErrors::new();
        price(&mut errors, Decimal::from_str("1000.00").unwrap());
        assert!(errors.contains("price"));

        let mut errors = FieldErrors::new();
        price(&mut errors, Decimal::from_str("-1").unwrap());
        assert!(errors.contains("price"));
    }

    #[test]
    fn id_list_parses_and_rejects() {
        assert_eq!(id_list("tags", "1, 2,3,").unwrap(), vec![1, 2, 3]);
        assert!(id_list("tags", "").unwrap().is_empty());
        assert!(matches!(id_list("tags", "1,x"), Err(AppError::BadRequest(_))));

        let too_many = (1..=MAX_LINKED_IDS as i64 + 1).map(|i| i.to_string()).collect::<Vec<_>>().join(",");
        assert!(matches!(id_list("tags", &too_many), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn linked_ids_are_capped() {
        let mut errors = FieldErrors::new();
        linked_ids(&mut errors, "tags", &[1; MAX_LINKED_IDS]);
        assert!(errors.is_empty());

        linked_ids(&mut errors, "ingredients", &[1; MAX_LINKED_IDS + 1]);
        assert!(errors.contains("ingredients"));
    }

    #[test]
    fn flag_values() {
        assert!(flag(Some("1")));
        assert!(flag(Some("True")));
        assert!(!flag(Some("0")));
        assert!(!flag(None));
    }
}
