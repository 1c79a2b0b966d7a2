use regex::Regex;

pub fn validate_email(email: &str) -> bool {
    let email_regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"
    ).unwrap();

    email_regex.is_match(email) && email.len() <= 254
}

pub fn validate_phone(phone: &str) -> bool {
    let phone_regex = Regex::new(
        r"^\+?[0-9][0-9\s\-\.\(\)]{5,18}[0-9]$"
    ).unwrap();

    phone_regex.is_match(phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(validate_email("patient@example.com"));
        assert!(validate_email("first.last+tag@clinic.co.uk"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!validate_email("not-an-email"));
        assert!(!validate_email("missing@tld"));
        assert!(!validate_email("@example.com"));
    }

    #[test]
    fn accepts_common_phone_formats() {
        assert!(validate_phone("+14155552671"));
        assert!(validate_phone("415-555-2671"));
        assert!(validate_phone("415.555.2671"));
    }

    #[test]
    fn rejects_non_numeric_phone() {
        assert!(!validate_phone("not-a-phone"));
        assert!(!validate_phone("12345"));
    }
}
