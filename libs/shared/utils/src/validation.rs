use std::sync::LazyLock;

use regex::Regex;

use shared_models::error::AppError;

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

/// 10 to 15 digits or separators.
static CONTACT_PHONE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[\d\s\-\+\(\)]{10,15}$").ok());

/// Local mobile number, optionally prefixed with the +88 country code.
static MOBILE_PHONE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\+88)?[0-9]{11}$").ok());

static DIGITS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^\d+$").ok());

static OTP: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^\d{6}$").ok());

fn matches(re: &LazyLock<Option<Regex>>, input: &str) -> bool {
    re.as_ref().map(|re| re.is_match(input)).unwrap_or(false)
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && matches(&EMAIL, email)
}

pub fn is_valid_contact_phone(phone: &str) -> bool {
    matches(&CONTACT_PHONE, phone)
}

pub fn is_valid_mobile_phone(phone: &str) -> bool {
    matches(&MOBILE_PHONE, phone)
}

pub fn is_numeric(value: &str) -> bool {
    matches(&DIGITS, value)
}

pub fn is_valid_otp(code: &str) -> bool {
    matches(&OTP, code)
}

pub fn has_min_chars(value: &str, min: usize) -> bool {
    value.trim().chars().count() >= min
}

/// HTML entity encoding for values interpolated into printable documents.
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Field name to first problem found, in the order fields were checked.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors {
    fields: Vec<(&'static str, String)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        if self.get(field).is_none() {
            self.fields.push((field, message.into()));
        }
    }

    /// Adds `message` under `field` when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &'static str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, msg)| msg.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(name, msg)| (*name, msg.as_str()))
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.into())
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let joined = errors
            .fields
            .into_iter()
            .map(|(_, msg)| msg)
            .collect::<Vec<_>>()
            .join("; ");
        AppError::ValidationError(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_phone_accepts_separators() {
        assert!(is_valid_contact_phone("01711-000000"));
        assert!(is_valid_contact_phone("(02) 912 3456"));
        assert!(!is_valid_contact_phone("12345"));
        assert!(!is_valid_contact_phone("0171100000a"));
    }

    #[test]
    fn mobile_phone_requires_eleven_digits() {
        assert!(is_valid_mobile_phone("01711000000"));
        assert!(is_valid_mobile_phone("+8801711000000"));
        assert!(!is_valid_mobile_phone("1711000000"));
    }

    #[test]
    fn email_and_numbers() {
        assert!(is_valid_email("patient@clinic.com"));
        assert!(!is_valid_email("patient@clinic"));
        assert!(is_numeric("42"));
        assert!(!is_numeric("4 2"));
        assert!(is_valid_otp("123456"));
        assert!(!is_valid_otp("12345"));
    }

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html("<script>alert('x')</script> & co"),
            "&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt; &amp; co"
        );
    }

    #[test]
    fn first_error_per_field_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("patientName", "Name is required");
        errors.add("patientName", "Name must be at least 2 characters");
        errors.check(false, "patientEmail", "Enter a valid email");

        assert_eq!(errors.get("patientName"), Some("Name is required"));
        match errors.into_result() {
            Err(AppError::ValidationError(msg)) => {
                assert_eq!(msg, "Name is required; Enter a valid email")
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
