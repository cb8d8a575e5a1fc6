use crate::utils::error::{NewsletterError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(NewsletterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(NewsletterError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(NewsletterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(NewsletterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(NewsletterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(NewsletterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| NewsletterError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(NewsletterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Mailchimp keys look like `<hex>-us5`; the suffix names the datacenter.
pub fn validate_api_key(field_name: &str, api_key: &str) -> Result<()> {
    validate_non_empty_string(field_name, api_key)?;

    let datacenter = api_key.rsplit('-').next().unwrap_or_default();
    if datacenter.is_empty() || !datacenter.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(NewsletterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: "<redacted>".to_string(),
            reason: "API key must end with a datacenter suffix such as -us5".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("base_url", "https://us5.api.mailchimp.com/3.0").is_ok());
        assert!(validate_url("base_url", "http://127.0.0.1:8080").is_ok());
        assert!(validate_url("base_url", "").is_err());
        assert!(validate_url("base_url", "invalid-url").is_err());
        assert!(validate_url("base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("page_size", 1000, 1, 1000).is_ok());
        assert!(validate_range("page_size", 0, 1, 1000).is_err());
        assert!(validate_range("page_size", 1001, 1, 1000).is_err());
    }

    #[test]
    fn test_validate_api_key() {
        assert!(validate_api_key("api_key", "test-key-us5").is_ok());
        assert!(validate_api_key("api_key", "abc123").is_ok());
        assert!(validate_api_key("api_key", "   ").is_err());
        assert!(validate_api_key("api_key", "abc-").is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("71ed1f89d8".to_string());
        let missing: Option<String> = None;
        assert_eq!(validate_required_field("list_id", &present).unwrap(), "71ed1f89d8");
        assert!(validate_required_field("list_id", &missing).is_err());
    }
}
