use crate::utils::error::{RecipeError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Parses an absolute http(s) URL that has a host.
pub fn parse_http_url(field_name: &str, url_str: &str) -> Result<Url> {
    if url_str.trim().is_empty() {
        return Err(RecipeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    let url = Url::parse(url_str).map_err(|e| RecipeError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: url_str.to_string(),
        reason: format!("Invalid URL format: {}", e),
    })?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(RecipeError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            })
        }
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(RecipeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL has no host".to_string(),
        });
    }

    Ok(url)
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    parse_http_url(field_name, url_str).map(|_| ())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| RecipeError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RecipeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Returns the value when it is set and not blank.
pub fn required_string(field_name: &str, value: &Option<String>) -> Result<String> {
    let value = validate_required_field(field_name, value)?;
    if value.trim().is_empty() {
        return Err(RecipeError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    Ok(value.clone())
}
