//! Input validation: API names, custom suffixes, SOQL guard rails.
//!
//! Everything here runs before any network call; a rejection means the
//! operation never reached the platform.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::{Error, ErrorKind, Result};

static API_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z][a-zA-Z0-9_]*(__c|__mdt|__e|__b|__x|__kav|__ka|__Feed|__Share|__History|__Tag)?$",
    )
    .unwrap()
});

static LWC_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z][A-Za-z0-9_]*$").unwrap());

const MAX_API_NAME_LEN: usize = 80;
const MAX_LABEL_LEN: usize = 40;
const MAX_DESCRIPTION_LEN: usize = 1000;

/// Validate a Salesforce API name: starts with a letter, letters,
/// digits, and underscores only, optionally a platform suffix.
pub fn api_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::new(ErrorKind::InvalidName(
            "API name cannot be empty".to_string(),
        )));
    }
    if name.len() > MAX_API_NAME_LEN {
        return Err(Error::new(ErrorKind::InvalidName(format!(
            "API name too long (max {MAX_API_NAME_LEN} chars): {name}"
        ))));
    }
    if !API_NAME_RE.is_match(name) {
        return Err(Error::new(ErrorKind::InvalidName(format!(
            "API name must start with a letter and contain only letters, digits, and underscores: {name}"
        ))));
    }
    Ok(())
}

/// Validate a custom object or field name that must carry a suffix
/// (`__c`, `__mdt`, ...).
pub fn custom_api_name(name: &str, suffix: &str) -> Result<()> {
    api_name(name)?;
    if !name.ends_with(suffix) {
        return Err(Error::new(ErrorKind::InvalidName(format!(
            "Name must end with {suffix}: {name}"
        ))));
    }
    Ok(())
}

/// Validate a custom object name: custom suffix required unless it is a
/// well-known standard object.
pub fn object_name(name: &str) -> Result<()> {
    api_name(name)?;
    const CUSTOM_SUFFIXES: [&str; 5] = ["__c", "__mdt", "__e", "__b", "__x"];
    const STANDARD_OBJECTS: [&str; 8] = [
        "Account",
        "Contact",
        "Lead",
        "Opportunity",
        "Case",
        "User",
        "Task",
        "Event",
    ];
    if !CUSTOM_SUFFIXES.iter().any(|s| name.ends_with(s))
        && !STANDARD_OBJECTS.contains(&name)
    {
        return Err(Error::new(ErrorKind::InvalidName(format!(
            "Custom object name must end with __c, __mdt, __e, __b, or __x: {name}"
        ))));
    }
    Ok(())
}

/// Validate an LWC bundle name: lower camel case, starts lowercase.
pub fn lwc_name(name: &str) -> Result<()> {
    if name.is_empty() || !LWC_NAME_RE.is_match(name) {
        return Err(Error::new(ErrorKind::InvalidName(format!(
            "LWC bundle name must start with a lowercase letter and contain only letters, digits, and underscores: {name}"
        ))));
    }
    Ok(())
}

pub fn label(text: &str) -> Result<()> {
    if text.len() > MAX_LABEL_LEN {
        return Err(Error::new(ErrorKind::InvalidName(format!(
            "Label too long (max {MAX_LABEL_LEN} chars): {} chars",
            text.len()
        ))));
    }
    Ok(())
}

pub fn description(text: &str) -> Result<()> {
    if text.len() > MAX_DESCRIPTION_LEN {
        return Err(Error::new(ErrorKind::InvalidName(format!(
            "Description too long (max {MAX_DESCRIPTION_LEN} chars): {} chars",
            text.len()
        ))));
    }
    Ok(())
}

/// SOQL guard rails: SELECT-only, no statement chaining or comment
/// injection, balanced parentheses.
pub fn soql_query(query: &str) -> Result<()> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(Error::new(ErrorKind::InvalidQuery(
            "SOQL query cannot be empty".to_string(),
        )));
    }

    let upper = trimmed.to_uppercase();
    if !upper.starts_with("SELECT") {
        return Err(Error::new(ErrorKind::InvalidQuery(
            "SOQL query must start with SELECT".to_string(),
        )));
    }

    const DANGEROUS_PATTERNS: [&str; 8] = [
        "--",
        "/*",
        ";",
        "EXEC",
        "DROP",
        "DELETE FROM",
        "UPDATE ",
        "INSERT ",
    ];
    for pattern in DANGEROUS_PATTERNS {
        if upper.contains(pattern) {
            return Err(Error::new(ErrorKind::InvalidQuery(format!(
                "SOQL query contains potentially dangerous pattern: {pattern}"
            ))));
        }
    }

    let open = trimmed.chars().filter(|c| *c == '(').count();
    let close = trimmed.chars().filter(|c| *c == ')').count();
    if open != close {
        return Err(Error::new(ErrorKind::InvalidQuery(
            "SOQL query has unbalanced parentheses".to_string(),
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_name_rules() {
        assert!(api_name("AccountService").is_ok());
        assert!(api_name("Invoice__c").is_ok());
        assert!(api_name("Config__mdt").is_ok());
        assert!(api_name("1Bad").is_err());
        assert!(api_name("Bad!Name").is_err());
        assert!(api_name("").is_err());
        assert!(api_name(&"a".repeat(81)).is_err());
    }

    #[test]
    fn test_custom_suffix_required() {
        assert!(custom_api_name("Code__c", "__c").is_ok());
        assert!(custom_api_name("Code", "__c").is_err());
        assert!(custom_api_name("Config__mdt", "__mdt").is_ok());
    }

    #[test]
    fn test_object_name_standard_allowance() {
        assert!(object_name("Account").is_ok());
        assert!(object_name("Invoice__c").is_ok());
        assert!(object_name("Invoice").is_err());
    }

    #[test]
    fn test_lwc_name_rules() {
        assert!(lwc_name("helloWorld").is_ok());
        assert!(lwc_name("HelloWorld").is_err());
        assert!(lwc_name("hello-world").is_err());
        assert!(lwc_name("").is_err());
    }

    #[test]
    fn test_soql_guard() {
        assert!(soql_query("SELECT Id FROM Account LIMIT 10").is_ok());
        assert!(soql_query("select Id from Account where Name = 'x'").is_ok());
        assert!(soql_query("DELETE FROM Account").is_err());
        assert!(soql_query("SELECT Id FROM Account; DROP TABLE x").is_err());
        assert!(soql_query("SELECT Id FROM Account -- comment").is_err());
        assert!(soql_query("SELECT Id FROM Account WHERE (Name = 'x'").is_err());
        assert!(soql_query("").is_err());
    }
}
