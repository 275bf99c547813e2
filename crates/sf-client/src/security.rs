//! Security utilities for Salesforce API operations.
//!
//! User-provided values that end up inside SOQL string literals, URL paths,
//! or generated metadata XML MUST go through these helpers. Interpolating
//! raw input into a query or document is an injection vulnerability.
//!
//! ```rust
//! use forcebridge_sf_client::security::soql;
//!
//! let name = soql::escape_string("O'Brien");
//! let query = format!("SELECT Id FROM Account WHERE Name = '{}'", name);
//! ```

/// SOQL escaping utilities for injection prevention.
pub mod soql {
    /// Escape a string value for use in SOQL string literals.
    ///
    /// Escapes single quotes, backslashes, newlines, carriage returns,
    /// and tabs.
    ///
    /// # Example
    ///
    /// ```rust
    /// use forcebridge_sf_client::security::soql;
    ///
    /// let safe = soql::escape_string("O'Brien & Co.");
    /// assert_eq!(safe, "O\\'Brien & Co.");
    /// ```
    #[must_use]
    pub fn escape_string(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 16);
        for ch in value.chars() {
            match ch {
                '\'' => escaped.push_str("\\'"),
                '\\' => escaped.push_str("\\\\"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\t' => escaped.push_str("\\t"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// Escape a value for use in a SOQL LIKE clause.
    ///
    /// In addition to standard string escaping, this also escapes the
    /// LIKE wildcards `%` and `_`.
    #[must_use]
    pub fn escape_like(value: &str) -> String {
        let base_escaped = escape_string(value);
        let mut escaped = String::with_capacity(base_escaped.len() + 8);
        for ch in base_escaped.chars() {
            match ch {
                '%' => escaped.push_str("\\%"),
                '_' => escaped.push_str("\\_"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// Validate that a field or sObject name contains only safe characters.
    ///
    /// Names must start with a letter and contain only alphanumerics and
    /// underscores (which covers the `__c` / `__r` suffixes).
    #[must_use]
    pub fn is_safe_field_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {}
            _ => return false,
        }
        name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    }
}

/// URL encoding utilities for parameter safety.
pub mod url {
    /// URL-encode a parameter value.
    ///
    /// Ensures user-provided values cannot break out of URL paths or
    /// inject additional parameters.
    #[must_use]
    pub fn encode_param(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }

    /// Validate that a Salesforce ID has the correct format.
    ///
    /// Salesforce IDs are 15 or 18 alphanumeric characters.
    #[must_use]
    pub fn is_valid_salesforce_id(id: &str) -> bool {
        let len = id.len();
        (len == 15 || len == 18) && id.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

/// XML escaping utilities for generated metadata documents.
pub mod xml {
    /// Escape a string for safe inclusion in XML content.
    ///
    /// Escapes the five predefined XML entities.
    ///
    /// # Example
    ///
    /// ```rust
    /// use forcebridge_sf_client::security::xml;
    ///
    /// let safe = xml::escape("Hello <World> & 'Friends'");
    /// assert_eq!(safe, "Hello &lt;World&gt; &amp; &apos;Friends&apos;");
    /// ```
    #[must_use]
    pub fn escape(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 16);
        for ch in value.chars() {
            match ch {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&apos;"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod soql_tests {
        use super::soql::*;

        #[test]
        fn test_escape_string_basic() {
            assert_eq!(escape_string("hello"), "hello");
            assert_eq!(escape_string("O'Brien"), "O\\'Brien");
            assert_eq!(escape_string("test\\path"), "test\\\\path");
        }

        #[test]
        fn test_escape_string_injection_attempts() {
            assert_eq!(escape_string("' OR '1'='1"), "\\' OR \\'1\\'=\\'1");
            assert_eq!(
                escape_string("'; DELETE FROM Account--"),
                "\\'; DELETE FROM Account--"
            );
        }

        #[test]
        fn test_escape_string_special_chars() {
            assert_eq!(escape_string("line1\nline2"), "line1\\nline2");
            assert_eq!(escape_string("col1\tcol2"), "col1\\tcol2");
            assert_eq!(escape_string("text\r\n"), "text\\r\\n");
        }

        #[test]
        fn test_escape_like() {
            assert_eq!(escape_like("100%"), "100\\%");
            assert_eq!(escape_like("test_value"), "test\\_value");
            assert_eq!(escape_like("O'Brien%"), "O\\'Brien\\%");
        }

        #[test]
        fn test_is_safe_field_name() {
            assert!(is_safe_field_name("Id"));
            assert!(is_safe_field_name("Custom_Field__c"));
            assert!(is_safe_field_name("Account__r"));
            assert!(is_safe_field_name("X123"));

            assert!(!is_safe_field_name(""));
            assert!(!is_safe_field_name("123abc"));
            assert!(!is_safe_field_name("field-name"));
            assert!(!is_safe_field_name("field'name"));
            assert!(!is_safe_field_name("field; DROP"));
        }
    }

    mod url_tests {
        use super::url::*;

        #[test]
        fn test_encode_param() {
            assert_eq!(encode_param("simple"), "simple");
            assert_eq!(encode_param("has space"), "has%20space");
            assert_eq!(encode_param("path/traversal"), "path%2Ftraversal");
        }

        #[test]
        fn test_is_valid_salesforce_id() {
            assert!(is_valid_salesforce_id("001000000000001"));
            assert!(is_valid_salesforce_id("001000000000001AAA"));

            assert!(!is_valid_salesforce_id(""));
            assert!(!is_valid_salesforce_id("short"));
            assert!(!is_valid_salesforce_id("001/../../etc/pass"));
        }
    }

    mod xml_tests {
        use super::xml::*;

        #[test]
        fn test_escape() {
            assert_eq!(escape("hello"), "hello");
            assert_eq!(escape("<tag>"), "&lt;tag&gt;");
            assert_eq!(escape("&amp;"), "&amp;amp;");
            assert_eq!(escape("\"quoted\""), "&quot;quoted&quot;");
            assert_eq!(escape("it's"), "it&apos;s");
        }
    }
}
