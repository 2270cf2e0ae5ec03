use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

pub const REJECTION_MESSAGE: &str = "Only SELECT queries are allowed.";

static FENCE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:sql)?").unwrap());

/// Model output that passed the read-only check.
///
/// The check is a case-insensitive `SELECT` prefix test and nothing more: a
/// statement that starts with SELECT is accepted whatever follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectSql(String);

impl SelectSql {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SelectSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub sanitized: String,
}

impl Rejection {
    pub fn message(&self) -> &'static str {
        REJECTION_MESSAGE
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REJECTION_MESSAGE)
    }
}

/// Remove markdown code fences and surrounding whitespace.
pub fn sanitize(candidate: &str) -> String {
    FENCE_REGEX.replace_all(candidate, "").trim().to_string()
}

pub fn sanitize_and_validate(candidate: &str) -> Result<SelectSql, Rejection> {
    let sanitized = sanitize(candidate);

    if sanitized.to_uppercase().starts_with("SELECT") {
        Ok(SelectSql(sanitized))
    } else {
        tracing::debug!("rejected non-select statement");
        Err(Rejection { sanitized })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_sql_fence() {
        let input = "```sql\nSELECT * FROM STUDENTS\n```";
        assert_eq!(sanitize(input), "SELECT * FROM STUDENTS");
    }

    #[test]
    fn test_sanitize_strips_bare_fence_and_whitespace() {
        let input = "  ```\nSELECT NAME FROM STUDENTS;\n```  \n";
        assert_eq!(sanitize(input), "SELECT NAME FROM STUDENTS;");
    }

    #[test]
    fn test_sanitize_plain_text_untouched() {
        assert_eq!(sanitize("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_rejects_delete() {
        let err = sanitize_and_validate("DELETE FROM STUDENTS").unwrap_err();
        assert_eq!(err.message(), "Only SELECT queries are allowed.");
        assert_eq!(err.to_string(), REJECTION_MESSAGE);
        assert_eq!(err.sanitized, "DELETE FROM STUDENTS");
    }

    #[test]
    fn test_rejects_fenced_drop() {
        assert!(sanitize_and_validate("```sql\nDROP TABLE STUDENTS\n```").is_err());
    }

    #[test]
    fn test_rejects_sentinel_text() {
        assert!(sanitize_and_validate("Error: API quota exceeded").is_err());
        assert!(sanitize_and_validate("").is_err());
    }

    #[test]
    fn test_accepts_lowercase_select() {
        let sql = sanitize_and_validate("select name from students").unwrap();
        assert_eq!(sql.as_str(), "select name from students");
    }

    #[test]
    fn test_accepts_fenced_select() {
        let sql = sanitize_and_validate("```sql\nSELECT NAME FROM STUDENTS\n```").unwrap();
        assert_eq!(sql.to_string(), "SELECT NAME FROM STUDENTS");
    }

    #[test]
    fn test_fence_tag_is_case_sensitive() {
        // only the lowercase tag is stripped; the leftover "SQL" fails the check
        assert_eq!(
            sanitize("```SQL\nSELECT NAME FROM STUDENTS\n```"),
            "SQL\nSELECT NAME FROM STUDENTS"
        );
        assert!(sanitize_and_validate("```SQL\nSELECT NAME FROM STUDENTS\n```").is_err());
    }

    #[test]
    fn test_prefix_check_only() {
        // anything after a leading SELECT is not inspected
        let sql = sanitize_and_validate("SELECT 1; DELETE FROM STUDENTS").unwrap();
        assert_eq!(sql.into_inner(), "SELECT 1; DELETE FROM STUDENTS");
    }
}
