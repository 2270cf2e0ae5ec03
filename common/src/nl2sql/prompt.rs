use crate::store::{COLUMNS, TABLE_NAME};

pub const SQL_INSTRUCTION: &str = "Only return SQL.";

/// Prompt asking the model to translate `question` against the students table.
pub fn build_sql_prompt(question: &str) -> String {
    format!(
        "Convert English to SQL.\n\
         Table: {}\n\
         Columns: {}\n\
         {}\n\
         Question: {}",
        TABLE_NAME,
        COLUMNS.join(", "),
        SQL_INSTRUCTION,
        question.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_table_and_columns() {
        let prompt = build_sql_prompt("who scored above 80?");

        assert!(prompt.contains("Table: STUDENTS"));
        assert!(prompt.contains("Columns: NAME, CLASS, MARKS, COMPANY"));
        assert!(prompt.contains(SQL_INSTRUCTION));
        assert!(prompt.ends_with("Question: who scored above 80?"));
    }

    #[test]
    fn test_prompt_is_fixed_apart_from_question() {
        let a = build_sql_prompt("first");
        let b = build_sql_prompt("second");
        assert_eq!(
            a.trim_end_matches("first"),
            b.trim_end_matches("second")
        );
    }
}
