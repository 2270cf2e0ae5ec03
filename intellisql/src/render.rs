use clap::ValueEnum;
use comfy_table::{Cell, ContentArrangement, Table};
use intellisql_common::store::{CellValue, QueryResult, StudentRecord, COLUMNS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

pub fn home() -> String {
    let mut cards = Table::new();
    cards.set_content_arrangement(ContentArrangement::Dynamic);
    cards.add_row(vec![
        Cell::new("English → SQL"),
        Cell::new("SELECT only"),
        Cell::new("Gemini AI"),
    ]);

    format!(
        "IntelliSQL\nAI powered SQL assistant\n\n{}\n\n\
         Ask a question with `intellisql ask \"<question>\"` \
         or start an interactive session with `intellisql shell`.\n",
        cards
    )
}

pub fn generated_sql(text: &str) -> String {
    let body: Vec<String> = text.lines().map(|l| format!("  {}", l)).collect();
    format!("generated sql:\n{}\n", body.join("\n"))
}

pub fn error_banner(message: &str) -> String {
    format!("✖ {}", message)
}

pub fn warning_banner(message: &str) -> String {
    format!("⚠ {}", message)
}

pub fn result(result: &QueryResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => table(result),
        OutputFormat::Json => {
            serde_json::to_string_pretty(result).unwrap_or_else(|e| error_banner(&e.to_string()))
        }
        OutputFormat::Csv => csv(result),
    }
}

pub fn students(records: &[StudentRecord]) -> QueryResult {
    let rows = records
        .iter()
        .map(|r| {
            vec![
                CellValue::Text(r.name.clone()),
                CellValue::Text(r.class.clone()),
                CellValue::Integer(r.marks),
                CellValue::Text(r.company.clone()),
            ]
        })
        .collect();

    QueryResult::new(COLUMNS.iter().map(|c| c.to_string()).collect(), rows)
}

fn table(result: &QueryResult) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(result.columns().iter().map(Cell::new));

    for row in result.rows() {
        table.add_row(row.iter().map(|v| Cell::new(v.to_string())));
    }

    let noun = if result.len() == 1 { "row" } else { "rows" };
    format!("{}\n({} {})", table, result.len(), noun)
}

fn csv(result: &QueryResult) -> String {
    let mut lines = Vec::with_capacity(result.len() + 1);
    lines.push(
        result
            .columns()
            .iter()
            .map(|c| csv_field(c))
            .collect::<Vec<_>>()
            .join(","),
    );

    for row in result.rows() {
        let fields: Vec<String> = row
            .iter()
            .map(|v| match v {
                CellValue::Null => String::new(),
                other => csv_field(&other.to_string()),
            })
            .collect();
        lines.push(fields.join(","));
    }

    lines.join("\n")
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intellisql_common::store::fixture_rows;

    fn sample() -> QueryResult {
        QueryResult::new(
            vec!["NAME".to_string(), "MARKS".to_string()],
            vec![
                vec![CellValue::Text("Sibin".into()), CellValue::Integer(89)],
                vec![CellValue::Text("Dilsha".into()), CellValue::Integer(99)],
            ],
        )
    }

    #[test]
    fn test_table_has_header_rows_and_count() {
        let out = result(&sample(), OutputFormat::Table);
        assert!(out.contains("NAME"));
        assert!(out.contains("MARKS"));
        assert!(out.contains("Dilsha"));
        assert!(out.ends_with("(2 rows)"));
    }

    #[test]
    fn test_json_rows_are_objects() {
        let out = result(&sample(), OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["NAME"], "Sibin");
        assert_eq!(parsed[1]["MARKS"], 99);
    }

    #[test]
    fn test_csv_quotes_when_needed() {
        let data = QueryResult::new(
            vec!["A".to_string(), "B".to_string()],
            vec![vec![CellValue::Text("x, \"y\"".into()), CellValue::Null]],
        );
        assert_eq!(result(&data, OutputFormat::Csv), "A,B\n\"x, \"\"y\"\"\",");
    }

    #[test]
    fn test_students_table_matches_fixture() {
        let table = students(&fixture_rows());
        assert_eq!(table.columns(), ["NAME", "CLASS", "MARKS", "COMPANY"]);
        assert_eq!(table.len(), 5);
        assert_eq!(table.rows()[4][3], CellValue::Text("Cyient".into()));
    }

    #[test]
    fn test_home_lists_features() {
        let page = home();
        assert!(page.contains("IntelliSQL"));
        assert!(page.contains("SELECT only"));
        assert!(page.contains("Gemini AI"));
    }

    #[test]
    fn test_generated_sql_is_indented() {
        assert_eq!(
            generated_sql("SELECT *\nFROM STUDENTS"),
            "generated sql:\n  SELECT *\n  FROM STUDENTS\n"
        );
    }
}
