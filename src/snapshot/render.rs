//! Block rendering
//!
//! Turns one scripted object into a fenced Markdown block. The scripting
//! backend injects environment-setting statements and leading/trailing
//! whitespace that vary between servers; stripping them here is what makes
//! snapshot output byte-identical across runs.

/// Environment-setting statements emitted by the scripting backend.
fn is_environment_setting(line: &str) -> bool {
    matches!(line, "SET ANSI_NULLS ON" | "SET QUOTED_IDENTIFIER ON")
}

/// Append a heading and fenced ```sql block for one object.
///
/// Single-line bodies are emitted fully trimmed and the fence closes without
/// a trailing newline; multi-line bodies keep interior indentation verbatim
/// (it is part of the generated script's structure), trimming only the
/// leading whitespace of the first line and the trailing whitespace of the
/// last.
pub fn append_block(buffer: &mut String, name: &str, raw_lines: &[String]) {
    buffer.push('\n');
    buffer.push_str("### ");
    buffer.push_str(name);
    buffer.push('\n');
    buffer.push('\n');
    buffer.push_str("```sql\n");

    let lines: Vec<&str> = raw_lines
        .iter()
        .map(String::as_str)
        .filter(|line| !is_environment_setting(line))
        .collect();

    if lines.len() == 1 {
        buffer.push_str(lines[0].trim());
        buffer.push('\n');
        buffer.push_str("```");
        return;
    }

    let last = lines.len().saturating_sub(1);
    for (index, line) in lines.iter().enumerate() {
        if index == 0 {
            buffer.push_str(line.trim_start());
        } else if index == last {
            buffer.push_str(line.trim_end());
        } else {
            buffer.push_str(line);
        }
        buffer.push('\n');
    }
    buffer.push_str("```\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn render(name: &str, raw: &[&str]) -> String {
        let mut buffer = String::new();
        append_block(&mut buffer, name, &lines(raw));
        buffer
    }

    #[test]
    fn test_environment_lines_stripped() {
        let block = render(
            "MyView",
            &[
                "SET ANSI_NULLS ON",
                "SET QUOTED_IDENTIFIER ON",
                "CREATE VIEW [dbo].[MyView] AS",
                "SELECT 1 AS [One]",
            ],
        );
        assert!(!block.contains("SET ANSI_NULLS ON"));
        assert!(!block.contains("SET QUOTED_IDENTIFIER ON"));
        assert!(block.contains("CREATE VIEW [dbo].[MyView] AS"));
    }

    #[test]
    fn test_single_line_body() {
        let block = render("MySynonym", &["  CREATE SYNONYM [dbo].[MySynonym] FOR [dbo].[Orders]  "]);
        assert_eq!(
            block,
            "\n### MySynonym\n\n```sql\nCREATE SYNONYM [dbo].[MySynonym] FOR [dbo].[Orders]\n```"
        );
    }

    #[test]
    fn test_single_line_after_stripping() {
        let block = render(
            "MySynonym",
            &["SET ANSI_NULLS ON", " CREATE SYNONYM [dbo].[MySynonym] FOR [dbo].[Orders]"],
        );
        assert_eq!(
            block,
            "\n### MySynonym\n\n```sql\nCREATE SYNONYM [dbo].[MySynonym] FOR [dbo].[Orders]\n```"
        );
    }

    #[test]
    fn test_multi_line_trimming() {
        let block = render(
            "Orders",
            &[
                "   CREATE TABLE [dbo].[Orders](",
                "\t[Id] [int] NOT NULL,",
                ") ON [PRIMARY]   ",
            ],
        );
        assert_eq!(
            block,
            "\n### Orders\n\n```sql\nCREATE TABLE [dbo].[Orders](\n\t[Id] [int] NOT NULL,\n) ON [PRIMARY]\n```\n"
        );
    }

    #[test]
    fn test_interior_lines_verbatim() {
        let block = render("P", &["CREATE PROC [dbo].[P]", "   AS   ", "RETURN 0"]);
        // interior line keeps both leading and trailing whitespace
        assert!(block.contains("\n   AS   \n"));
    }

    #[test]
    fn test_deterministic() {
        let raw = &["CREATE VIEW [dbo].[V] AS", "SELECT 1 AS [One]"];
        assert_eq!(render("V", raw), render("V", raw));
    }
}
