/// Captures the line context of an XML parse failure.
#[derive(Debug, Clone)]
pub struct ErrorHighlight {
    pub line: usize,
    pub column: usize,
    pub line_text: String,
    pub pointer_line: String,
}

impl ErrorHighlight {
    /// Renders a human-readable representation of the highlighted line.
    pub fn render(&self) -> String {
        format!(
            "line {} column {}\n{}\n{}",
            self.line, self.column, self.line_text, self.pointer_line
        )
    }

    /// Create an ErrorHighlight from a source string and a 1-based line/column position.
    pub fn from_position(source: &str, line: usize, column: usize) -> Option<Self> {
        if source.is_empty() || line == 0 {
            return None;
        }

        let line_text = source.lines().nth(line - 1)?.trim_end_matches('\r').to_string();

        // Build pointer line, keeping tabs so the caret lines up
        let mut pointer_line = String::new();
        for ch in line_text.chars().take(column.saturating_sub(1)) {
            pointer_line.push(if ch == '\t' { '\t' } else { ' ' });
        }
        pointer_line.push('^');

        Some(ErrorHighlight {
            line,
            column,
            line_text,
            pointer_line,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_points_at_column() {
        let highlight = ErrorHighlight::from_position("<a>\n\t<b x=1/>\n</a>", 2, 5).unwrap();
        assert_eq!(highlight.line_text, "\t<b x=1/>");
        assert_eq!(highlight.pointer_line, "\t   ^");
        assert!(highlight.render().starts_with("line 2 column 5"));
    }

    #[test]
    fn test_highlight_out_of_range() {
        assert!(ErrorHighlight::from_position("", 1, 1).is_none());
        assert!(ErrorHighlight::from_position("one line", 4, 1).is_none());
    }
}
