//! Terminal tables with box-drawing borders.
//!
//! ```rust
//! use libforge::ui::Table;
//!
//! let mut table = Table::new(&["Library", "Sources"]);
//! table.add_row(vec!["moqt_core".to_string(), "1".to_string()]);
//! table.print();
//! ```

use colored::*;
use console::{measure_text_width, truncate_str};

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row.iter().map(|c| sanitize_content(c)).collect());
        }
    }

    /// Column widths, shrunk (widest first, never below 8) to fit `max_width`.
    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| measure_text_width(h)).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(measure_text_width(cell));
            }
        }

        let overhead = 3 + 3 * self.headers.len();
        let available = max_width.saturating_sub(overhead);
        while widths.iter().sum::<usize>() > available {
            let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if widest <= 8 {
                break;
            }
            widths[idx] -= 1;
        }
        widths
    }

    pub fn render(&self, max_width: usize) -> Vec<String> {
        if self.headers.is_empty() {
            return Vec::new();
        }
        let widths = self.column_widths(max_width);

        let sep = |left: &str, mid: &str, right: &str| -> String {
            let inner: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}", left, inner.join(mid), right)
        };
        let line = |cells: &[String], bold: bool| -> String {
            let mut s = String::from("  │");
            for (cell, width) in cells.iter().zip(&widths) {
                let truncated = truncate_str(cell, *width, "...").to_string();
                let padding = width.saturating_sub(measure_text_width(&truncated));
                let shown = if bold {
                    truncated.bold().to_string()
                } else {
                    truncated
                };
                s.push_str(&format!(" {}{} │", shown, " ".repeat(padding)));
            }
            s
        };

        let mut out = vec![sep("┌", "┬", "┐"), line(&self.headers, true), sep("├", "┼", "┤")];
        for row in &self.rows {
            out.push(line(row, false));
        }
        out.push(sep("└", "┴", "┘"));
        out
    }

    pub fn print(&self) {
        let (_, term_width) = console::Term::stdout().size();
        for line in self.render(term_width as usize) {
            println!("{}", line);
        }
    }
}

fn sanitize_content(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_shape() {
        colored::control::set_override(false);
        let mut table = Table::new(&["Library", "Depends"]);
        table.add_row(vec!["moqt_gui".into(), "moqt_core".into()]);
        table.add_row(vec!["ignored".into()]);
        let lines = table.render(120);

        assert_eq!(lines.len(), 5);
        assert!(lines[1].contains("Library"));
        assert!(lines[3].contains("moqt_gui"));
        let widths: Vec<usize> = lines.iter().map(|l| measure_text_width(l)).collect();
        assert!(widths.iter().all(|w| *w == widths[0]));
    }

    #[test]
    fn test_columns_shrink_to_fit() {
        let mut table = Table::new(&["A", "B"]);
        table.add_row(vec!["x".repeat(100), "y".repeat(10)]);
        let lines = table.render(40);
        assert!(lines.iter().all(|l| measure_text_width(l) <= 40));
    }

    #[test]
    fn test_newlines_are_flattened() {
        assert_eq!(sanitize_content("a\nb\tc"), "a b c");
    }
}
