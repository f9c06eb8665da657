//! Terminal output utilities: ANSI styling, notice cards, command tables.

use discore_commands::Notice;

// ---------------------------------------------------------------------------
// ANSI style helpers
// ---------------------------------------------------------------------------

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// 24-bit foreground escape for a `0xRRGGBB` notice colour.
fn truecolor(color: u32) -> String {
    format!(
        "\x1b[38;2;{};{};{}m",
        (color >> 16) & 0xff,
        (color >> 8) & 0xff,
        color & 0xff
    )
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

/// Render a notice as a bar-framed card, one line per description line.
pub fn render_notice(notice: &Notice, color: bool) -> String {
    let (bar, bold, reset) = if color {
        (format!("{}┃{RESET}", truecolor(notice.color)), BOLD, RESET)
    } else {
        ("|".to_string(), "", "")
    };
    let mut out = format!("{bar} {bold}{}{reset}\n", notice.title);
    for line in notice.description.lines() {
        out.push_str(&format!("{bar} {line}\n"));
    }
    out
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

/// Render left-aligned columns under a bold header row.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(strip_ansi(cell).chars().count());
        }
    }

    let mut out = format!("{BOLD}{}{RESET}\n", pad_row(headers.iter().copied(), &widths));
    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("{}\n", sep.join("  ")));
    for row in rows {
        out.push_str(&pad_row(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out
}

fn pad_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| {
            let fill = width.saturating_sub(strip_ansi(cell).chars().count());
            format!("{cell}{}", " ".repeat(fill))
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ansi() {
        let colored = format!("{BOLD}hello{RESET}");
        assert_eq!(strip_ansi(&colored), "hello");
    }

    #[test]
    fn plain_notice_card() {
        let notice = Notice {
            title: "Invalid arguments".into(),
            description: "Try again.\nUsage: `!purge <count>`".into(),
            color: 0xec644b,
        };
        assert_eq!(
            render_notice(&notice, false),
            "| Invalid arguments\n| Try again.\n| Usage: `!purge <count>`\n"
        );
        assert!(render_notice(&notice, true).contains("\x1b[38;2;236;100;75m"));
    }

    #[test]
    fn table_columns_align() {
        let rows = vec![
            vec!["!ping".to_string(), "Pong.".to_string()],
            vec!["!purge <count>".to_string(), "Delete messages.".to_string()],
        ];
        let table = strip_ansi(&render_table(&["Usage", "Description"], &rows));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Usage           Description");
        assert_eq!(lines[2], "!ping           Pong.");
        assert_eq!(lines[3], "!purge <count>  Delete messages.");
    }
}
