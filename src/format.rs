//! Re-indents the assembled Swift text from its brace structure.
//!
//! Generators emit unindented lines; this pass trims every line, collapses runs
//! of blank lines and indents by brace depth. Braces inside string literals and
//! line comments do not count.

const TAB_WIDTH: usize = 4;

/// Net brace effect of one trimmed line: (opening, closing).
fn count_braces(line: &str) -> (usize, usize) {
    let mut opens = 0;
    let mut closes = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut prev = '\0';
    for c in line.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            prev = c;
            continue;
        }
        match c {
            '"' => in_string = true,
            '/' if prev == '/' => break,
            '{' => opens += 1,
            '}' => closes += 1,
            _ => {}
        }
        prev = c;
    }
    (opens, closes)
}

pub fn indent(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + source.len() / 4);
    let mut level: usize = 0;
    let mut blank_run = false;

    for raw in source.lines() {
        let line = raw.trim();
        if line.is_empty() {
            // no blank line at the very top or right after an opening brace
            if !blank_run && !out.is_empty() && !out.ends_with("{\n") {
                out.push('\n');
            }
            blank_run = true;
            continue;
        }

        let (opens, closes) = count_braces(line);
        let leading = usize::from(line.starts_with('}'));
        level = level.saturating_sub(leading);

        // drop a blank line that would sit right before a closing brace
        if leading == 1 && blank_run && out.ends_with("\n\n") {
            out.pop();
        }
        blank_run = false;

        for _ in 0..level * TAB_WIDTH {
            out.push(' ');
        }
        out.push_str(line);
        out.push('\n');

        level = (level + opens).saturating_sub(closes - leading);
    }

    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}
