//! Search-query heuristics for OCR output from book covers.
//!
//! Cover OCR is noisy: series banners, blurbs and publisher marks all come
//! through as lines. The title is usually the longest of the first few
//! lines and the author usually sits on a "by ..." line.

/// How many leading lines are considered when picking a title.
const TITLE_SCAN_LINES: usize = 3;

/// Marker that introduces the author line (matched case-insensitively).
const AUTHOR_MARKER: &str = "by ";

/// Derive a Google Books search query from raw recognized text.
///
/// Returns `"{title} {author}"` when both candidates are found, the title
/// alone when there is no author line, and the first three lines joined with
/// spaces when no title candidate exists. Empty or absent input yields an
/// empty string.
pub fn build_search_query(text: Option<&str>) -> String {
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return String::new(),
    };

    // OCR.space answers with \r\n line endings.
    let lines: Vec<&str> = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();

    let author = guess_author(&lines);
    let author_line = author.as_ref().map(|(idx, _)| *idx);
    // The author line only competes for the title when nothing else can.
    let title = guess_title(&lines, author_line).or_else(|| guess_title(&lines, None));

    match (title, author) {
        (Some(title), Some((_, author))) => format!("{} {}", title, author),
        (Some(title), None) => title.to_string(),
        _ => lines
            .iter()
            .take(TITLE_SCAN_LINES)
            .copied()
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Longest of the leading lines, skipping the author line.
/// Ties keep the first maximum; empty lines never win.
fn guess_title<'a>(lines: &[&'a str], author_line: Option<usize>) -> Option<&'a str> {
    let mut best: Option<&str> = None;
    let mut best_len = 0;
    for (idx, line) in lines.iter().enumerate().take(TITLE_SCAN_LINES) {
        if Some(idx) == author_line {
            continue;
        }
        let len = line.chars().count();
        if len > best_len {
            best_len = len;
            best = Some(line);
        }
    }
    best
}

/// First line mentioning "by ": its index, and the lowercased line with the
/// marker removed and trimmed. A line that is only the marker yields nothing.
fn guess_author(lines: &[&str]) -> Option<(usize, String)> {
    let (idx, line) = lines
        .iter()
        .map(|l| l.to_lowercase())
        .enumerate()
        .find(|(_, l)| l.contains(AUTHOR_MARKER))?;
    let author = line.replacen(AUTHOR_MARKER, "", 1).trim().to_string();
    if author.is_empty() {
        None
    } else {
        Some((idx, author))
    }
}
