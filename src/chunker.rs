//! Word-boundary splitting of long text into linked chunks.

/// Text placed at the start and end of chunks that belong to a longer message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Markers {
    pub(crate) start: String,
    pub(crate) end: String,
}

impl Markers {
    pub(crate) fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Split `text` into chunks of at most `max_len` characters without breaking words.
///
/// Text that already fits is returned as-is. Otherwise every chunk but the last
/// ends with `markers.end` and every chunk but the first starts with
/// `markers.start`, each separated from the body by a blank line. The bound
/// applies to the body only: the end marker can push a chunk past `max_len`, and
/// a single word longer than `max_len` is kept whole.
pub(crate) fn split_text(text: &str, max_len: usize, markers: &Markers) -> Vec<String> {
    if char_len(text) <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split(' ') {
        let word_len = char_len(word);
        if current_len + word_len + 1 > max_len {
            chunks.push(format!("{}\n\n{}", current.trim(), markers.end));
            current = format!("{}\n\n{}", markers.start, word);
            current_len = char_len(&current);
        } else {
            current.push(' ');
            current.push_str(word);
            current_len += word_len + 1;
        }
    }

    if !current.is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Markers {
        Markers::new("[cont]", "[more]")
    }

    fn strip_markers(chunk: &str, m: &Markers) -> String {
        let body = chunk.strip_prefix(m.start.as_str()).unwrap_or(chunk);
        let body = body.strip_suffix(m.end.as_str()).unwrap_or(body);
        body.to_string()
    }

    fn words_of(chunks: &[String], m: &Markers) -> Vec<String> {
        chunks
            .iter()
            .flat_map(|c| {
                strip_markers(c, m)
                    .split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    #[test]
    fn test_short_text_is_unchanged() {
        let chunks = split_text("hello world", 50, &markers());
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_text_exactly_at_limit_is_unchanged() {
        let text = "a".repeat(20);
        assert_eq!(split_text(&text, 20, &markers()), vec![text]);
    }

    #[test]
    fn test_empty_text_is_single_empty_chunk() {
        assert_eq!(split_text("", 10, &markers()), vec![String::new()]);
    }

    #[test]
    fn test_split_adds_markers() {
        let m = markers();
        let chunks = split_text("one two three four five six", 20, &m);
        assert_eq!(
            chunks,
            vec![
                "one two three four\n\n[more]".to_string(),
                "[cont]\n\nfive six".to_string(),
            ]
        );
    }

    #[test]
    fn test_start_marker_counts_against_the_limit() {
        let m = markers();
        let chunks = split_text("one two three four five six", 10, &m);
        assert_eq!(
            chunks,
            vec![
                "one two\n\n[more]".to_string(),
                "[cont]\n\nthree\n\n[more]".to_string(),
                "[cont]\n\nfour\n\n[more]".to_string(),
                "[cont]\n\nfive\n\n[more]".to_string(),
                "[cont]\n\nsix".to_string(),
            ]
        );
    }

    #[test]
    fn test_middle_chunks_have_both_markers() {
        let m = markers();
        let text = (0..200).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let chunks = split_text(&text, 60, &m);
        assert!(chunks.len() > 2);

        assert!(!chunks[0].starts_with(&m.start));
        assert!(chunks[0].ends_with(&m.end));
        for chunk in &chunks[1..chunks.len() - 1] {
            assert!(chunk.starts_with(&m.start), "missing start marker: {chunk}");
            assert!(chunk.ends_with(&m.end), "missing end marker: {chunk}");
        }
        let last = chunks.last().unwrap();
        assert!(last.starts_with(&m.start));
        assert!(!last.ends_with(&m.end));
    }

    #[test]
    fn test_word_sequence_is_preserved() {
        let m = markers();
        let text = "The quick brown fox jumps over the lazy dog and keeps running \
                    through the forest until the sun goes down behind the hills";
        let chunks = split_text(text, 25, &m);
        let expected: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        assert_eq!(words_of(&chunks, &m), expected);
    }

    #[test]
    fn test_bodies_respect_limit() {
        let m = markers();
        let text = (0..300)
            .map(|i| "x".repeat(1 + i % 9))
            .collect::<Vec<_>>()
            .join(" ");
        let max_len = 80;
        for chunk in split_text(&text, max_len, &m) {
            let body = strip_markers(&chunk, &m);
            let body_len = body.trim().chars().count();
            assert!(body_len <= max_len, "chunk body too long ({body_len}): {chunk}");
        }
    }

    #[test]
    fn test_oversized_word_is_not_split() {
        let m = markers();
        let big = "A".repeat(2000);
        let chunks = split_text(&big, 1024, &m);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], format!("\n\n{}", m.end));
        assert_eq!(chunks[1], format!("{}\n\n{}", m.start, big));
    }

    #[test]
    fn test_oversized_word_in_the_middle_stays_whole() {
        let m = markers();
        let big = "B".repeat(40);
        let text = format!("aa bb {big} cc dd");
        let chunks = split_text(&text, 10, &m);
        assert!(chunks.iter().any(|c| c.contains(&big)));
        assert_eq!(
            words_of(&chunks, &m),
            vec!["aa", "bb", big.as_str(), "cc", "dd"]
        );
    }

    #[test]
    fn test_limit_counts_characters_not_bytes() {
        let m = markers();
        // Nine characters, seventeen bytes.
        let text = "ééééé ééé";
        assert_eq!(split_text(text, 10, &m), vec![text.to_string()]);
    }

    #[test]
    fn test_consecutive_spaces_collapse_at_split_points() {
        let m = markers();
        let chunks = split_text("alpha   beta gamma delta", 12, &m);
        for chunk in &chunks {
            assert!(!chunk.contains("  "), "run of spaces survived: {chunk:?}");
        }
        assert_eq!(words_of(&chunks, &m), vec!["alpha", "beta", "gamma", "delta"]);
    }
}
