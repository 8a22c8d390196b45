//! Recursive character text splitter.
//!
//! Splits on the coarsest separator that still appears in the text, recursing
//! to finer separators for oversized pieces, then merges adjacent pieces back
//! into chunks with a trailing-character overlap. Sizes are measured in
//! characters so multi-byte input never splits mid-codepoint.

/// Splits documents into overlapping chunks for embedding.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<&'static str>,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
            separators: vec!["\n\n", "\n", ". ", " ", ""],
        }
    }

    /// Splits `text` into chunks of at most `chunk_size` characters.
    pub fn split(&self, text: &str) -> Vec<String> {
        let units = self.split_recursive(text, &self.separators);
        self.merge(units)
    }

    /* --- Internals --- */

    fn split_recursive(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        let (sep, rest) = match separators.split_first() {
            Some((sep, rest)) => (*sep, rest),
            None => ("", &[] as &[&'static str]),
        };

        let pieces = if sep.is_empty() {
            hard_split(text, self.chunk_size)
        } else if text.contains(sep) {
            split_keep_separator(text, sep)
        } else {
            // Separator absent at this level, try the next one.
            return self.split_recursive(text, rest);
        };

        let mut units = Vec::with_capacity(pieces.len());
        for piece in pieces {
            if char_len(&piece) > self.chunk_size {
                units.extend(self.split_recursive(&piece, rest));
            } else {
                units.push(piece);
            }
        }
        units
    }

    fn merge(&self, units: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for unit in units {
            let unit_len = char_len(&unit);
            if current_len > 0 && current_len + unit_len > self.chunk_size {
                chunks.push(current.clone());
                // Carry a tail of the previous chunk forward, shrinking it if
                // the next unit alone nearly fills chunk_size.
                let keep = self
                    .chunk_overlap
                    .min(self.chunk_size.saturating_sub(unit_len));
                current = tail_chars(&current, keep);
                current_len = char_len(&current);
            }
            current.push_str(&unit);
            current_len += unit_len;
        }

        if !current.trim().is_empty() {
            chunks.push(current);
        }
        chunks.retain(|c| !c.trim().is_empty());
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Splits on `sep`, keeping the separator attached to the preceding piece.
fn split_keep_separator(text: &str, sep: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some(at) = rest.find(sep) {
        let end = at + sep.len();
        pieces.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    pieces
}

/// Last-resort split into fixed-width character windows.
fn hard_split(text: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(width)
        .map(|w| w.iter().collect::<String>())
        .collect()
}

/// Last `n` characters of `s`.
fn tail_chars(s: &str, n: usize) -> String {
    let total = char_len(s);
    s.chars().skip(total.saturating_sub(n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let splitter = TextSplitter::default();
        let chunks = splitter.split("just a short note");
        assert_eq!(chunks, vec!["just a short note".to_string()]);
    }

    #[test]
    fn no_chunk_exceeds_chunk_size() {
        let splitter = TextSplitter::new(100, 20);
        let paragraph = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let chunks = splitter.split(&paragraph);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunk.chars().count() <= 100,
                "chunk of {} chars",
                chunk.chars().count()
            );
        }
    }

    #[test]
    fn paragraph_breaks_are_preferred_boundaries() {
        let splitter = TextSplitter::new(30, 0);
        let text = "first paragraph here\n\nsecond paragraph here";
        let chunks = splitter.split(text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with("first paragraph"));
        assert!(chunks[1].starts_with("second paragraph"));
    }

    #[test]
    fn consecutive_chunks_share_an_overlap() {
        let splitter = TextSplitter::new(20, 5);
        let text = "aaaa bbbb cccc dddd eeee ffff gggg hhhh";
        let chunks = splitter.split(text);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let tail: String = {
                let total = pair[0].chars().count();
                pair[0].chars().skip(total.saturating_sub(5)).collect()
            };
            assert!(
                pair[1].starts_with(&tail),
                "expected {:?} to start with {:?}",
                pair[1],
                tail
            );
        }
    }

    #[test]
    fn multibyte_text_never_panics() {
        let splitter = TextSplitter::new(10, 2);
        let text = "héllo wörld æøå ".repeat(20);
        let chunks = splitter.split(&text);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 10);
        }
    }

    #[test]
    fn unbroken_text_falls_back_to_character_windows() {
        let splitter = TextSplitter::new(8, 0);
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = splitter.split(text);
        assert_eq!(chunks.join(""), text);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 8);
        }
    }

    #[test]
    fn whitespace_only_text_yields_no_chunks() {
        let splitter = TextSplitter::default();
        assert!(splitter.split("   \n\n  \t ").is_empty());
    }
}
