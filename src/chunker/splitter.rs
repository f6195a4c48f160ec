use std::collections::VecDeque;

/// A break point in text
///
/// Text is cut after each `pattern`. Whatever precedes `joiner` in the
/// pattern stays on the end of the piece before the cut, and `joiner` is put
/// back between pieces when they are merged, so a sentence keeps its period.
#[derive(Debug, Clone, Copy)]
struct Separator {
    pattern: &'static str,
    joiner: &'static str,
}

impl Separator {
    const fn new(pattern: &'static str, joiner: &'static str) -> Self {
        Self { pattern, joiner }
    }

    /// Splits `text` after each occurrence of the pattern
    fn pieces<'a>(&self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let Self { pattern, joiner } = *self;
        text.split_inclusive(pattern)
            .map(move |piece| match piece.strip_suffix(joiner) {
                Some(head) if piece.ends_with(pattern) => head,
                _ => piece,
            })
            .filter(|piece| !piece.is_empty())
    }
}

/// Break points tried in order before falling back to a hard cut
const SEPARATORS: &[Separator] = &[
    Separator::new("\n\n", "\n\n"),
    Separator::new("\n", "\n"),
    Separator::new(". ", " "),
    Separator::new(" ", " "),
];

/// Recursive character splitter with overlapping windows
///
/// Lengths are counted in `char`s. Text is split on the first separator it
/// contains; pieces that fit are merged greedily into windows, pieces that
/// do not fit are split again on the next separator. Text with no separator
/// left is cut into fixed windows.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// `chunk_size` is raised to 1 and `chunk_overlap` capped below it
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    /// Splits text into trimmed, non-empty windows of at most `chunk_size` chars
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, SEPARATORS)
            .into_iter()
            .filter_map(|chunk| {
                let trimmed = chunk.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .collect()
    }

    fn split_with(&self, text: &str, separators: &[Separator]) -> Vec<String> {
        let Some(index) = separators
            .iter()
            .position(|sep| text.contains(sep.pattern))
        else {
            return self.hard_split(text);
        };
        let separator = separators[index];
        let finer = &separators[index + 1..];

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in separator.pieces(text) {
            if char_len(piece) <= self.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting, separator.joiner));
                fitting.clear();
            }
            chunks.extend(self.split_with(piece, finer));
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting, separator.joiner));
        }

        chunks
    }

    /// Greedily joins pieces into windows, carrying up to `chunk_overlap`
    /// chars of trailing pieces into the next window
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);

            if !window.is_empty() && total + separator_len + len > self.chunk_size {
                chunks.push(join(&window, separator));

                while !window.is_empty()
                    && (total > self.chunk_overlap
                        || total + separator_len + len > self.chunk_size)
                {
                    if let Some((_, removed)) = window.pop_front() {
                        total -= removed;
                        if !window.is_empty() {
                            total -= separator_len;
                        }
                    }
                }
            }

            if !window.is_empty() {
                total += separator_len;
            }
            total += len;
            window.push_back((piece, len));
        }

        if !window.is_empty() {
            chunks.push(join(&window, separator));
        }

        chunks
    }

    /// Cuts text into `chunk_size` windows advancing by `chunk_size - chunk_overlap`
    fn hard_split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

fn join(window: &VecDeque<(&str, usize)>, separator: &str) -> String {
    window
        .iter()
        .map(|(piece, _)| *piece)
        .collect::<Vec<_>>()
        .join(separator)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
