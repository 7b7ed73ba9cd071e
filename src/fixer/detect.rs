//! Splitting a document into candidate JSON object blocks.
//!
//! Hand-edited hexagram files sometimes end up holding several object
//! literals back to back. A detector finds where each one starts; it never
//! parses anything itself.

/// A contiguous text span believed to hold one JSON object literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub text: &'a str,
    /// 1-based line in the source document where the block begins.
    pub start_line: usize,
}

#[derive(Debug, Clone)]
pub struct Detection<'a> {
    pub blocks: Vec<Block<'a>>,
    pub starts_found: usize,
    /// Non-blank lines that ended up outside every block.
    pub stray_lines: usize,
    pub strategy: &'static str,
}

impl<'a> Detection<'a> {
    fn whole(text: &'a str, starts_found: usize, strategy: &'static str) -> Self {
        Self {
            blocks: vec![Block {
                text,
                start_line: 1,
            }],
            starts_found,
            stray_lines: 0,
            strategy,
        }
    }

    pub fn is_multi(&self) -> bool {
        self.blocks.len() > 1
    }
}

pub trait BlockDetector {
    fn name(&self) -> &'static str;
    fn detect<'a>(&self, text: &'a str) -> Detection<'a>;
}

/// A block starts at a line holding only `{` whose next line mentions the
/// quoted marker key.
#[derive(Debug, Clone)]
pub struct MarkerLineDetector {
    quoted_marker: String,
}

impl MarkerLineDetector {
    pub fn new(marker_key: &str) -> Self {
        Self {
            quoted_marker: format!("\"{marker_key}\""),
        }
    }
}

impl Default for MarkerLineDetector {
    fn default() -> Self {
        Self::new("hexagram_id")
    }
}

impl BlockDetector for MarkerLineDetector {
    fn name(&self) -> &'static str {
        "marker"
    }

    fn detect<'a>(&self, text: &'a str) -> Detection<'a> {
        let mut offsets = Vec::new();
        let mut lines = Vec::new();
        let mut pos = 0usize;
        for raw in text.split_inclusive('\n') {
            offsets.push(pos);
            lines.push(raw.trim_end_matches(['\n', '\r']));
            pos += raw.len();
        }

        let starts = (0..lines.len())
            .filter(|&i| {
                lines[i].trim() == "{"
                    && lines
                        .get(i + 1)
                        .is_some_and(|next| next.contains(&self.quoted_marker))
            })
            .collect::<Vec<_>>();

        if starts.len() <= 1 {
            return Detection::whole(text, starts.len(), self.name());
        }

        let stray_lines = lines[..starts[0]]
            .iter()
            .filter(|line| !line.trim().is_empty())
            .count();

        let blocks = starts
            .iter()
            .enumerate()
            .map(|(n, &start)| {
                let end = starts
                    .get(n + 1)
                    .map(|&next| offsets[next])
                    .unwrap_or(text.len());
                Block {
                    text: text[offsets[start]..end].trim_end(),
                    start_line: start + 1,
                }
            })
            .collect();

        Detection {
            blocks,
            starts_found: starts.len(),
            stray_lines,
            strategy: self.name(),
        }
    }
}

/// Tracks object and array nesting outside string literals; every top-level
/// `{ ... }` span is a block. A top-level array is one value, never split.
#[derive(Debug, Clone, Copy, Default)]
pub struct BraceDepthDetector;

impl BlockDetector for BraceDepthDetector {
    fn name(&self) -> &'static str {
        "depth"
    }

    fn detect<'a>(&self, text: &'a str) -> Detection<'a> {
        let mut blocks = Vec::new();
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        let mut open: Option<(usize, usize)> = None;
        let mut line = 1usize;
        let mut stray_lines = 0usize;
        let mut last_stray_line = 0usize;

        for (idx, ch) in text.char_indices() {
            if ch == '\n' {
                line += 1;
            }
            if in_string {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == '"' {
                    in_string = false;
                }
                continue;
            }
            if depth == 0 && ch != '{' && !ch.is_whitespace() && last_stray_line != line {
                stray_lines += 1;
                last_stray_line = line;
            }
            match ch {
                '"' => in_string = true,
                '{' | '[' => {
                    if depth == 0 && ch == '{' {
                        open = Some((idx, line));
                    }
                    depth += 1;
                }
                '}' | ']' if depth > 0 => {
                    depth -= 1;
                    if depth == 0
                        && let Some((start, start_line)) = open.take()
                    {
                        blocks.push(Block {
                            text: &text[start..=idx],
                            start_line,
                        });
                    }
                }
                _ => {}
            }
        }

        if let Some((start, start_line)) = open {
            blocks.push(Block {
                text: text[start..].trim_end(),
                start_line,
            });
        }

        if blocks.is_empty() {
            return Detection::whole(text, 0, self.name());
        }

        Detection {
            starts_found: blocks.len(),
            blocks,
            stray_lines,
            strategy: self.name(),
        }
    }
}
