use serde_json::Value;
use std::fmt;

use crate::fixer::detect::Block;

const CONTEXT_RADIUS: usize = 3;

/// Where and why a block failed strict parsing, with enough surrounding
/// text for someone to fix the source file by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// 0-based index of the block within the document.
    pub block_index: usize,
    /// Line and column as reported by the parser, relative to the block.
    pub line: usize,
    pub column: usize,
    pub document_line: usize,
    pub message: String,
    pub context: Vec<String>,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block {} line {} column {} (document line {}): {}",
            self.block_index + 1,
            self.line,
            self.column,
            self.document_line,
            self.message
        )
    }
}

impl ParseFailure {
    pub fn render_context(&self) -> String {
        self.context.join("\n")
    }
}

fn context_lines(block: &Block<'_>, failing_line: usize) -> Vec<String> {
    let lines = block.text.lines().collect::<Vec<_>>();
    if lines.is_empty() {
        return Vec::new();
    }
    let idx = failing_line.saturating_sub(1).min(lines.len() - 1);
    let first = idx.saturating_sub(CONTEXT_RADIUS);
    let last = (idx + CONTEXT_RADIUS).min(lines.len() - 1);
    (first..=last)
        .map(|i| {
            let marker = if i == idx { ">>" } else { "  " };
            format!("{marker} {:>5} | {}", block.start_line + i, lines[i])
        })
        .collect()
}

pub fn parse_block(block: &Block<'_>, block_index: usize) -> Result<Value, ParseFailure> {
    serde_json::from_str::<Value>(block.text).map_err(|err| {
        let full = err.to_string();
        let message = full
            .split(" at line ")
            .next()
            .unwrap_or(full.as_str())
            .to_string();
        ParseFailure {
            block_index,
            line: err.line(),
            column: err.column(),
            document_line: block.start_line + err.line().saturating_sub(1),
            message,
            context: context_lines(block, err.line()),
        }
    })
}
