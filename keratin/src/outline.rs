//! Indentation outline reader.
//!
//! Turns source text into a tree of whitespace-tokenized lines, one child
//! level per indentation step.

use anyhow::Result;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutlineError {
  #[error("line {0}: indentation mixes tabs and spaces")]
  MixedIndentation(usize),

  #[error("line {0}: dedent does not match any enclosing indentation level")]
  BadDedent(usize),
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct OutlineNode {
  pub tokens: Vec<String>,
  pub children: Vec<OutlineNode>,
  /// The raw source line.
  pub line: String,
  /// 1-based.
  pub line_number: usize,
}

impl OutlineNode {
  pub fn new(line: &str, line_number: usize) -> Self {
    Self {
      tokens: line.split_whitespace().map(String::from).collect(),
      children: vec![],
      line: line.to_string(),
      line_number,
    }
  }
}

/// A node that is still accepting children, together with its indentation width.
struct OpenNode {
  indent: usize,
  node: OutlineNode,
}

pub fn parse_outline(text: &str) -> Result<Vec<OutlineNode>> {
  let mut roots: Vec<OutlineNode> = vec![];
  let mut stack: Vec<OpenNode> = vec![];

  for (i, raw) in text.lines().enumerate() {
    let line_number = i + 1;
    let line = raw.trim_end();
    let content = line.trim_start();
    if content.is_empty() || content.starts_with("//") {
      continue;
    }

    let indent_str = &line[..line.len() - content.len()];
    if indent_str.contains('\t') && indent_str.contains(' ') {
      return Err(OutlineError::MixedIndentation(line_number).into());
    }
    let indent = indent_str.chars().count();

    // Close every open node at the same depth or deeper. The last one closed
    // must sit exactly at this depth, otherwise the dedent lands between levels.
    let mut last_closed = None;
    while stack.last().map(|x| x.indent >= indent).unwrap_or(false) {
      last_closed = close_top(&mut roots, &mut stack);
    }
    if let Some(closed) = last_closed {
      if closed != indent {
        return Err(OutlineError::BadDedent(line_number).into());
      }
    }

    stack.push(OpenNode {
      indent,
      node: OutlineNode::new(line, line_number),
    });
  }

  while !stack.is_empty() {
    close_top(&mut roots, &mut stack);
  }
  Ok(roots)
}

/// Moves the innermost open node into its parent (or the roots) and returns
/// its indentation width.
fn close_top(roots: &mut Vec<OutlineNode>, stack: &mut Vec<OpenNode>) -> Option<usize> {
  let top = stack.pop()?;
  match stack.last_mut() {
    Some(parent) => parent.node.children.push(top.node),
    None => roots.push(top.node),
  }
  Some(top.indent)
}
