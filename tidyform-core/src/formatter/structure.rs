//! Structural normalization of bodies
//!
//! Inside every block, attributes and nested blocks are regrouped into fixed
//! bands so that every instance of a block type reads the same way:
//!
//! 1. `source` and `version` (only for root-level `module` blocks)
//! 2. meta-argument attributes such as `count` and `for_each`
//! 3. all other attributes
//! 4. nested blocks that are not meta-arguments
//! 5. meta-argument blocks such as `lifecycle`
//!
//! Attributes are sorted by name, blocks by type (stable, so blocks of the same
//! type keep their relative order). The root body is never reordered.

use std::collections::BTreeMap;

use crate::rules::{
    is_meta_argument, is_module_body, is_module_source_attribute, is_top_level_block,
    is_variable_body,
};
use crate::syntax::{Attribute, Block, Body, BodyItem, File, Token, TokenKind};

use super::expr::{canonicalize_type, unwrap_interpolation};

/// Normalize a parsed file
pub fn normalize_file(file: File) -> File {
    File {
        body: normalize_body(file.body, &[]),
        end: file.end,
    }
}

fn normalize_body(body: Body, path: &[String]) -> Body {
    if path.is_empty() {
        normalize_root(body)
    } else {
        normalize_nested(body, path)
    }
}

/// Canonicalize in place without changing the order of anything
fn normalize_root(body: Body) -> Body {
    let items = body
        .items
        .into_iter()
        .map(|item| match item {
            BodyItem::Attribute(attr) => BodyItem::Attribute(canonicalize_attribute(attr, &[])),
            BodyItem::Block(block) => {
                if !is_top_level_block(block.block_type()) {
                    log::debug!(
                        "top-level block type `{}` is not a recognized configuration block",
                        block.block_type()
                    );
                }
                BodyItem::Block(normalize_block(block, &[]))
            }
            other => other,
        })
        .collect();

    Body {
        items,
        inline: body.inline,
    }
}

fn normalize_nested(body: Body, path: &[String]) -> Body {
    let inline = body.inline;
    let mut attributes: BTreeMap<String, Attribute> = BTreeMap::new();
    let mut blocks: Vec<Block> = Vec::new();
    let mut loose: Vec<Token> = Vec::new();

    for item in body.items {
        match item {
            BodyItem::Attribute(mut attr) => {
                prepend_comments(&mut attr.leading_comments, &mut loose);
                let attr = canonicalize_attribute(attr, path);
                attributes.insert(attr.name().to_string(), attr);
            }
            BodyItem::Block(mut block) => {
                prepend_comments(&mut block.leading_comments, &mut loose);
                blocks.push(normalize_block(block, path));
            }
            BodyItem::Unstructured(tokens) => loose.extend(strip_blank_lines(tokens)),
        }
    }

    // Stable: blocks of one type keep their authored order
    blocks.sort_by(|a, b| a.block_type().cmp(b.block_type()));

    let in_module = is_module_body(path);
    let mut module_source = Vec::new();
    let mut meta = Vec::new();
    let mut plain = Vec::new();
    for (name, attr) in attributes {
        if in_module && is_module_source_attribute(&name) {
            module_source.push(attr);
        } else if is_meta_argument(&name) {
            meta.push(attr);
        } else {
            plain.push(attr);
        }
    }
    let (meta_blocks, plain_blocks): (Vec<Block>, Vec<Block>) = blocks
        .into_iter()
        .partition(|block| is_meta_argument(block.block_type()));

    let mut emitter = Emitter::default();
    emitter.attributes(module_source);
    emitter.attributes(meta);
    emitter.attributes(plain);
    emitter.blocks(plain_blocks);
    emitter.blocks(meta_blocks);
    if !loose.is_empty() {
        emitter.separate();
        emitter.push(BodyItem::Unstructured(loose));
    }

    Body {
        items: emitter.items,
        inline,
    }
}

fn normalize_block(mut block: Block, path: &[String]) -> Block {
    let labels = block.labels().to_vec();
    block.set_labels(labels);

    let mut child_path = path.to_vec();
    child_path.push(block.block_type().to_string());

    let body = std::mem::take(&mut block.body);
    block.body = normalize_body(body, &child_path);
    block.expand_inline_body();
    block
}

fn canonicalize_attribute(mut attr: Attribute, path: &[String]) -> Attribute {
    let expr = std::mem::take(&mut attr.expr);
    let expr = if is_variable_body(path) && attr.name() == "type" {
        canonicalize_type(expr)
    } else {
        unwrap_interpolation(expr)
    };
    attr.set_expr(expr);
    attr
}

/// Move loose comments in front of the next item's own comments
fn prepend_comments(leading: &mut Vec<Token>, loose: &mut Vec<Token>) {
    if loose.is_empty() {
        return;
    }
    loose.append(leading);
    *leading = std::mem::take(loose);
}

/// Keep comments, dropping the blank lines between them. A line break that
/// ends a block comment's line is kept.
fn strip_blank_lines(tokens: Vec<Token>) -> Vec<Token> {
    let mut kept: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.kind == TokenKind::Newline && kept.last().is_none_or(Token::ends_line) {
            continue;
        }
        kept.push(token);
    }
    kept
}

/// Collects rebuilt body items, placing one blank line between groups
#[derive(Default)]
struct Emitter {
    items: Vec<BodyItem>,
}

impl Emitter {
    fn attributes(&mut self, group: Vec<Attribute>) {
        if group.is_empty() {
            return;
        }
        self.separate();
        for (i, attr) in group.into_iter().enumerate() {
            // Commented attributes get breathing room from the one above
            if i > 0 && !attr.leading_comments.is_empty() {
                self.separate();
            }
            self.push(BodyItem::Attribute(attr));
        }
    }

    fn blocks(&mut self, group: Vec<Block>) {
        let mut prev_type: Option<String> = None;
        for block in group {
            if prev_type.as_deref() != Some(block.block_type()) {
                self.separate();
            }
            prev_type = Some(block.block_type().to_string());
            self.push(BodyItem::Block(block));
        }
    }

    /// A blank line, unless nothing has been emitted yet
    fn separate(&mut self) {
        if !self.items.is_empty() {
            self.items.push(BodyItem::Unstructured(vec![Token::newline()]));
        }
    }

    fn push(&mut self, mut item: BodyItem) {
        item.ensure_line_end();
        self.items.push(item);
    }
}
