// ABOUTME: rustyline helper: symbol completion and bracket-balance validation

use crate::namespace::Namespace;
use rustyline::completion::{Completer, Pair};
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::Context;
use rustyline_derive::{Helper, Highlighter, Hinter};
use std::rc::Rc;

const SPECIAL_FORMS: [&str; 7] = ["def", "defmacro", "let", "do", "if", "fn", "quote"];

/// Line-editor helper for the REPL: tab completion over the current
/// namespace's mappings and the special forms, plus multi-line continuation
/// while brackets are unbalanced.
#[derive(Helper, Highlighter, Hinter)]
pub struct MageHelper {
    ns: Rc<Namespace>,
}

impl MageHelper {
    pub fn new(ns: Rc<Namespace>) -> Self {
        MageHelper { ns }
    }
}

fn is_token_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '\'' | ',' | '"' | '\\')
}

impl Completer for MageHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(is_token_boundary)
            .map(|i| i + 1)
            .unwrap_or(0);
        let prefix = &line[start..pos];

        let mut names: Vec<String> = self
            .ns
            .mapped_symbols()
            .iter()
            .map(|sym| sym.to_string())
            .chain(SPECIAL_FORMS.iter().map(|s| s.to_string()))
            .filter(|name| name.starts_with(prefix))
            .collect();
        names.sort();
        names.dedup();

        let candidates = names
            .into_iter()
            .map(|name| Pair {
                display: name.clone(),
                replacement: name,
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Validator for MageHelper {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        Ok(validate_brackets(ctx.input()))
    }
}

/// Incomplete while any `(`/`[`/`{` or string is still open. A mismatched
/// closer submits as-is so the reader can report it.
fn validate_brackets(input: &str) -> ValidationResult {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if in_string {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            // Character literal: the next char never counts as a delimiter
            '\\' => {
                chars.next();
            }
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let open = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(open) {
                    return ValidationResult::Valid(None);
                }
            }
            _ => {}
        }
    }

    if in_string || !stack.is_empty() {
        ValidationResult::Incomplete
    } else {
        ValidationResult::Valid(None)
    }
}
