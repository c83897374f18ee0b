use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use techadmin_core::technique::CATEGORY_OPTIONS;

use crate::command::COMMAND_NAMES;

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
pub struct CliHelper {
    commands: Vec<String>,
    categories: Vec<String>,
    /// Echo `*` instead of the typed characters
    pub masking: bool,
}

impl CliHelper {
    pub fn new() -> Self {
        Self {
            commands: COMMAND_NAMES.iter().map(|name| name.to_string()).collect(),
            categories: CATEGORY_OPTIONS
                .iter()
                .map(|option| option.code.to_string())
                .collect(),
            masking: false,
        }
    }

    fn candidates<'a, 'l>(&'a self, line: &'l str) -> (usize, Vec<&'a String>, &'l str) {
        match line.split_once(' ') {
            Some(("category", rest)) if !rest.contains(' ') => {
                let start = line.len() - rest.len();
                let found = self
                    .categories
                    .iter()
                    .filter(|code| code.starts_with(rest))
                    .collect();
                (start, found, &line[start..])
            }
            Some(_) => (0, Vec::new(), ""),
            None => {
                let found = self
                    .commands
                    .iter()
                    .filter(|cmd| cmd.starts_with(line))
                    .collect();
                (0, found, line)
            }
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        if self.masking {
            return Ok((pos, Vec::new()));
        }

        let (start, found, _) = self.candidates(&line[..pos]);
        let candidates = found
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate.clone(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if self.masking {
            return Owned("*".repeat(line.chars().count()));
        }

        let word = line.split_once(' ').map_or(line, |(word, _)| word);
        if self.commands.iter().any(|cmd| cmd == word) {
            let rest = &line[word.len()..];
            Owned(format!("{}{}", word.bright_cyan(), rest))
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.is_empty() || self.masking {
            return None;
        }

        let (_, found, typed) = self.candidates(line);
        found
            .into_iter()
            .find(|candidate| candidate.len() > typed.len())
            .map(|candidate| candidate[typed.len()..].to_string())
    }
}

impl Validator for CliHelper {}
