//! REPL command grammar.

/// Every command word the REPL understands, in help order.
pub const COMMAND_NAMES: &[&str] = &[
    "login",
    "logout",
    "status",
    "search",
    "category",
    "categories",
    "more",
    "refresh",
    "list",
    "show",
    "new",
    "edit",
    "delete",
    "help",
    "quit",
];

/// A technique addressed either by its position in the listing or by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// 1-based position in the current listing
    Index(usize),
    Id(String),
}

impl Target {
    fn parse(value: &str) -> Self {
        match value.parse::<usize>() {
            Ok(index) if index > 0 => Self::Index(index),
            _ => Self::Id(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String },
    Logout,
    Status,
    Search { text: String },
    /// `None` clears the filter
    Category { code: Option<String> },
    Categories,
    More,
    Refresh,
    List,
    Show(Target),
    New,
    Edit(Target),
    Delete(Target),
    Help,
    Quit,
}

impl Command {
    /// Parses one trimmed, non-empty input line.
    pub fn parse(line: &str) -> Result<Self, String> {
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "login" => Self::Login {
                email: required(word, rest, "<email>")?.to_string(),
            },
            "logout" => Self::Logout,
            "status" => Self::Status,
            "search" => Self::Search {
                text: rest.to_string(),
            },
            "category" => Self::Category {
                code: match rest {
                    "" | "-" | "all" => None,
                    code => Some(code.to_string()),
                },
            },
            "categories" => Self::Categories,
            "more" => Self::More,
            "refresh" => Self::Refresh,
            "list" | "ls" => Self::List,
            "show" => Self::Show(Target::parse(required(word, rest, "<n|id>")?)),
            "new" => Self::New,
            "edit" => Self::Edit(Target::parse(required(word, rest, "<n|id>")?)),
            "delete" | "rm" => Self::Delete(Target::parse(required(word, rest, "<n|id>")?)),
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
        };
        Ok(command)
    }
}

fn required<'a>(word: &str, rest: &'a str, usage: &str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("Usage: {} {}", word, usage))
    } else {
        Ok(rest)
    }
}

pub const HELP: &str = "\
login <email>        sign in (password is prompted)
logout               sign out
status               show who is signed in and their access
search [text]        search techniques by name or alias
category [code|-]    filter by category code, '-' clears the filter
categories           list category codes
more                 load the next page
refresh              reload from the first page
list                 show the loaded techniques
show <n|id>          show one technique
new                  create a technique
edit <n|id>          edit a technique
delete <n|id>        delete a technique
help                 this text
quit                 exit";
