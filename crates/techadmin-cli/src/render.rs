//! Colored terminal output.

use colored::Colorize;
use techadmin_application::{AccessState, ListFooter, SearchState};
use techadmin_core::technique::{CATEGORY_OPTIONS, Technique};

pub fn info(message: &str) {
    println!("{}", message.bright_blue());
}

pub fn success(message: &str) {
    println!("{}", message.bright_green());
}

pub fn warning(message: &str) {
    println!("{}", message.yellow());
}

pub fn failure(message: &str) {
    eprintln!("{}", message.red());
}

pub fn access(state: &AccessState) {
    match state {
        AccessState::Loading => info("Restoring session..."),
        AccessState::SignedOut => warning("Not signed in. Use 'login <email>'."),
        AccessState::ResolvingRoles { email } => {
            info(&format!("Signed in as {}, checking roles...", email_or_unknown(email)))
        }
        AccessState::NotAuthorized { email } => warning(&format!(
            "Signed in as {}, but this account is not an admin. Use 'logout' to switch accounts.",
            email_or_unknown(email)
        )),
        AccessState::Admin { email } => {
            success(&format!("Signed in as {} (admin)", email_or_unknown(email)))
        }
    }
}

fn email_or_unknown(email: &Option<String>) -> &str {
    email.as_deref().unwrap_or("<no email>")
}

pub fn categories() {
    for option in CATEGORY_OPTIONS {
        println!("  {:<16} {}", option.code.bright_cyan(), option.label);
    }
}

/// One line per loaded technique, numbered from 1.
pub fn listing(state: &SearchState) {
    let filter = match &state.category {
        Some(code) => format!(" in {}", code),
        None => String::new(),
    };
    let query = if state.query.is_empty() {
        "all techniques".to_string()
    } else {
        format!("\"{}\"", state.query)
    };
    println!("{}", format!("== {}{} ==", query, filter).bright_magenta().bold());

    for (index, technique) in state.items.iter().enumerate() {
        println!("{}", summary_line(index + 1, technique));
    }

    match state.footer() {
        ListFooter::Loading => info("Loading..."),
        ListFooter::Error(message) => failure(&message),
        ListFooter::Empty => warning("No techniques found."),
        ListFooter::Sentinel { loading_more: true } => info("Loading more..."),
        ListFooter::Sentinel { loading_more: false } => println!(
            "{}",
            format!("{} loaded, 'more' for the next page", state.items.len()).bright_black()
        ),
        ListFooter::NoMore => println!(
            "{}",
            format!("{} loaded, no more results", state.items.len()).bright_black()
        ),
    }

    // A next-page failure keeps the list, so the footer alone would hide it.
    if !state.items.is_empty()
        && let Some(message) = &state.error
    {
        failure(message);
    }
}

fn summary_line(position: usize, technique: &Technique) -> String {
    let mut line = format!("{:>4}. {}", position, technique.name.bold());
    if let Some(label) = technique.category_name.as_deref().or(technique.category.as_deref()) {
        line.push_str(&format!(" [{}]", label).bright_black().to_string());
    }
    if !technique.aliases.is_empty() {
        line.push_str(&format!("  aka {}", technique.aliases.join(", ")));
    }
    line
}

pub fn detail(technique: &Technique) {
    println!("{}", technique.name.bright_magenta().bold());
    field("id", Some(technique.id.as_str()));
    if !technique.aliases.is_empty() {
        field("aliases", Some(technique.aliases.join(", ").as_str()));
    }
    field("category", technique.category.as_deref());
    field("category name", technique.category_name.as_deref());
    field("description", technique.description.as_deref());
    field("history", technique.history.as_deref());
    field("modern usage", technique.modern_usage.as_deref());
    if let Some(created_at) = technique.created_at {
        field("created", Some(created_at.to_rfc3339().as_str()));
    }
}

fn field(label: &str, value: Option<&str>) {
    if let Some(value) = value {
        println!("  {:<14} {}", format!("{}:", label).bright_black(), value);
    }
}
