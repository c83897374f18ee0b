//! Command dispatch for the interactive console.

use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use rustyline::error::ReadlineError;
use techadmin_application::{AdminConsole, EditorMode, TechniqueEditor, TechniquePanel};
use techadmin_core::error::AdminError;
use techadmin_core::technique::Technique;
use tokio::time::timeout;

use crate::LineEditor;
use crate::command::{Command, HELP, Target};
use crate::form;
use crate::render;

/// How long to wait for roles after a sign-in before giving the prompt back.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

pub enum Flow {
    Continue,
    Quit,
}

pub struct Repl {
    console: Arc<AdminConsole>,
    rl: LineEditor,
}

impl Repl {
    pub fn new(console: Arc<AdminConsole>, rl: LineEditor) -> Self {
        Self { console, rl }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        println!("{}", "=== techadmin ===".bright_magenta().bold());
        render::access(&self.console.access());
        self.open_listing().await;
        println!("{}", "Type 'help' for commands, 'quit' to exit.".bright_black());
        println!();

        loop {
            match self.rl.readline(">> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = self.rl.add_history_entry(trimmed);

                    let command = match Command::parse(trimmed) {
                        Ok(command) => command,
                        Err(message) => {
                            render::warning(&message);
                            continue;
                        }
                    };

                    if let Flow::Quit = self.dispatch(command).await? {
                        render::success("Goodbye!");
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    render::warning("CTRL-C detected. Type 'quit' to exit.");
                }
                Err(ReadlineError::Eof) => {
                    render::success("CTRL-D detected. Exiting...");
                    break;
                }
                Err(err) => {
                    render::failure(&format!("Error: {:?}", err));
                    break;
                }
            }
        }

        Ok(())
    }

    async fn dispatch(&mut self, command: Command) -> anyhow::Result<Flow> {
        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => println!("{}", HELP),
            Command::Status => render::access(&self.console.access()),
            Command::Categories => render::categories(),
            Command::Login { email } => self.login(&email).await?,
            Command::Logout => self.logout().await,
            Command::Search { text } => {
                if let Some(panel) = self.panel() {
                    report(panel.search().set_query(text).await, "Search failed");
                    render::listing(&panel.search().snapshot());
                }
            }
            Command::Category { code } => {
                if let Some(panel) = self.panel() {
                    report(panel.search().set_category(code).await, "Search failed");
                    render::listing(&panel.search().snapshot());
                }
            }
            Command::More => {
                if let Some(panel) = self.panel() {
                    match panel.search().on_near_end().await {
                        Ok(false) => render::info("Nothing more to load."),
                        Ok(true) => {}
                        Err(err) => render::failure(&err.user_message("Failed to load techniques")),
                    }
                    render::listing(&panel.search().snapshot());
                }
            }
            Command::Refresh => {
                if let Some(panel) = self.panel() {
                    report(panel.search().refresh().await, "Failed to load techniques");
                    render::listing(&panel.search().snapshot());
                }
            }
            Command::List => {
                if let Some(panel) = self.panel() {
                    render::listing(&panel.search().snapshot());
                }
            }
            Command::Show(target) => {
                if let Some(panel) = self.panel()
                    && let Some(technique) = find(&panel, &target)
                {
                    render::detail(&technique);
                }
            }
            Command::New => {
                if let Some(panel) = self.panel() {
                    let editor = panel.open_create();
                    self.edit(&panel, editor).await?;
                }
            }
            Command::Edit(target) => {
                if let Some(panel) = self.panel()
                    && let Some(technique) = find(&panel, &target)
                {
                    match panel.open_edit(&technique.id) {
                        Ok(editor) => self.edit(&panel, editor).await?,
                        Err(err) => render::failure(&err.to_string()),
                    }
                }
            }
            Command::Delete(target) => {
                if let Some(panel) = self.panel()
                    && let Some(technique) = find(&panel, &target)
                {
                    self.delete(&panel, &technique).await?;
                }
            }
        }
        Ok(Flow::Continue)
    }

    /// The technique panel, or an explanation of why it is unavailable.
    fn panel(&self) -> Option<Arc<TechniquePanel>> {
        let panel = self.console.techniques();
        if panel.is_none() {
            render::access(&self.console.access());
        }
        panel
    }

    /// Starts the listing once the console is open to an admin.
    async fn open_listing(&self) {
        if let Some(panel) = self.console.techniques() {
            report(panel.search().start().await, "Failed to load techniques");
            render::listing(&panel.search().snapshot());
        }
    }

    async fn login(&mut self, email: &str) -> anyhow::Result<()> {
        if let Some(current) = self.console.access().email() {
            render::warning(&format!("Already signed in as {}. Use 'logout' first.", current));
            return Ok(());
        }

        let Some(password) = self.read_secret("password: ")? else {
            return Ok(());
        };

        if let Err(err) = self.console.sign_in(email, &password).await {
            render::failure(&err.user_message("Sign-in failed"));
            return Ok(());
        }

        let settled = timeout(
            SETTLE_TIMEOUT,
            self.console
                .wait_for(|state| state.is_settled() && state.email().is_some()),
        )
        .await;

        match settled {
            Ok(state) => {
                render::access(&state);
                self.open_listing().await;
            }
            Err(_) => render::warning("Signed in, but roles are still being checked. Try 'status'."),
        }
        Ok(())
    }

    async fn logout(&self) {
        match self.console.sign_out().await {
            Ok(()) => render::success("Signed out."),
            Err(err) => render::failure(&err.user_message("Sign-out failed")),
        }
    }

    /// Fills the form, previews the change and submits until saved or abandoned.
    ///
    /// A rejected save keeps the working copy, so the retry starts from what
    /// was typed rather than from the stored record.
    async fn edit(&mut self, panel: &TechniquePanel, mut editor: TechniqueEditor) -> anyhow::Result<()> {
        loop {
            if !form::fill(&mut self.rl, &mut editor.draft)? {
                render::warning("Discarded.");
                return Ok(());
            }

            if let EditorMode::Edit { .. } = editor.mode() {
                let changed = form::changed_fields(editor.original(), &editor.draft);
                if changed.is_empty() {
                    render::info("No changes.");
                    return Ok(());
                }
                render::info(&format!("Changed: {}", changed.join(", ")));
            }

            if !self.confirm("Save? [y/N] ")? {
                render::warning("Discarded.");
                return Ok(());
            }

            match panel.save(&mut editor).await {
                Ok(()) => {
                    render::success("Saved.");
                    render::listing(&panel.search().snapshot());
                    return Ok(());
                }
                Err(err) => {
                    let message = editor
                        .error()
                        .map(str::to_string)
                        .unwrap_or_else(|| err.to_string());
                    render::failure(&message);
                    if !self.confirm("Edit and retry? [y/N] ")? {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn delete(&mut self, panel: &TechniquePanel, technique: &Technique) -> anyhow::Result<()> {
        if !self.confirm(&format!("Delete '{}'? [y/N] ", technique.name))? {
            return Ok(());
        }

        match panel.delete(&technique.id).await {
            Ok(()) => {
                render::success("Deleted.");
                render::listing(&panel.search().snapshot());
            }
            Err(err) => render::failure(&err.user_message("Failed to delete technique")),
        }
        Ok(())
    }

    fn confirm(&mut self, prompt: &str) -> rustyline::Result<bool> {
        match self.rl.readline(prompt) {
            Ok(answer) => Ok(matches!(answer.trim(), "y" | "Y" | "yes")),
            Err(ReadlineError::Interrupted) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn read_secret(&mut self, prompt: &str) -> rustyline::Result<Option<String>> {
        set_masking(&mut self.rl, true);
        let answer = self.rl.readline(prompt);
        set_masking(&mut self.rl, false);

        match answer {
            Ok(secret) => Ok(Some(secret)),
            Err(ReadlineError::Interrupted) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

fn set_masking(rl: &mut LineEditor, masking: bool) {
    if let Some(helper) = rl.helper_mut() {
        helper.masking = masking;
    }
}

fn report(result: Result<(), AdminError>, fallback: &str) {
    if let Err(err) = result {
        tracing::debug!("[Repl] {}: {}", fallback, err);
    }
}

/// Looks a technique up in the loaded listing.
fn find(panel: &TechniquePanel, target: &Target) -> Option<Technique> {
    let state = panel.search().snapshot();
    let found = match target {
        Target::Index(position) => state.items.get(position - 1),
        Target::Id(id) => state.items.iter().find(|technique| technique.id == *id),
    };

    if found.is_none() {
        render::warning("No such technique in the current listing. Try 'list'.");
    }
    found.cloned()
}
