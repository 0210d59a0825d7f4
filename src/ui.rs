// UI layer: an interactive menu built with `dialoguer`. Each menu entry
// collects input, builds an envelope and hands it to the API clients.
// Console I/O and menu state live here; the clients never prompt.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use crossterm::style::Stylize;
use dialoguer::{Confirm, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::info;

use crate::api::{
    blocking, session_key_from_login, Envelope, FolderCategory, InitiateRequest, ProcessVariable,
    UploadedFileRef,
};
use crate::config::Settings;

/// Which client form carries the next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Sync,
    Async,
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sync => "sync",
            Self::Async => "async",
        })
    }
}

type Handler = fn(&mut Shell) -> Result<()>;

struct MenuEntry {
    label: &'static str,
    handler: Handler,
}

struct MenuGroup {
    label: &'static str,
    entries: &'static [MenuEntry],
}

const MENU: &[MenuGroup] = &[
    MenuGroup {
        label: "Authentication",
        entries: &[
            MenuEntry { label: "Login", handler: Shell::login },
            MenuEntry { label: "Logout", handler: Shell::logout },
        ],
    },
    MenuGroup {
        label: "Comment",
        entries: &[
            MenuEntry { label: "List", handler: Shell::comment_list },
            MenuEntry { label: "Put", handler: Shell::comment_put },
            MenuEntry { label: "Delete", handler: Shell::comment_delete },
        ],
    },
    MenuGroup {
        label: "File",
        entries: &[MenuEntry { label: "Put", handler: Shell::file_put }],
    },
    MenuGroup {
        label: "Folder",
        entries: &[
            MenuEntry { label: "Get", handler: Shell::folder_get },
            MenuEntry { label: "List", handler: Shell::folder_list },
        ],
    },
    MenuGroup {
        label: "Process Definition",
        entries: &[
            MenuEntry { label: "Get", handler: Shell::process_definition_get },
            MenuEntry { label: "List", handler: Shell::process_definition_list },
            MenuEntry { label: "Initiate", handler: Shell::process_definition_initiate },
        ],
    },
    MenuGroup {
        label: "Switch request mode",
        entries: &[
            MenuEntry { label: "Sync", handler: Shell::use_sync },
            MenuEntry { label: "Async", handler: Shell::use_async },
        ],
    },
];

/// Interactive shell owning the session-bearing clients.
pub struct Shell {
    settings: Settings,
    transport: blocking::TransportClient,
    uploader: blocking::UploadClient,
    mode: RequestMode,
}

impl Shell {
    pub fn new(settings: Settings) -> Result<Self> {
        let options = settings.http_options();
        let transport = blocking::TransportClient::new(
            settings.network.endpoint.clone(),
            settings.cipher()?,
            &options,
        )?;
        let uploader = blocking::UploadClient::new(&options)?;
        Ok(Self {
            settings,
            transport,
            uploader,
            mode: RequestMode::Sync,
        })
    }

    /// Main menu loop. Returns when the user picks "Exit".
    pub fn run(&mut self) -> Result<()> {
        println!("{}", "=== BizFlow REST API Runner ===".cyan().bold());
        loop {
            let mut items: Vec<&str> = MENU.iter().map(|g| g.label).collect();
            items.push("Exit");
            let prompt = format!("Main menu [{}]", self.mode);
            let choice = Select::new().with_prompt(prompt).items(&items).default(0).interact()?;
            match MENU.get(choice) {
                Some(group) => self.submenu(group)?,
                None => break,
            }
        }
        Ok(())
    }

    fn submenu(&mut self, group: &MenuGroup) -> Result<()> {
        let mut items: Vec<&str> = group.entries.iter().map(|e| e.label).collect();
        items.push("Back");
        let choice = Select::new().with_prompt(group.label).items(&items).default(0).interact()?;
        if let Some(entry) = group.entries.get(choice) {
            if let Err(e) = (entry.handler)(self) {
                println!("{}", format!("{} {} failed: {:#}", group.label, entry.label, e).red());
            }
        }
        Ok(())
    }

    fn use_sync(&mut self) -> Result<()> {
        self.mode = RequestMode::Sync;
        Ok(())
    }

    fn use_async(&mut self) -> Result<()> {
        self.mode = RequestMode::Async;
        Ok(())
    }

    /// Send `envelope` through the client form the current mode selects.
    fn call(&self, operation: &str, envelope: &Envelope) -> Result<String> {
        info!(operation, mode = %self.mode, "calling API");
        let spinner = spinner(format!("{operation} ({})", self.mode));
        let result = match self.mode {
            RequestMode::Sync => {
                spinner.enable_steady_tick(Duration::from_millis(100));
                self.transport.send(envelope)
            }
            RequestMode::Async => self
                .transport
                .block_on(tick_while(&spinner, self.transport.get_ref().send(envelope))),
        };
        spinner.finish_and_clear();
        let body = result?;
        print_response(&body);
        Ok(body)
    }

    fn upload(&self, path: &Path) -> Result<Vec<UploadedFileRef>> {
        let endpoint = self.settings.network.endpoint_file_upload.as_str();
        if endpoint.is_empty() {
            bail!("network.endpoint_file_upload is not configured");
        }
        let session = self.transport.session();
        let token = session.token().unwrap_or_default();

        let spinner = spinner(format!("Uploading {} ({})", path.display(), self.mode));
        let result = match self.mode {
            RequestMode::Sync => {
                spinner.enable_steady_tick(Duration::from_millis(100));
                self.uploader.upload(endpoint, token, path)
            }
            RequestMode::Async => self.uploader.block_on(tick_while(
                &spinner,
                self.uploader.get_ref().upload(endpoint, token, path),
            )),
        };
        spinner.finish_and_clear();
        let files = result?;
        for file in &files {
            println!(
                "{}",
                format!("uploaded {} ({} bytes) as {}", file.name, file.size, file.file_id).green()
            );
        }
        Ok(files)
    }

    fn ensure_login(&mut self) -> Result<()> {
        if !self.transport.session().is_authenticated() {
            println!("Please login first.");
            self.login()?;
        }
        Ok(())
    }

    fn login(&mut self) -> Result<()> {
        let defaults = self.settings.authentication.clone();
        let login_id: String = Input::new()
            .with_prompt("Login id")
            .default(defaults.login_id)
            .interact_text()?;
        let password = Password::new()
            .with_prompt("Password (empty for configured default)")
            .allow_empty_password(true)
            .interact()?;
        let password = if password.is_empty() { defaults.password } else { password };

        // Never mix identities: drop the previous token and cookie first.
        self.transport.reset_session();
        let body = self.call("authentication.login", &Envelope::login(&login_id, &password))?;

        match session_key_from_login(&body)? {
            Some(key) => {
                self.transport.set_session_token(key);
                println!("{}", format!("Logged in as {login_id}").green());
            }
            None => println!("{}", "Login did not return a session key.".yellow()),
        }
        Ok(())
    }

    fn logout(&mut self) -> Result<()> {
        self.call("authentication.logout", &Envelope::logout(false))?;
        self.transport.reset_session();
        Ok(())
    }

    fn comment_list(&mut self) -> Result<()> {
        self.ensure_login()?;
        let process_id = prompt_id("Process id")?;
        self.call("comment.list", &Envelope::comment_list(process_id))?;
        Ok(())
    }

    fn comment_put(&mut self) -> Result<()> {
        self.ensure_login()?;
        let process_id = prompt_id("Process id")?;
        let workitem_seq = prompt_id("Workitem sequence")?;
        let comment_id: i64 = Input::new()
            .with_prompt("Comment id (0 adds a new comment)")
            .default(0)
            .interact_text()?;
        let text: String = Input::new().with_prompt("Comment text").interact_text()?;
        self.call(
            "comment.put",
            &Envelope::comment_put(process_id, workitem_seq, comment_id, &text),
        )?;
        Ok(())
    }

    fn comment_delete(&mut self) -> Result<()> {
        self.ensure_login()?;
        let process_id = prompt_id("Process id")?;
        let comment_id = prompt_id("Comment id")?;
        self.call("comment.delete", &Envelope::comment_delete(process_id, comment_id))?;
        Ok(())
    }

    fn file_put(&mut self) -> Result<()> {
        self.ensure_login()?;
        let path: String = Input::new().with_prompt("File path").interact_text()?;
        self.upload(Path::new(&path))?;
        Ok(())
    }

    fn folder_get(&mut self) -> Result<()> {
        self.ensure_login()?;
        let id = prompt_id("Folder id")?;
        self.call("folder.get", &Envelope::folder_get(id))?;
        Ok(())
    }

    fn folder_list(&mut self) -> Result<()> {
        self.ensure_login()?;
        let names: Vec<&str> = FolderCategory::ALL.iter().map(|c| c.as_str()).collect();
        let choice = Select::new()
            .with_prompt("Folder category")
            .items(&names)
            .default(0)
            .interact()?;
        let project_id: i64 = Input::new()
            .with_prompt("Project folder id (0 for none)")
            .default(0)
            .interact_text()?;
        self.call(
            "folder.list",
            &Envelope::folder_list(FolderCategory::ALL[choice], project_id),
        )?;
        Ok(())
    }

    fn process_definition_get(&mut self) -> Result<()> {
        self.ensure_login()?;
        let id = prompt_id("Process definition id")?;
        self.call("process_definition.get", &Envelope::process_definition_get(id))?;
        Ok(())
    }

    fn process_definition_list(&mut self) -> Result<()> {
        self.ensure_login()?;
        let folder_id = prompt_id("Process definition folder id")?;
        self.call(
            "process_definition.list",
            &Envelope::process_definition_list(folder_id),
        )?;
        Ok(())
    }

    fn process_definition_initiate(&mut self) -> Result<()> {
        self.ensure_login()?;
        let process_definition_id = prompt_id("Process definition id")?;
        let return_workitem_info = Confirm::new()
            .with_prompt("Include work item information in the response?")
            .default(true)
            .interact()?;
        let description: String = Input::new().with_prompt("Description").interact_text()?;
        let start_activity_name: String = Input::new()
            .with_prompt("Start activity name (empty for default)")
            .allow_empty(true)
            .interact_text()?;

        let mut variables: Vec<ProcessVariable> = Vec::new();
        while Confirm::new()
            .with_prompt("Add a process variable?")
            .default(false)
            .interact()?
        {
            let name: String = Input::new().with_prompt("Variable name").interact_text()?;
            let value: String = Input::new()
                .with_prompt("Variable value")
                .allow_empty(true)
                .interact_text()?;
            match variables.iter_mut().find(|v| v.name == name) {
                Some(existing) => existing.value = value,
                None => variables.push(ProcessVariable { name, value }),
            }
        }

        let mut attachments = Vec::new();
        loop {
            let path: String = Input::new()
                .with_prompt("File path to attach (empty to finish)")
                .allow_empty(true)
                .interact_text()?;
            if path.trim().is_empty() {
                break;
            }
            attachments.extend(self.upload(Path::new(path.trim()))?);
        }

        let request = InitiateRequest {
            process_definition_id,
            return_workitem_info,
            start_activity_name: Some(start_activity_name),
            description: Some(description),
            variables,
            attachments,
        };
        self.call(
            "process_definition.initiate",
            &Envelope::process_definition_initiate(&request),
        )?;
        Ok(())
    }
}

fn prompt_id(prompt: &str) -> Result<i64> {
    Ok(Input::new().with_prompt(prompt).interact_text()?)
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner
}

/// Drive `future` while ticking `spinner`, keeping the console live.
async fn tick_while<F: Future>(spinner: &ProgressBar, future: F) -> F::Output {
    tokio::pin!(future);
    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    loop {
        tokio::select! {
            output = &mut future => return output,
            _ = ticker.tick() => spinner.tick(),
        }
    }
}

/// Print a response body, pretty-printed when it is JSON.
fn print_response(body: &str) {
    let pretty = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| body.to_string());
    println!("{}", pretty.green());
}
