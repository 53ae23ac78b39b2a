use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use pagecraft_editor::{
    DirectorySink, DirectorySource, EditorError, EditorSession, Field, FieldValues, LoadOutcome,
    MutationOutcome, NodePath, SitePath,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

#[derive(Debug, Args)]
pub struct ConsoleArgs {
    /// Read commands from a file instead of stdin
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// Site directory (overrides config)
    #[arg(long)]
    pub source: Option<String>,

    /// Directory for downloads and exports (overrides config)
    #[arg(short, long)]
    pub out_dir: Option<String>,
}

const HELP: &str = "\
pages | components              list known paths
add-page PATH | add-component PATH
new-page PATH                   create a blank page in the buffer
load PATH | save | revert
download | export [assets]
edit on|off | select-mode on|off
select NODE|none | hover NODE|none | crumbs
inspect | set FIELD VALUE       FIELD is tag, text or an attribute
delete | insert TAG | wrap | up | down | duplicate
image SRC | component PATH | viewport full|WIDTH
head [MARKUP]                   show or replace head markup
undo | redo | preview | help | quit";

/// Malformed console input
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("{command} needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("Invalid argument for {command}: {value}")]
    InvalidArgument { command: &'static str, value: String },
}

/// One console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Pages,
    Components,
    AddPage(String),
    AddComponent(String),
    NewPage(String),
    Load(String),
    Save,
    Revert,
    Download,
    Export { assets: bool },
    Edit(bool),
    SelectMode(bool),
    Select(Option<NodePath>),
    Hover(Option<NodePath>),
    Crumbs,
    Inspect,
    Set { field: Field, value: String },
    Delete,
    Insert(String),
    Wrap,
    MoveUp,
    MoveDown,
    Duplicate,
    Image(String),
    Component(String),
    Viewport(String),
    Head(Option<String>),
    Undo,
    Redo,
    Preview,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Parse one line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let rest = (!rest.is_empty()).then_some(rest);

        let command = match name {
            "pages" => Self::Pages,
            "components" => Self::Components,
            "add-page" => Self::AddPage(required("add-page", "a path", rest)?),
            "add-component" => Self::AddComponent(required("add-component", "a path", rest)?),
            "new-page" => Self::NewPage(required("new-page", "a path", rest)?),
            "load" => Self::Load(required("load", "a path", rest)?),
            "save" => Self::Save,
            "revert" => Self::Revert,
            "download" => Self::Download,
            "export" => match rest {
                None => Self::Export { assets: false },
                Some("assets") => Self::Export { assets: true },
                Some(other) => return Err(invalid("export", other)),
            },
            "edit" => Self::Edit(switch("edit", rest)?),
            "select-mode" => Self::SelectMode(switch("select-mode", rest)?),
            "select" => Self::Select(node_target("select", rest)?),
            "hover" => Self::Hover(node_target("hover", rest)?),
            "crumbs" => Self::Crumbs,
            "inspect" => Self::Inspect,
            "set" => {
                let rest = required("set", "a field and a value", rest)?;
                let (field, value) = match rest.split_once(char::is_whitespace) {
                    Some((field, value)) => (field, value.trim()),
                    None => (rest.as_str(), ""),
                };
                Self::Set {
                    field: parse_field(field),
                    value: value.to_string(),
                }
            }
            "delete" => Self::Delete,
            "insert" => Self::Insert(required("insert", "a tag name", rest)?),
            "wrap" => Self::Wrap,
            "up" => Self::MoveUp,
            "down" => Self::MoveDown,
            "duplicate" => Self::Duplicate,
            "image" => Self::Image(required("image", "a source path", rest)?),
            "component" => Self::Component(required("component", "a path", rest)?),
            "viewport" => Self::Viewport(required("viewport", "a width", rest)?),
            "head" => Self::Head(rest.map(str::to_string)),
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            "preview" => Self::Preview,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn required(
    command: &'static str,
    argument: &'static str,
    rest: Option<&str>,
) -> Result<String, CommandError> {
    rest.map(str::to_string)
        .ok_or(CommandError::MissingArgument { command, argument })
}

fn invalid(command: &'static str, value: &str) -> CommandError {
    CommandError::InvalidArgument {
        command,
        value: value.to_string(),
    }
}

fn switch(command: &'static str, rest: Option<&str>) -> Result<bool, CommandError> {
    match rest {
        Some("on") => Ok(true),
        Some("off") => Ok(false),
        Some(other) => Err(invalid(command, other)),
        None => Err(CommandError::MissingArgument {
            command,
            argument: "on or off",
        }),
    }
}

fn node_target(command: &'static str, rest: Option<&str>) -> Result<Option<NodePath>, CommandError> {
    match rest {
        None | Some("none") => Ok(None),
        Some(raw) => raw
            .parse::<NodePath>()
            .map(Some)
            .map_err(|_| invalid(command, raw)),
    }
}

fn parse_field(name: &str) -> Field {
    match name {
        "tag" => Field::Tag,
        "text" => Field::Text,
        attribute => Field::attribute(attribute),
    }
}

/// What the console shows after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Transient status line
    Status(String),
    /// Multi-line output printed verbatim
    Output(String),
    Quit,
}

/// A session bound to a site directory and an output directory
pub struct Console {
    session: EditorSession,
    sink: DirectorySink,
}

impl Console {
    pub fn new(session: EditorSession, sink: DirectorySink) -> Self {
        Self { session, sink }
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub async fn execute(&mut self, command: ConsoleCommand) -> Result<Reply, EditorError> {
        let session = &mut self.session;
        let reply = match command {
            ConsoleCommand::Pages => Reply::Output(list(session.pages())),
            ConsoleCommand::Components => Reply::Output(list(session.components())),
            ConsoleCommand::AddPage(raw) => {
                let path = session.add_page_path(&raw)?;
                Reply::Status(format!("Added page {path}"))
            }
            ConsoleCommand::AddComponent(raw) => {
                let path = session.add_component_path(&raw)?;
                Reply::Status(format!("Added component {path}"))
            }
            ConsoleCommand::NewPage(raw) => {
                let path = session.create_page(&raw)?;
                Reply::Status(format!("Created {path} in buffer"))
            }
            ConsoleCommand::Load(raw) => {
                let path = SitePath::new(&raw)?;
                loaded(&path, session.load(&path).await?)
            }
            ConsoleCommand::Save => {
                session.save()?;
                Reply::Status("Saved to buffer".to_string())
            }
            ConsoleCommand::Revert => {
                let outcome = session.revert().await?;
                match session.current_path() {
                    Some(path) => loaded(path, outcome),
                    None => Reply::Status("Reverted".to_string()),
                }
            }
            ConsoleCommand::Download => {
                let file_name = session.download_page_to(&self.sink).await?;
                Reply::Status(format!("Downloaded {file_name}"))
            }
            ConsoleCommand::Export { assets } => {
                let bundle = session.export_to(&self.sink, assets).await?;
                for warning in &bundle.warnings {
                    tracing::warn!("{warning}");
                }
                Reply::Status(format!(
                    "Exported {} pages, {} assets",
                    bundle.documents.len(),
                    bundle.assets.len()
                ))
            }
            ConsoleCommand::Edit(on) => {
                session.set_editable(on);
                Reply::Status(format!("Edit mode {}", on_off(on)))
            }
            ConsoleCommand::SelectMode(on) => {
                session.set_select_mode(on);
                Reply::Status(format!("Select mode {}", on_off(on)))
            }
            ConsoleCommand::Select(target) => {
                session.select(target.as_ref())?;
                match session.breadcrumbs().last() {
                    Some(crumb) => Reply::Status(format!("Selected {}", crumb.label)),
                    None => Reply::Status("Selection cleared".to_string()),
                }
            }
            ConsoleCommand::Hover(target) => {
                session.hover(target.as_ref())?;
                Reply::Status(String::new())
            }
            ConsoleCommand::Crumbs => Reply::Output(
                session
                    .breadcrumbs()
                    .iter()
                    .map(|crumb| format!("{} ({})", crumb.label, crumb.path))
                    .collect::<Vec<_>>()
                    .join(" > "),
            ),
            ConsoleCommand::Inspect => Reply::Output(
                session
                    .inspect()?
                    .iter()
                    .map(|field| format!("{}: {}", field.field.label(), field.value))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            ConsoleCommand::Set { field, value } => {
                let mut values = FieldValues::from(session.inspect()?);
                values.set(field, value);
                applied(session.apply_inspector(values)?, "Applied changes")
            }
            ConsoleCommand::Delete => applied(session.delete_selected()?, "Deleted element"),
            ConsoleCommand::Insert(tag) => {
                applied(session.insert_element(&tag)?, &format!("Inserted <{}>", tag.trim()))
            }
            ConsoleCommand::Wrap => applied(session.wrap_selected()?, "Wrapped in <div>"),
            ConsoleCommand::MoveUp => applied(session.move_up()?, "Moved up"),
            ConsoleCommand::MoveDown => applied(session.move_down()?, "Moved down"),
            ConsoleCommand::Duplicate => applied(session.duplicate()?, "Duplicated element"),
            ConsoleCommand::Image(src) => {
                applied(session.apply_asset_to_image(&src)?, "Image source updated")
            }
            ConsoleCommand::Component(raw) => applied(
                session.insert_component(&raw).await?,
                &format!("Inserted component {raw}"),
            ),
            ConsoleCommand::Viewport(raw) => {
                let viewport = session.set_viewport(&raw)?;
                Reply::Status(format!("Viewport {viewport}"))
            }
            ConsoleCommand::Head(None) => Reply::Output(session.head_markup()?),
            ConsoleCommand::Head(Some(markup)) => {
                applied(session.edit_head(&markup)?, "Head updated")
            }
            ConsoleCommand::Undo => {
                session.undo()?;
                Reply::Status("Undone".to_string())
            }
            ConsoleCommand::Redo => {
                session.redo()?;
                Reply::Status("Redone".to_string())
            }
            ConsoleCommand::Preview => Reply::Output(session.preview()?),
            ConsoleCommand::Help => Reply::Output(HELP.to_string()),
            ConsoleCommand::Quit => Reply::Quit,
        };
        Ok(reply)
    }

    /// Run commands from `input` until it ends or `quit`.
    ///
    /// Bad commands and failed operations are reported and the console
    /// carries on.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R, prompt: bool) -> Result<()> {
        let mut lines = input.lines();
        loop {
            if prompt {
                print!("{} ", ">".bright_blue());
                std::io::stdout().flush()?;
            }
            let Some(line) = lines.next_line().await? else {
                break;
            };
            let command = match ConsoleCommand::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    println!("{} {}", "✗".red(), e);
                    continue;
                }
            };
            match self.execute(command).await {
                Ok(Reply::Quit) => break,
                Ok(Reply::Status(status)) if status.is_empty() => {}
                Ok(Reply::Status(status)) => println!("{} {}", "✓".green(), status),
                Ok(Reply::Output(output)) => println!("{output}"),
                Err(e) => println!("{} {}", "✗".red(), e),
            }
        }
        Ok(())
    }
}

fn list(paths: Vec<SitePath>) -> String {
    paths
        .iter()
        .map(SitePath::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

fn loaded(path: &SitePath, outcome: LoadOutcome) -> Reply {
    match outcome {
        LoadOutcome::Applied => Reply::Status(format!("Loaded {path}")),
        LoadOutcome::Superseded => Reply::Status(format!("Load of {path} superseded")),
    }
}

fn applied(outcome: MutationOutcome, status: &str) -> Reply {
    match outcome {
        MutationOutcome::Applied => Reply::Status(status.to_string()),
        MutationOutcome::Unchanged => Reply::Status("Nothing changed".to_string()),
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

pub async fn console(args: ConsoleArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let source_root = config.get_source_root(cwd, args.source.as_deref());
    if !source_root.is_dir() {
        return Err(anyhow!("Site directory does not exist: {:?}", source_root));
    }
    let out_dir = config.get_out_dir(cwd, args.out_dir.as_deref());

    let session = EditorSession::new(Arc::new(DirectorySource::new(&source_root)), config.editor);
    let mut console = Console::new(session, DirectorySink::new(out_dir));

    match args.script {
        Some(script) => {
            let file = tokio::fs::File::open(&script)
                .await
                .map_err(|e| anyhow!("Cannot open {}: {}", script.display(), e))?;
            console.run(BufReader::new(file), false).await
        }
        None => {
            println!(
                "{} {} (type {} for commands)",
                "Pagecraft console".bright_blue().bold(),
                source_root.display(),
                "help".bright_white()
            );
            console.run(BufReader::new(tokio::io::stdin()), true).await
        }
    }
}
