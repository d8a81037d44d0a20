//! Line-oriented terminal renderer and input loop.
//!
//! Draws the view document as plain text and maps typed commands onto the
//! same component operations the buttons and form drive.

use crate::config::UiVariant;
use crate::ui::Frontend;
use crate::ui::view::{Document, ElementId};
use std::fmt::Write as _;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Editable form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Callsign,
    Grid,
    WinlinkPasswd,
}

impl FormField {
    fn element(self) -> ElementId {
        match self {
            Self::Callsign => ElementId::Callsign,
            Self::Grid => ElementId::Grid,
            Self::WinlinkPasswd => ElementId::WinlinkPasswd,
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "callsign" | "call" => Some(Self::Callsign),
            "grid" => Some(Self::Grid),
            "password" | "passwd" | "winlinkpasswd" => Some(Self::WinlinkPasswd),
            _ => None,
        }
    }
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCommand {
    Show,
    Help,
    Open,
    Cancel,
    Save,
    CalculateGrid,
    Set(FormField, String),
    /// One-based app button number.
    Launch(usize),
    SetMode(String),
    Refresh,
    Quit,
}

impl TerminalCommand {
    /// Parse an input line.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));
        match word.to_ascii_lowercase().as_str() {
            "" | "show" => Ok(Self::Show),
            "help" | "?" => Ok(Self::Help),
            "open" => Ok(Self::Open),
            "cancel" => Ok(Self::Cancel),
            "save" => Ok(Self::Save),
            "grid" | "calc" => Ok(Self::CalculateGrid),
            "refresh" => Ok(Self::Refresh),
            "quit" | "exit" => Ok(Self::Quit),
            "set" => {
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .map_or((rest, ""), |(f, v)| (f, v.trim()));
                let field = FormField::parse(field)
                    .ok_or_else(|| format!("unknown field `{field}`"))?;
                Ok(Self::Set(field, value.to_owned()))
            }
            "launch" | "app" => rest
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map(Self::Launch)
                .ok_or_else(|| "usage: launch <button number>".to_owned()),
            "mode" if !rest.is_empty() => Ok(Self::SetMode(rest.to_owned())),
            "mode" => Err("usage: mode <name>".to_owned()),
            other => Err(format!("unknown command `{other}` (try `help`)")),
        }
    }
}

const HELP: &str = "\
commands:
  show                    redraw the screen
  open                    open the user configuration dialog
  set <field> <value>     edit callsign, grid or password
  grid                    calculate the grid square
  save                    save the user configuration
  cancel                  close the dialog without saving
  launch <n>              press app button n
  mode <name>             switch the host mode
  refresh                 re-read mode and active radio
  quit                    exit
";

/// Render the document as text.
#[must_use]
pub fn render(doc: &Document, variant: UiVariant, buttons: &[String]) -> String {
    let value = |id: ElementId| {
        doc.get(id.dom_id(variant))
            .map_or("<missing>", |el| el.value.as_str())
            .trim_end()
            .to_owned()
    };
    let visible = |id: ElementId| doc.get(id.dom_id(variant)).is_some_and(|el| el.visible);

    let mut out = String::new();
    let _ = writeln!(out, "== Mode ==");
    let _ = writeln!(out, "Radio: {}", value(ElementId::RadioDisplay));
    let _ = writeln!(out, "Mode:  {}", value(ElementId::ModeDisplay));

    let form_shown = variant == UiVariant::Inline || visible(ElementId::ConfigDialog);
    if form_shown {
        let _ = writeln!(out, "== User Configuration ==");
        let _ = writeln!(out, "Callsign:         {}", value(ElementId::Callsign));
        let _ = writeln!(out, "Grid Square:      {}", value(ElementId::Grid));
        let masked = "*".repeat(value(ElementId::WinlinkPasswd).chars().count());
        let _ = writeln!(out, "Winlink Password: {masked}");
    }

    let _ = writeln!(out, "== Apps ==");
    for (n, label) in buttons.iter().enumerate() {
        let _ = writeln!(out, "[{}] {label}", n + 1);
    }

    if visible(ElementId::ConsoleContainer) {
        let _ = writeln!(out, "== Console Output ==");
        if let Some(el) = doc.get(ElementId::ConsoleOutput.dom_id(variant)) {
            for line in el.value.lines().skip(el.scroll_top).take(el.rows) {
                let _ = writeln!(out, "{line}");
            }
        }
    }
    out
}

/// Execute one command. Returns `false` when the loop should stop.
pub async fn execute(frontend: &Frontend, command: TerminalCommand) -> bool {
    match command {
        TerminalCommand::Show | TerminalCommand::Help => {}
        TerminalCommand::Open => {
            frontend.dialog().open().await;
        }
        TerminalCommand::Cancel => {
            frontend.dialog().cancel();
        }
        TerminalCommand::Save => {
            frontend.dialog().submit().await;
        }
        TerminalCommand::CalculateGrid => {
            frontend.dialog().calculate_grid().await;
        }
        TerminalCommand::Set(field, value) => {
            if frontend.dialog().is_interactive() {
                frontend.view().element(field.element()).set(&value);
            } else {
                frontend
                    .console()
                    .append("Open the user configuration before editing it");
            }
        }
        TerminalCommand::Launch(number) => {
            // Launches run in the background like button clicks.
            let launcher = frontend.launcher().clone();
            frontend.spawn(async move {
                launcher.press(number - 1).await;
            });
        }
        TerminalCommand::SetMode(mode) => {
            frontend.mode().set_mode(&mode).await;
        }
        TerminalCommand::Refresh => {
            tokio::join!(frontend.mode().refresh(), frontend.radio().refresh());
        }
        TerminalCommand::Quit => return false,
    }
    true
}

/// Read commands from `input` and redraw to `output` until EOF or `quit`.
pub async fn run<R, W>(frontend: &Frontend, input: R, mut output: W) -> crate::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let buttons: Vec<String> = frontend
        .launcher()
        .buttons()
        .iter()
        .map(|b| b.label.clone())
        .collect();
    let variant = frontend.view().variant();
    let mut lines = input.lines();

    loop {
        let screen = render(&frontend.view().snapshot(), variant, &buttons);
        output.write_all(screen.as_bytes()).await?;
        output.write_all(b"> ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match TerminalCommand::parse(&line) {
            Ok(TerminalCommand::Help) => output.write_all(HELP.as_bytes()).await?,
            Ok(command) => {
                if !execute(frontend, command).await {
                    break;
                }
            }
            Err(message) => {
                output.write_all(message.as_bytes()).await?;
                output.write_all(b"\n").await?;
            }
        }
    }
    Ok(())
}
