//! CLI command definitions, routing, and tracing setup.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::oneshot;
use tracing::info;

use flowsmith_generator::CompletionClient;
use flowsmith_insertion::{
    CopyTarget, HostCapabilities, InsertionOutcome, ModalHost, PreviewHandle, SurfaceRegistry,
};
use flowsmith_oauth::OAuthExchanger;
use flowsmith_server::AppState;
use flowsmith_shared::{
    AppConfig, CompletionSettings, ElementKind, GeneratedElement, GenerationRequest,
    OAuthExchangeRequest, OAuthSettings, config_file_path, init_config, load_config,
};

use crate::host::{StdoutDesigner, TerminalClipboard, TerminalModalHost};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Flowsmith: generate site elements from prompts and broker OAuth logins.
#[derive(Parser)]
#[command(
    name = "flowsmith",
    version,
    about = "Generate HTML/CSS site elements from prompts and exchange OAuth codes for tokens.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// How `generate` presents its result.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// `{html, css, elementType}` JSON.
    Json,
    /// HTML followed by a `<style>` block.
    Html,
    /// Element tree and CSS rules, as handed to a native designer API.
    Tree,
    /// Terminal preview with manual close and auto-dismiss.
    Preview,
}

/// Part of the element a preview copies to the clipboard.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum CopyPart {
    Html,
    Css,
}

impl From<CopyPart> for CopyTarget {
    fn from(part: CopyPart) -> Self {
        match part {
            CopyPart::Html => CopyTarget::Html,
            CopyPart::Css => CopyTarget::Css,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the HTTP API.
    Serve {
        /// Address to bind (overrides `[server] bind`).
        #[arg(long)]
        bind: Option<String>,
    },

    /// Generate one element from a prompt.
    Generate {
        /// Free-text description of the element.
        prompt: String,

        /// Element kind: button, header, card, form, or generic.
        #[arg(short, long)]
        kind: Option<String>,

        /// Output format.
        #[arg(short, long, value_enum, default_value = "json")]
        output: OutputFormat,

        /// With `--output preview`, copy this part to the terminal clipboard.
        #[arg(long, value_enum)]
        copy: Option<CopyPart>,
    },

    /// Exchange an OAuth authorization code for an access token.
    Exchange {
        /// Authorization code from the provider redirect.
        #[arg(long)]
        code: String,

        /// Opaque state value, echoed back as the site id.
        #[arg(long)]
        state: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "flowsmith=info",
        1 => "flowsmith=debug,tower_http=debug",
        _ => "flowsmith=trace,tower_http=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve { bind } => cmd_serve(bind).await,
        Command::Generate {
            prompt,
            kind,
            output,
            copy,
        } => cmd_generate(&prompt, kind.as_deref(), output, copy).await,
        Command::Exchange { code, state } => cmd_exchange(code, state).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_serve(bind: Option<String>) -> Result<()> {
    let mut config = load_config()?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    let state = AppState::from_config(&config)?;
    flowsmith_server::serve(state, &config.server).await?;
    Ok(())
}

async fn cmd_generate(
    prompt: &str,
    kind: Option<&str>,
    output: OutputFormat,
    copy: Option<CopyPart>,
) -> Result<()> {
    let config = load_config()?;

    let kind = match kind {
        Some(name) => Some(
            ElementKind::parse_lenient(name)
                .ok_or_else(|| eyre!("unknown element kind '{name}'"))?,
        ),
        None => None,
    };
    let request = GenerationRequest::new(prompt, kind)?;
    let client = CompletionClient::new(CompletionSettings::from(&config))?;

    info!(kind = ?request.kind(), "generating element");

    // The spinner stands in for the busy indicator while the request is in flight.
    let spinner = Spinner::start("Generating element...");
    let result = client.generate(&request).await;
    spinner.finish();
    let element = result?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&element)?),
        OutputFormat::Html => print_html(&element),
        OutputFormat::Tree => {
            let caps = HostCapabilities::default().with_designer(Arc::new(StdoutDesigner));
            SurfaceRegistry::new().insert(&element, &caps)?;
        }
        OutputFormat::Preview => {
            let timeout = Duration::from_secs(config.insertion.preview_timeout_secs);
            run_preview(&element, timeout, copy).await?;
        }
    }

    Ok(())
}

fn print_html(element: &GeneratedElement) {
    println!("{}", element.html);
    if !element.css.is_empty() {
        println!("<style>\n{}\n</style>", element.css);
    }
}

/// Show the preview and wait for Enter or the auto-dismiss timeout.
async fn run_preview(
    element: &GeneratedElement,
    timeout: Duration,
    copy: Option<CopyPart>,
) -> Result<()> {
    let host: Arc<dyn ModalHost> = Arc::new(TerminalModalHost);
    let handle = show_preview(element, timeout, host)?;

    if let Some(part) = copy {
        handle.modal().copy(part.into(), &TerminalClipboard::stdout())?;
        println!("  Copied {part:?} to the clipboard.");
    }

    println!(
        "  Press Enter to close (closes automatically in {}s).",
        timeout.as_secs()
    );

    await_close(&handle, read_enter()).await;
    Ok(())
}

fn show_preview(
    element: &GeneratedElement,
    timeout: Duration,
    host: Arc<dyn ModalHost>,
) -> Result<PreviewHandle> {
    let caps = HostCapabilities::default().with_modal_host(host);
    match SurfaceRegistry::with_preview_timeout(timeout).insert(element, &caps)? {
        InsertionOutcome::Previewed(handle) => Ok(handle),
        InsertionOutcome::Inserted { .. } => {
            Err(eyre!("expected a preview, got a native insertion"))
        }
    }
}

/// Wait until the user asks to close or the timer dismisses the preview.
/// A dropped sender means no close request will ever arrive.
async fn await_close(handle: &PreviewHandle, close_requested: oneshot::Receiver<()>) {
    tokio::select! {
        Ok(()) = close_requested => handle.close(),
        _ = wait_dismissed(handle) => {}
    }
}

/// Signal once a line is read from stdin.
///
/// The read runs on a detached thread rather than `tokio::io::stdin`, whose
/// blocking read would hold up runtime shutdown after the timer wins.
fn read_enter() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        // EOF (0 bytes) is not a keypress; leave the close to the timer.
        if matches!(std::io::stdin().read_line(&mut line), Ok(n) if n > 0) {
            let _ = tx.send(());
        }
    });
    rx
}

async fn wait_dismissed(handle: &PreviewHandle) {
    while !handle.is_dismissed() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

async fn cmd_exchange(code: String, state: Option<String>) -> Result<()> {
    let config = load_config()?;
    let exchanger = OAuthExchanger::new(OAuthSettings::from(&config))?;

    let request = OAuthExchangeRequest {
        code: Some(code),
        state,
    };

    let spinner = Spinner::start("Exchanging authorization code...");
    let result = exchanger.exchange(&request).await;
    spinner.finish();

    match result {
        Ok(token) => {
            println!("{}", serde_json::to_string_pretty(&token)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", serde_json::to_string_pretty(&e.to_body())?);
            Err(eyre!("token exchange failed with HTTP {}", e.status_code()))
        }
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Created config file at {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let path = config_file_path()?;

    println!("# {}", path.display());
    println!("{}", toml::to_string_pretty(&config)?);

    print_secret_status(&config);
    Ok(())
}

/// Report which secret env vars are set, never their values.
fn print_secret_status(config: &AppConfig) {
    let completion = CompletionSettings::from(config);
    let oauth = OAuthSettings::from(config);
    let missing = oauth.credentials().err().unwrap_or_default();

    println!("# secrets");
    println!(
        "# {} = {}",
        completion.api_key_env,
        if completion.api_key.is_some() { "set" } else { "unset" }
    );
    for name in &oauth.env_names {
        let status = if missing.contains(name) { "unset" } else { "set" };
        println!("# {name} = {status}");
    }
}

// ---------------------------------------------------------------------------
// Busy indicator
// ---------------------------------------------------------------------------

/// Spinner shown while a network request is in flight.
struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    fn start(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    fn finish(self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use flowsmith_insertion::{PreviewModal, Uuid};

    use super::*;

    #[derive(Default)]
    struct CountingHost {
        dismissed: Mutex<Vec<Uuid>>,
    }

    impl ModalHost for CountingHost {
        fn mount(&self, _modal: &PreviewModal) -> flowsmith_shared::Result<()> {
            Ok(())
        }

        fn dismiss(&self, id: Uuid) {
            self.dismissed.lock().unwrap().push(id);
        }
    }

    fn element() -> GeneratedElement {
        GeneratedElement {
            html: "<button class=\"fs-button\">Go</button>".into(),
            css: ".fs-button { padding: 12px; }".into(),
            kind: ElementKind::Button,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn preview_session_ends_on_timeout_without_input() {
        let host = Arc::new(CountingHost::default());
        let handle = show_preview(&element(), Duration::from_secs(10), host.clone()).unwrap();

        // Sender held open: no Enter ever arrives.
        let (_tx, rx) = oneshot::channel();
        tokio::time::timeout(Duration::from_secs(30), await_close(&handle, rx))
            .await
            .expect("session should end when the preview times out");

        assert!(handle.is_dismissed());
        assert_eq!(host.dismissed.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn enter_closes_preview_before_timeout() {
        let host = Arc::new(CountingHost::default());
        let handle = show_preview(&element(), Duration::from_secs(10), host.clone()).unwrap();

        let (tx, rx) = oneshot::channel();
        tx.send(()).unwrap();
        await_close(&handle, rx).await;
        tokio::time::sleep(Duration::from_secs(15)).await;

        assert_eq!(host.dismissed.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn preview_copies_selected_part() {
        let host = Arc::new(CountingHost::default());
        let handle = show_preview(&element(), Duration::from_secs(10), host).unwrap();

        let clipboard = TerminalClipboard::new(Vec::new());
        handle.modal().copy(CopyPart::Css.into(), &clipboard).unwrap();
        handle.close();

        let written = String::from_utf8(clipboard.into_inner()).unwrap();
        // ".fs-button { padding: 12px; }" in base64
        assert!(written.contains("LmZzLWJ1dHRvbiB7IHBhZGRpbmc6IDEycHg7IH0="));
    }

    #[tokio::test(start_paused = true)]
    async fn closed_input_leaves_close_to_timer() {
        let host = Arc::new(CountingHost::default());
        let handle = show_preview(&element(), Duration::from_secs(10), host.clone()).unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        drop(tx);
        await_close(&handle, rx).await;

        assert!(handle.is_dismissed());
        assert_eq!(host.dismissed.lock().unwrap().len(), 1);
    }
}
