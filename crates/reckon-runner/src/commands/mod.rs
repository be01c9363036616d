use crate::error::CliError;
use crate::session::{JsonSessionStore, SessionStore};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets, Attribute, Cell, Color, Table};
use indicatif::{ProgressBar, ProgressStyle};
use reckon_client::http::HttpPlatform;
use reckon_client::{Client, ClientEvent, Workspace};
use reckon_core::config::Config;
use reckon_core::model::WorkflowStatus;
use std::future::Future;
use std::sync::{mpsc, Arc};
use std::thread;

pub mod history;
pub mod patch;
pub mod prices;
pub mod stats;
pub mod status;
pub mod submissions;
pub mod wait;
pub mod workspace;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

pub struct AppContext {
    pub workspace: Workspace,
    pub client: Client,
    pub runtime: Arc<tokio::runtime::Runtime>,
}

impl AppContext {
    /// Resolves the workspace and connects to the platform.
    pub fn connect(
        workspace: Option<&str>,
        config: &Config,
        store: &JsonSessionStore,
    ) -> Result<Self, CliError> {
        let raw = workspace.ok_or(CliError::MissingWorkspace)?;
        let workspace = store.load()?.resolve_workspace(raw)?;
        let api = HttpPlatform::from_config(&config.platform)?;
        let client = Client::new(Arc::new(api), config)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        tracing::debug!("Connected to {} for workspace {}", config.platform.base_url, workspace);
        Ok(Self {
            workspace,
            client,
            runtime: Arc::new(runtime),
        })
    }

    /// Runs `work` on a worker thread and renders its progress events until it finishes.
    pub fn with_progress<T, F, Fut>(&self, work: F) -> Result<T, CliError>
    where
        F: FnOnce(Client, Workspace) -> Fut + Send + 'static,
        Fut: Future<Output = reckon_client::error::Result<T>>,
        T: Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let client = self.client.clone().with_events(tx);
        let workspace = self.workspace.clone();
        let runtime = Arc::clone(&self.runtime);
        let worker = thread::spawn(move || runtime.block_on(work(client, workspace)));

        let mut progress = Progress::default();
        for event in rx {
            progress.handle(event);
        }
        progress.clear();

        match worker.join() {
            Ok(result) => Ok(result?),
            Err(_) => Err(CliError::WorkerPanicked),
        }
    }
}

#[derive(Default)]
struct Progress {
    bar: Option<ProgressBar>,
}

impl Progress {
    fn start(&mut self, total: usize, message: &'static str) {
        self.clear();
        if total == 0 {
            return;
        }
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(message);
        self.bar = Some(bar);
    }

    fn tick(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn println(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{}", line),
        }
    }

    fn handle(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::FetchingSubmissions { total } => {
                self.start(total, "Fetching submissions...")
            }
            ClientEvent::FetchingMetadata { total } => {
                self.start(total, "Fetching execution metadata...")
            }
            ClientEvent::WritingAttributes { total } => self.start(total, "Writing attributes..."),
            ClientEvent::SubmissionFetched | ClientEvent::MetadataFetched { .. } => self.tick(),
            ClientEvent::AttributeWritten {
                entity_id,
                attribute,
                ok,
            } => {
                self.tick();
                if !ok {
                    self.println(format!("  FAIL {}.{}", entity_id, attribute));
                }
            }
            ClientEvent::Polled {
                poll,
                pending,
                total,
            } => {
                self.println(format!(
                    "  --- poll {}: {}/{} workflows still active",
                    poll, pending, total
                ));
            }
        }
    }
}

pub(crate) fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold).fg(Color::Cyan)),
        );
    table
}

pub(crate) fn status_cell(status: WorkflowStatus) -> Cell {
    let cell = Cell::new(status.as_str());
    match status {
        WorkflowStatus::Succeeded => cell.fg(Color::Green),
        WorkflowStatus::Failed => cell.fg(Color::Red),
        WorkflowStatus::Aborted => cell.fg(Color::Magenta),
        WorkflowStatus::Running => cell.fg(Color::Yellow),
        WorkflowStatus::Submitted | WorkflowStatus::Queued => cell.fg(Color::DarkGrey),
    }
}

pub(crate) fn hours(value: f64) -> String {
    format!("{:.2}", value)
}

pub(crate) fn money(value: f64, currency: &str) -> String {
    format!("{:.2} {}", value, currency)
}

pub(crate) fn save_session<F>(store: &dyn SessionStore, update: F) -> Result<(), CliError>
where
    F: FnOnce(&mut crate::session::Session),
{
    let mut session = store.load()?;
    update(&mut session);
    store.save(&session)
}
