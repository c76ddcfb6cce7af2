mod backend;
mod error;
mod popup;
mod quick_order;
mod render;
mod timer;

use anyhow::{Context, Result};
use backend::{Cart, Catalog, GraphqlBackend};
use clap::Parser;
use error::BackendError;
use popup::PopupWidget;
use quick_order::{QuickOrderWidget, SubmissionId};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use storewidgets_core::config::{Config, PopupConfig};
use storewidgets_core::contract::{self, HostEvent, LookupResponse, WidgetMsg};
use storewidgets_core::matcher::CurrentVariant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(
    name = "storewidgets",
    about = "Promo popup and quick order widgets driven by host events on stdin"
)]
struct Cli {
    /// Config file (defaults to the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the GraphQL endpoint from the config
    #[arg(long)]
    endpoint: Option<String>,
}

/// A backend call that finished on a spawned task.
#[derive(Debug)]
enum Settled {
    Lookup(SubmissionId, Result<LookupResponse, BackendError>),
    Cart(SubmissionId, Result<(), BackendError>),
}

/// Both widgets of one page view plus the host inputs they read.
struct Host<B> {
    popup_config: PopupConfig,
    variant: Option<i64>,
    popup: Option<PopupWidget>,
    order: QuickOrderWidget,
    backend: Arc<B>,
    settled_tx: mpsc::UnboundedSender<Settled>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("storewidgets=info".parse()?),
        )
        .init();

    info!("storewidgets starting");

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path).context("loading config")?,
        None => Config::load().context("loading config")?,
    };
    if let Some(endpoint) = cli.endpoint {
        config.backend.endpoint = endpoint;
    }
    info!(endpoint = %config.backend.endpoint, "backend configured");

    let backend = Arc::new(GraphqlBackend::new(&config.backend).context("creating backend client")?);
    let (settled_tx, mut settled_rx) = mpsc::unbounded_channel();
    let mut host = Host::new(&config, backend, settled_tx);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    write_messages(&mut stdout, &[host.order_form()]).await?;

    loop {
        let deadline = host.next_deadline();
        let sleep_fut = match deadline {
            Some(dl) => tokio::time::sleep_until(tokio::time::Instant::from_std(dl)),
            None => tokio::time::sleep_until(tokio::time::Instant::now() + Duration::from_secs(86400)),
        };
        let has_deadline = deadline.is_some();

        let out = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading host events")? else {
                    break;
                };
                match contract::decode_host(&line) {
                    Some(event) => host.handle_event(event),
                    None => {
                        if !line.trim().is_empty() {
                            warn!(line = %line.trim(), "ignoring malformed host event");
                        }
                        Vec::new()
                    }
                }
            }
            Some(settled) = settled_rx.recv() => host.handle_settled(settled),
            _ = sleep_fut, if has_deadline => host.check_timer(Instant::now()),
        };

        write_messages(&mut stdout, &out).await?;
    }

    info!("host input closed, shutting down");
    Ok(())
}

async fn write_messages(stdout: &mut tokio::io::Stdout, msgs: &[WidgetMsg]) -> Result<()> {
    if msgs.is_empty() {
        return Ok(());
    }
    for msg in msgs {
        stdout
            .write_all(contract::encode(msg).as_bytes())
            .await
            .context("writing widget message")?;
    }
    stdout.flush().await.context("flushing widget messages")
}

impl<B> Host<B>
where
    B: Catalog + Cart + Send + Sync + 'static,
{
    fn new(config: &Config, backend: Arc<B>, settled_tx: mpsc::UnboundedSender<Settled>) -> Self {
        Self {
            popup_config: config.popup.clone(),
            variant: None,
            popup: None,
            order: QuickOrderWidget::new(config.quick_order.clone()),
            backend,
            settled_tx,
        }
    }

    fn order_form(&self) -> WidgetMsg {
        WidgetMsg::RenderOrderForm { view: self.order.view() }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.popup.as_ref().and_then(PopupWidget::next_deadline)
    }

    fn check_timer(&mut self, now: Instant) -> Vec<WidgetMsg> {
        match self.popup.as_mut() {
            Some(popup) => popup_messages(popup.check_timer(now)),
            None => Vec::new(),
        }
    }

    fn handle_event(&mut self, event: HostEvent) -> Vec<WidgetMsg> {
        let now = Instant::now();
        match event {
            HostEvent::MountPopup => {
                if self.popup.is_some() {
                    debug!("popup already mounted");
                    return Vec::new();
                }
                self.popup = Some(PopupWidget::mount(&self.popup_config, self.variant, now));
                vec![WidgetMsg::RenderPopup { view: None }]
            }
            HostEvent::UnmountPopup => match self.popup.take() {
                Some(popup) => {
                    debug!(state = ?popup.state(), "unmounting popup");
                    popup_messages(popup.unmount())
                }
                None => Vec::new(),
            },
            HostEvent::ConfigurePopup { config } => {
                let actions = match self.popup.as_mut() {
                    Some(popup) => popup.set_config(&config, now),
                    None => Vec::new(),
                };
                self.popup_config = config;
                popup_messages(actions)
            }
            HostEvent::SelectVariant { context } => {
                self.variant = context.current_variant();
                match self.popup.as_mut() {
                    Some(popup) => popup_messages(popup.set_variant(self.variant, now)),
                    None => Vec::new(),
                }
            }
            HostEvent::DismissPopup => match self.popup.as_mut() {
                Some(popup) => popup_messages(popup.dismiss()),
                None => Vec::new(),
            },
            HostEvent::InputChange { text } => {
                let actions = self.order.input_change(text);
                self.process_order_actions(actions)
            }
            HostEvent::SubmitOrder => {
                debug!(loading = self.order.state().is_loading, "order submitted");
                let actions = self.order.submit();
                self.process_order_actions(actions)
            }
        }
    }

    fn handle_settled(&mut self, settled: Settled) -> Vec<WidgetMsg> {
        let actions = match settled {
            Settled::Lookup(submission, result) => self.order.lookup_settled(submission, result),
            Settled::Cart(submission, result) => self.order.cart_settled(submission, result),
        };
        self.process_order_actions(actions)
    }

    fn process_order_actions(&mut self, actions: Vec<quick_order::Action>) -> Vec<WidgetMsg> {
        let mut out = Vec::new();
        for action in actions {
            match action {
                quick_order::Action::Lookup { submission, request } => {
                    let backend = Arc::clone(&self.backend);
                    let tx = self.settled_tx.clone();
                    tokio::spawn(async move {
                        let result = backend.product_by_sku(&request.sku).await;
                        let _ = tx.send(Settled::Lookup(submission, result));
                    });
                }
                quick_order::Action::AddToCart { submission, mutation } => {
                    let backend = Arc::clone(&self.backend);
                    let tx = self.settled_tx.clone();
                    tokio::spawn(async move {
                        let result = backend.add_to_cart(&mutation).await;
                        let _ = tx.send(Settled::Cart(submission, result));
                    });
                }
                quick_order::Action::Navigate(path) => out.push(WidgetMsg::Navigate { path }),
                quick_order::Action::Render(view) => out.push(WidgetMsg::RenderOrderForm { view }),
            }
        }
        out
    }
}

fn popup_messages(actions: Vec<popup::Action>) -> Vec<WidgetMsg> {
    actions
        .into_iter()
        .map(|action| match action {
            popup::Action::Show(view) => WidgetMsg::RenderPopup { view: Some(view) },
            popup::Action::Hide => WidgetMsg::RenderPopup { view: None },
        })
        .collect()
}
