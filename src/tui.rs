// Terminal session: raw mode, the crossterm event reader and the tick/render clocks.
use std::time::Duration;

use color_eyre::eyre::Result;
use futures::{FutureExt, StreamExt};
use ratatui::{
    DefaultTerminal, Frame,
    crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind},
};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Debug)]
pub enum TuiEvent {
    Tick,
    Render,
    Paste(String),
    Key(KeyEvent),
    Resize(u16, u16),
    Error,
}

// Ticks per second drive the spinner, frames per second drive redraws.
#[derive(Debug, Clone, Copy)]
pub struct Pace {
    pub ticks: f64,
    pub frames: f64,
}

impl Default for Pace {
    fn default() -> Self {
        Self {
            ticks: 8.0,
            frames: 30.0,
        }
    }
}

pub struct Tui {
    terminal: DefaultTerminal,
    reader: Option<JoinHandle<()>>,
    shutdown: CancellationToken,
    events: UnboundedReceiver<TuiEvent>,
    sender: UnboundedSender<TuiEvent>,
    pace: Pace,
    active: bool,
}

impl Tui {
    /// Switches the terminal to the alternate screen and starts reading events.
    pub fn enter(pace: Pace) -> Self {
        let (sender, events) = mpsc::unbounded_channel();
        let mut tui = Self {
            terminal: ratatui::init(),
            reader: None,
            shutdown: CancellationToken::new(),
            events,
            sender,
            pace,
            active: true,
        };
        tui.spawn_reader();
        tui
    }

    fn spawn_reader(&mut self) {
        let tick_every = Duration::from_secs_f64(1.0 / self.pace.ticks);
        let render_every = Duration::from_secs_f64(1.0 / self.pace.frames);
        let shutdown = self.shutdown.clone();
        let sender = self.sender.clone();

        self.reader = Some(tokio::spawn(async move {
            let mut input = EventStream::new();
            let mut ticks = tokio::time::interval(tick_every);
            let mut frames = tokio::time::interval(render_every);

            loop {
                let event = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    next = input.next().fuse() => match next {
                        Some(Ok(event)) => translate(event),
                        Some(Err(_)) => Some(TuiEvent::Error),
                        None => break,
                    },
                    _ = ticks.tick() => Some(TuiEvent::Tick),
                    _ = frames.tick() => Some(TuiEvent::Render),
                };

                if let Some(event) = event {
                    if sender.send(event).is_err() {
                        break;
                    }
                }
            }
        }));
    }

    pub async fn next(&mut self) -> Option<TuiEvent> {
        self.events.recv().await
    }

    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }

    /// Stops the reader and gives the terminal back. Safe to call twice.
    pub fn exit(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.shutdown.cancel();
        if let Some(reader) = self.reader.take() {
            wait_or_abort(reader);
        }
        ratatui::restore();
        log::info!("Landfall exit: {}", chrono::Local::now());
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        self.exit();
    }
}

// Only key presses are forwarded; releases and repeats would double every keystroke on Windows.
fn translate(event: CrosstermEvent) -> Option<TuiEvent> {
    match event {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(TuiEvent::Key(key)),
        CrosstermEvent::Paste(text) => Some(TuiEvent::Paste(text)),
        CrosstermEvent::Resize(width, height) => Some(TuiEvent::Resize(width, height)),
        _ => None,
    }
}

fn wait_or_abort(reader: JoinHandle<()>) {
    for _ in 0..50 {
        if reader.is_finished() {
            return;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    reader.abort();
    log::warn!("Terminal event reader did not stop in time and was aborted");
}
