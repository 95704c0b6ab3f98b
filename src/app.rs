// /app.rs
use crate::{
    ai::OpenAiResponder,
    audio::{OpenAiSynthesizer, RodioPlayer},
    backend::StatsClient,
    capture::{Recognizer, SpeechCapture},
    error::{AppError, TurnError},
    game::{self, GameSession, Outcome},
    microphone::MicrophoneRecognizer,
    persona::Direction,
    settings::Settings,
    tui::{Pace, Tui, TuiEvent},
    turn::{Signal, SignalQueue, TurnController, TurnState},
    ui::{self, spinner::Spinner},
};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;

pub type Controller = TurnController<OpenAiResponder, OpenAiSynthesizer, RodioPlayer>;

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
    ConfirmLanding,
}

// What woke the event loop up.
enum Step {
    Tui(Option<TuiEvent>),
    Signal(Option<Signal>),
}

pub struct App {
    running: bool,
    settings: Settings,
    controller: Controller,
    session: GameSession,
    stats: Option<StatsClient>,

    input_mode: InputMode,
    input: String,
    notice: Option<String>, // One-line feedback shown above the key hints.
    spinner: Spinner,
}

impl App {
    pub fn new(settings: Settings) -> Result<Self, AppError> {
        let api_key = settings.api_key()?.to_string();
        let registry = game::roster(&settings)?;
        let stats = StatsClient::from_settings(&settings);
        let signals = SignalQueue::new();

        let player = if settings.audio_output_enabled {
            RodioPlayer::spawn(signals.playback_sink())
                .map_err(|e| log::error!("Audio output disabled: {}", e))
                .ok()
        } else {
            None
        };

        let recognizer = if settings.audio_input_enabled {
            MicrophoneRecognizer::detect(
                &api_key,
                settings.transcription_model.clone(),
                Duration::from_secs(settings.reply_timeout_secs),
                tokio::runtime::Handle::current(),
            )
            .map(|recognizer| Box::new(recognizer) as Box<dyn Recognizer>)
        } else {
            None
        };
        let capture = SpeechCapture::new(recognizer, signals.recognizer_sink());

        let controller = TurnController::new(
            registry,
            capture,
            OpenAiResponder::new(&api_key, settings.model.clone()),
            OpenAiSynthesizer::new(&api_key, settings.speech_model.clone(), settings.speech_speed),
            player,
            signals,
        )
        .with_stats(stats.clone())
        .with_reply_timeout(Duration::from_secs(settings.reply_timeout_secs));

        let session = GameSession::new();
        log::info!("Game {} started", session.id);

        Ok(Self {
            running: true,
            settings,
            controller,
            session,
            stats,
            input_mode: InputMode::Normal,
            input: String::new(),
            notice: None,
            spinner: Spinner::new(),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::enter(Pace::default());

        while self.running {
            let step = tokio::select! {
                event = tui.next() => Step::Tui(event),
                signal = self.controller.next_signal() => Step::Signal(signal),
            };

            match step {
                Step::Tui(Some(TuiEvent::Render)) => {
                    tui.draw(|frame| ui::draw(frame, self))?;
                }
                Step::Tui(Some(event)) => self.handle_tui_event(event)?,
                Step::Tui(None) => break,
                Step::Signal(Some(signal)) => self.controller.handle(signal),
                Step::Signal(None) => break,
            }
        }

        tui.exit();
        Ok(())
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn spinner(&self) -> &Spinner {
        &self.spinner
    }

    pub fn debug_mode(&self) -> bool {
        self.settings.debug_mode
    }

    fn handle_tui_event(&mut self, event: TuiEvent) -> Result<()> {
        match event {
            TuiEvent::Key(key_event) => self.on_key(key_event)?,
            TuiEvent::Paste(text) if self.input_mode == InputMode::Editing => {
                self.input.push_str(&text.replace(['\r', '\n'], " "));
            }
            TuiEvent::Tick => {
                if self.controller.state() == TurnState::AwaitingReply {
                    self.spinner.tick();
                }
            }
            TuiEvent::Error => log::warn!("Terminal event error"),
            TuiEvent::Paste(_) | TuiEvent::Render | TuiEvent::Resize(_, _) => {}
        }
        Ok(())
    }

    fn on_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return Ok(());
        }

        match self.input_mode {
            InputMode::Editing => self.on_editing_key(key),
            InputMode::ConfirmLanding => self.on_confirm_key(key),
            InputMode::Normal if self.session.is_over() => self.on_landed_key(key)?,
            InputMode::Normal => self.on_normal_key(key),
        }
        Ok(())
    }

    fn on_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            KeyCode::Char('r') | KeyCode::Char(' ') => self.toggle_capture(),
            KeyCode::Left | KeyCode::Char('h') => self.switch_persona(Direction::Previous),
            KeyCode::Right | KeyCode::Char('l') => self.switch_persona(Direction::Next),
            KeyCode::Char('e') | KeyCode::Char('i') => {
                if self.controller.state() == TurnState::Idle {
                    self.input_mode = InputMode::Editing;
                    self.notice = None;
                } else {
                    self.report(TurnError::Busy(self.controller.state()));
                }
            }
            KeyCode::Char('p') if self.controller.state() != TurnState::Capturing => {
                self.input_mode = InputMode::ConfirmLanding;
            }
            _ => {}
        }
    }

    fn on_editing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let text = std::mem::take(&mut self.input);
                self.input_mode = InputMode::Normal;
                if let Err(e) = self.controller.submit_text(&text) {
                    self.report(e);
                }
            }
            KeyCode::Esc => {
                self.input.clear();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn on_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                self.land();
            }
            KeyCode::Char('n') | KeyCode::Esc => self.input_mode = InputMode::Normal,
            _ => {}
        }
    }

    fn on_landed_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            KeyCode::Char('n') => self.new_game()?,
            _ => {}
        }
        Ok(())
    }

    fn toggle_capture(&mut self) {
        let result = if self.controller.state() == TurnState::Capturing {
            self.controller.end_capture()
        } else {
            self.controller.begin_capture()
        };
        match result {
            Ok(()) => self.notice = None,
            Err(e) => self.report(e),
        }
    }

    fn switch_persona(&mut self, direction: Direction) {
        let persona = self.controller.switch_persona(direction);
        log::debug!("Tuned to {} ({})", persona.display_name, persona.id);
    }

    fn land(&mut self) {
        let index = self.controller.current_index();
        match self.session.land(self.controller.registry(), index) {
            Ok(outcome) => {
                if let Some(stats) = &self.stats {
                    stats.record_landing(outcome);
                }
                self.notice = Some(match outcome {
                    Outcome::Survived => "You landed safely. The researcher told the truth.".to_string(),
                    Outcome::Lost => "The planet was not what you were told. Mission lost.".to_string(),
                });
            }
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    fn new_game(&mut self) -> Result<(), AppError> {
        let registry = game::roster(&self.settings)?;
        self.controller.start_session(registry);
        self.session = GameSession::new();
        self.notice = None;
        self.input.clear();
        log::info!("Game {} started", self.session.id);
        Ok(())
    }

    fn report(&mut self, error: TurnError) {
        log::debug!("Input rejected: {}", error);
        self.notice = Some(error.to_string());
    }

    fn quit(&mut self) {
        self.running = false;
    }
}
