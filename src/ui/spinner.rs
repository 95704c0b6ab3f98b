const SPINNER_CHARS: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

#[derive(Debug, Default, Clone)]
pub struct Spinner {
    current_frame: usize,
}

impl Spinner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) {
        self.current_frame = (self.current_frame + 1) % SPINNER_CHARS.len();
    }

    pub fn frame(&self) -> char {
        SPINNER_CHARS[self.current_frame]
    }
}

pub fn spinner_frame(spinner: &Spinner, speaker: &str) -> String {
    format!(" {} is answering {} ", speaker, spinner.frame())
}
