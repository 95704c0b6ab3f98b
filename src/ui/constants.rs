// ui/constants.rs

pub const TITLE: &str = r#" _                    _  __       _ _
| |    __ _ _ __   __| |/ _| __ _| | |
| |   / _` | '_ \ / _` | |_ / _` | | |
| |__| (_| | | | | (_| |  _| (_| | | |
|_____\__,_|_| |_|\__,_|_|  \__,_|_|_|
"#;

pub const BRIEFING: &str = "The researchers below answer on the radio. Only one of them has \
really been to the planet they describe. Question them, then land where you believe it is safe.";

pub const KEYS_IDLE: &str = "r: talk  e: type  ←/→: change frequency  p: land  q: quit";
pub const KEYS_CAPTURING: &str = "r: stop talking  ←/→: change frequency";
pub const KEYS_BUSY: &str = "←/→: change frequency  q: quit";
pub const KEYS_EDITING: &str = "Enter: send  Esc: cancel";
pub const KEYS_CONFIRM: &str = "y: land here  n: keep searching";
pub const KEYS_LANDED: &str = "n: new game  q: quit";
