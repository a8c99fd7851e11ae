// console output for the bot, one macro per level.
// the macros expand to `$crate::logging::emit`, so every module can use them
// without importing anything but the macro itself.

use better_term::{flush_styles, Color};
use chrono::Local;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Success,
    Warn,
    Error,
}

impl Level {
    fn color(&self) -> Color {
        match self {
            Level::Debug => Color::Cyan,
            Level::Info => Color::White,
            Level::Success => Color::Green,
            Level::Warn => Color::Yellow,
            Level::Error => Color::Red,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            Level::Debug => "dbg",
            Level::Info => "...",
            Level::Success => " + ",
            Level::Warn => " ! ",
            Level::Error => " x ",
        }
    }
}

/// Debug output is opt-in through the `RINK_DEBUG` environment variable.
pub fn debug_enabled() -> bool {
    std::env::var_os("RINK_DEBUG").is_some()
}

pub fn emit(level: Level, msg: String) {
    if level == Level::Debug && !debug_enabled() {
        return;
    }
    let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let line = format!("{}[{}] {}[{}] {}", Color::White, stamp, level.color(), level.tag(), msg);
    match level {
        Level::Warn | Level::Error => eprintln!("{}", line),
        _ => println!("{}", line),
    }
    flush_styles();
}

#[macro_export]
macro_rules! whisper {
    ($($arg:tt)*) => {
        $crate::logging::emit($crate::logging::Level::Debug, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! say {
    ($($arg:tt)*) => {
        $crate::logging::emit($crate::logging::Level::Info, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! yay {
    ($($arg:tt)*) => {
        $crate::logging::emit($crate::logging::Level::Success, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! hey {
    ($($arg:tt)*) => {
        $crate::logging::emit($crate::logging::Level::Warn, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! nay {
    ($($arg:tt)*) => {
        $crate::logging::emit($crate::logging::Level::Error, format!($($arg)*))
    };
}
