//! Front-panel trainer CLI.
//!
//! Usage:
//!   panel                        # start with zeroed memory
//!   panel demos/fibonacci.asm    # assemble and load a program
//!   panel image.lst              # load a raw memory listing
//!
//! Keys: 0-9/a-f are the hex pad, `+`/`-` step addresses, Enter is GO,
//! Tab (or `s`) is the 2nd prefix. Esc or Ctrl+C quits. From the main
//! menu, 2nd+C opens data entry, 2nd+D address entry, GO runs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use panel_core::{
    assemble, key_position, parse_listing, Machine, PanelResult, SharedPanel, Ticker, KEY_GO,
    KEY_MINUS, KEY_PLUS, KEY_SHIFT,
};

mod menu;
mod term;

/// SUBLEQ front-panel trainer
#[derive(Parser, Debug)]
#[command(name = "panel")]
#[command(about = "A hex-keypad front panel around a one-instruction machine")]
struct Args {
    /// Program to load at address 0 (.asm/.sub is assembled, anything
    /// else is parsed as a raw listing)
    program: Option<PathBuf>,

    /// Enable per-instruction tracing
    #[arg(short, long)]
    trace: bool,

    /// Tick period in microseconds
    #[arg(long, default_value_t = 1000)]
    tick_us: u64,
}

fn load_program(path: &Path) -> PanelResult<Vec<u8>> {
    let src = std::fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if ext == "asm" || ext == "sub" {
        assemble(&src)
    } else {
        parse_listing(&src)
    }
}

/// Map a host key to a primary key code on the pad.
fn translate_key(code: KeyCode) -> Option<u8> {
    match code {
        KeyCode::Char(c @ '0'..='9') => Some(c as u8 - b'0'),
        KeyCode::Char(c @ 'a'..='f') => Some(c as u8 - b'a' + 10),
        KeyCode::Char(c @ 'A'..='F') => Some(c as u8 - b'A' + 10),
        KeyCode::Char('+') => Some(KEY_PLUS),
        KeyCode::Char('-') => Some(KEY_MINUS),
        KeyCode::Enter => Some(KEY_GO),
        KeyCode::Char('s') | KeyCode::Tab => Some(KEY_SHIFT),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let panel = SharedPanel::new();
    let mut machine = Machine::new(panel.clone());
    machine.trace = args.trace;

    if let Some(path) = &args.program {
        let image = load_program(path)?;
        machine.load(&image)?;
        eprintln!("Loaded {} ({} bytes)", path.display(), image.len());
    }

    eprintln!("Keys: 0-9/a-f hex pad, + - step, Enter GO, Tab 2nd, Esc quit");

    let keys = term::SharedKeys::new();
    let _ticker = Ticker::spawn(
        panel,
        term::TerminalPanel::new(keys.clone()),
        Duration::from_micros(args.tick_us),
    );

    let raw_mode_enabled = enable_raw_mode().is_ok();

    // The dispatcher blocks in get_key with no cancellation point, so
    // quitting tears the process down from the input loop instead of
    // joining it.
    let _dispatcher = tokio::task::spawn_blocking(move || menu::Dispatcher::new(machine).run());

    loop {
        tokio::time::sleep(Duration::from_millis(5)).await;
        while event::poll(Duration::from_millis(0)).unwrap_or(false) {
            let Ok(Event::Key(key_event)) = event::read() else {
                continue;
            };
            if key_event.kind == KeyEventKind::Release {
                continue;
            }

            let quit = key_event.code == KeyCode::Esc
                || (key_event.code == KeyCode::Char('c')
                    && key_event.modifiers.contains(KeyModifiers::CONTROL));
            if quit {
                if raw_mode_enabled {
                    let _ = disable_raw_mode();
                }
                println!();
                std::process::exit(0);
            }

            if let Some(code) = translate_key(key_event.code) {
                if let Some((row, col)) = key_position(code) {
                    keys.press(row, col);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_core::KEY_NONE;

    #[test]
    fn test_translate_hex_and_function_keys() {
        assert_eq!(translate_key(KeyCode::Char('0')), Some(0x0));
        assert_eq!(translate_key(KeyCode::Char('9')), Some(0x9));
        assert_eq!(translate_key(KeyCode::Char('a')), Some(0xA));
        assert_eq!(translate_key(KeyCode::Char('F')), Some(0xF));
        assert_eq!(translate_key(KeyCode::Enter), Some(KEY_GO));
        assert_eq!(translate_key(KeyCode::Tab), Some(KEY_SHIFT));
        assert_eq!(translate_key(KeyCode::Char('x')), None);
    }

    #[test]
    fn test_translated_keys_exist_in_matrix() {
        for code in (0..=0xF).chain([KEY_PLUS, KEY_MINUS, KEY_GO, KEY_SHIFT]) {
            assert_ne!(code, KEY_NONE);
            assert!(key_position(code).is_some(), "code {code:#04X}");
        }
    }
}
