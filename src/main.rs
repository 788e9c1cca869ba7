//! main.rs
//! Entry point for peek

pub(crate) mod app;
pub(crate) mod config;
pub(crate) mod core;
pub(crate) mod ui;
pub(crate) mod utils;

use crate::app::AppState;
use crate::config::{Config, Options};
use crate::core::fm::DirState;
use crate::core::{proc, terminal};
use crate::utils::cli::{CliAction, handle_args};
use crate::utils::helpers::expand_home_path;

use std::path::PathBuf;

fn main() -> std::io::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let mut stdout = std::io::stdout();
        let _ = crossterm::execute!(stdout, crossterm::cursor::Show);

        eprintln!("\n[peek] Error occurred: {}", info);

        #[cfg(debug_assertions)]
        {
            let bt = std::backtrace::Backtrace::force_capture();
            eprintln!("\nStack Backtrace:\n{}", bt);
        }
    }));

    let args = match handle_args() {
        CliAction::Run(args) => args,
        CliAction::Exit(code) => std::process::exit(code),
    };

    let config = Config::load();
    let mut options = Options::from(config.general());
    args.apply(&mut options);

    let start = args
        .start_dir
        .as_deref()
        .map(expand_home_path)
        .unwrap_or_else(|| PathBuf::from("."));

    let dir = match DirState::open(&start, options.scan()) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("[peek] Error: cannot open '{}': {}", start.display(), e);
            std::process::exit(1);
        }
    };

    if args.print_once {
        let cols = crossterm::terminal::size().map(|(c, _)| c as usize).unwrap_or(80);
        return ui::print_listing(&dir, &options, cols, &mut std::io::stdout());
    }

    let editor = proc::default_editor(config.programs().editor());
    let opener = config.programs().opener().map(str::to_owned);
    let mut app = AppState::new(dir, options, editor, opener);
    terminal::run_terminal(&mut app)
}
