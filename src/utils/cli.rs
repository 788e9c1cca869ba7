//! Command-line argument parsing and help for peek.
//!
//! Flags follow getopt conventions: short options only, combinable into
//! one cluster (`pk -aF`), with one optional positional argument naming
//! the start directory.

use crate::config::Options;

pub enum CliAction {
    Run(CliArgs),
    Exit(i32),
}

/// Flags collected from the command line, applied on top of the config
/// file so the command line always wins.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub start_dir: Option<String>,
    pub show_hidden: bool,
    pub no_color: bool,
    pub clear_on_exit: bool,
    pub hide_path: bool,
    pub indicators: bool,
    pub print_hex: bool,
    pub print_once: bool,
}

impl CliArgs {
    /// Overrides config-file options with whatever was set on the
    /// command line.
    pub fn apply(&self, options: &mut Options) {
        if self.show_hidden {
            options.show_hidden = true;
        }
        if self.no_color {
            options.color = false;
        }
        if self.clear_on_exit {
            options.clear_on_exit = true;
        }
        if self.hide_path {
            options.show_path = false;
        }
        if self.indicators {
            options.indicators = true;
        }
        if self.print_hex {
            options.print_hex = true;
        }
    }
}

pub fn handle_args() -> CliAction {
    let args: Vec<String> = std::env::args().skip(1).collect();
    parse_args(&args)
}

/// Parses one argument vector (without the program name).
pub fn parse_args(args: &[String]) -> CliAction {
    let mut parsed = CliArgs::default();

    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                return CliAction::Exit(0);
            }
            "-v" | "--version" => {
                print_version();
                return CliAction::Exit(0);
            }
            flags if flags.starts_with('-') && flags.len() > 1 => {
                for flag in flags.chars().skip(1) {
                    match flag {
                        'a' => parsed.show_hidden = true,
                        'B' => parsed.no_color = true,
                        'c' => parsed.clear_on_exit = true,
                        'd' => parsed.hide_path = true,
                        'F' => parsed.indicators = true,
                        'p' => parsed.print_once = true,
                        'x' => parsed.print_hex = true,
                        _ => {
                            eprintln!("pk: invalid option -- '{}'", flag);
                            eprintln!("Try 'pk -h' for more information.");
                            return CliAction::Exit(1);
                        }
                    }
                }
            }
            dir => {
                if parsed.start_dir.is_some() {
                    eprintln!("pk: more than one directory given");
                    eprintln!("Usage: pk [-aBcdFpx] [<directory>]");
                    return CliAction::Exit(1);
                }
                parsed.start_dir = Some(dir.to_string());
            }
        }
    }

    CliAction::Run(parsed)
}

fn print_version() {
    println!("peek {}", env!("CARGO_PKG_VERSION"));
}

fn print_help() {
    println!(
        r#"peek - Interactive exploration of directories on the command line

USAGE:
  pk [-aBcdFpx] [<directory>]

OPTIONS:
  -a    Show dotfiles (hidden entries)
  -B    Disable color output
  -c    Clear the listing on exit
  -d    Hide the current directory header
  -F    Append an indicator glyph to special entries (/ @ | = *)
  -p    Print the listing once and exit (no interactive session)
  -x    Print unprintable characters as hex escapes
  -h    Print this message and exit
  -v    Display the installed version

KEYS:
  Up | K        Move cursor up
  Down | J      Move cursor down
  Left | H      Move cursor left
  Right | L     Move cursor right
  Enter         Enter the selected directory
  Backspace     Go to the parent directory
  /             Search entries by prefix (Enter accepts, Esc cancels)
  E             Edit the selection in your editor
  O             Open the selection with the configured opener
  X             Execute the selection
  !             Start a shell in the current directory
  R             Reload the current directory
  Q | F10       Quit

ENVIRONMENT:
  PEEK_CONFIG   Override the default config path
  EDITOR        Editor used by the E key when none is configured
  SHELL         Shell started by the ! key
"#
    );
}
