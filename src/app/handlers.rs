//! Event handling for peek: the transition function of the controller
//! state machine.
//!
//! One [InputEvent] maps to one state mutation (selection move, directory
//! change, search edit) or one external launch. Anything that invalidates
//! the cached display marks the state dirty so the next refresh redraws
//! fully; plain cursor movement does not, which is what enables the
//! incremental repaint fast path.

use crate::app::keymap::InputEvent;
use crate::app::state::{AppState, Flow, Mode};
use crate::app::{nav, search};
use crate::core::proc;

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

impl AppState {
    /// Applies one decoded input event.
    pub fn apply(&mut self, event: InputEvent) -> Flow {
        match event {
            InputEvent::Quit => return Flow::Quit,

            InputEvent::Move(dir) => {
                if let Some(sel) = self.dir().selected() {
                    let count = self.dir().entries().len();
                    let next = nav::step(dir, sel, count, self.layout());
                    self.dir_mut().select(next);
                }
            }

            InputEvent::Parent => self.go(Path::new("..")),

            InputEvent::Enter => {
                if let Some(name) = self.selected_name() {
                    // Navigation decides whether the target is enterable;
                    // a file produces the same status-line error `cd` would.
                    self.go(Path::new(&name));
                }
            }

            InputEvent::Reload => {
                let scan = self.options().scan();
                self.dir_mut().reload(scan);
                self.mark_dirty();
            }

            InputEvent::Edit => {
                if let Some(name) = self.selected_name() {
                    let editor = OsString::from(self.editor());
                    self.launch(&editor, Some(&name));
                }
            }

            InputEvent::Open => {
                if let Some(name) = self.selected_name() {
                    match self.opener() {
                        Some(opener) => {
                            let opener = OsString::from(opener);
                            self.launch(&opener, Some(&name));
                        }
                        None => self.prompt_err("no opener available".to_string()),
                    }
                }
            }

            InputEvent::Exec => {
                if let Some(name) = self.selected_name() {
                    // Run the entry itself; the explicit ./ keeps a bare
                    // name from being looked up in PATH.
                    let program: OsString = PathBuf::from(".").join(&name).into();
                    self.launch(&program, None);
                }
            }

            InputEvent::Shell => {
                let shell = OsString::from(proc::default_shell());
                self.launch(&shell, None);
            }

            InputEvent::StartSearch => self.set_mode(Mode::Searching(String::new())),

            InputEvent::SearchChar(c) => {
                if let Mode::Searching(q) = self.mode() {
                    let mut q = q.clone();
                    q.push(c);
                    self.jump_to_match(&q);
                    self.set_mode(Mode::Searching(q));
                }
            }

            InputEvent::SearchBackspace => {
                if let Mode::Searching(q) = self.mode() {
                    let mut q = q.clone();
                    q.pop();
                    self.jump_to_match(&q);
                    self.set_mode(Mode::Searching(q));
                }
            }

            InputEvent::SearchAccept | InputEvent::SearchCancel => {
                self.set_mode(Mode::Browsing);
            }
        }
        Flow::Continue
    }

    fn selected_name(&self) -> Option<OsString> {
        self.dir().selected_entry().map(|e| e.name().to_os_string())
    }

    /// Navigates, surfacing failure as a transient status-line error and
    /// leaving the prior listing on screen.
    fn go(&mut self, target: &Path) {
        let scan = self.options().scan();
        match self.dir_mut().navigate(target, scan) {
            Ok(()) => self.mark_dirty(),
            Err(e) => self.prompt_err(e.to_string()),
        }
    }

    fn jump_to_match(&mut self, query: &str) {
        if let Some(idx) = search::prefix_match(self.dir().entries(), query) {
            self.dir_mut().select(idx);
        }
    }

    /// Hands the terminal to an external program and reclaims it. The
    /// display is dirty afterwards no matter what the child did.
    fn launch(&mut self, program: &OsStr, arg: Option<&OsStr>) {
        let cwd = self.dir().path().to_path_buf();
        let selection = self.selected_name();
        let result = proc::launch(program, arg, &cwd, selection.as_deref());
        if let Err(e) = result {
            self.prompt_err(e.to_string());
        }
        self.mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::keymap::Direction;
    use crate::config::Options;
    use crate::core::fm::{DirState, ScanOptions};
    use std::fs::File;
    use tempfile::TempDir;

    fn app_in(tmp: &TempDir) -> AppState {
        let dir = DirState::open(tmp.path(), ScanOptions::default()).unwrap();
        let mut app = AppState::new(dir, Options::default(), "vim".into(), None);
        app.relayout((80, 24));
        app
    }

    #[test]
    fn enter_and_parent_navigation() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        std::fs::create_dir(tmp.path().join("sub"))?;
        File::create(tmp.path().join("sub").join("x"))?;

        let mut app = app_in(&tmp);
        assert_eq!(app.apply(InputEvent::Enter), Flow::Continue);
        assert!(app.is_dirty());
        assert_eq!(app.dir().path(), tmp.path().join("sub").canonicalize()?);

        app.clear_dirty();
        app.apply(InputEvent::Parent);
        assert!(app.is_dirty());
        assert_eq!(app.dir().path(), tmp.path().canonicalize()?);
        Ok(())
    }

    #[test]
    fn entering_a_file_sets_prompt() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        File::create(tmp.path().join("plain.txt"))?;

        let mut app = app_in(&tmp);
        app.clear_dirty();
        app.apply(InputEvent::Enter);

        assert!(!app.is_dirty(), "failed navigation must not dirty");
        assert!(matches!(app.mode(), Mode::Prompting(_)));
        assert_eq!(app.dir().path(), tmp.path().canonicalize()?);
        Ok(())
    }

    #[test]
    fn movement_does_not_dirty() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        for name in ["a", "b", "c"] {
            File::create(tmp.path().join(name))?;
        }

        let mut app = app_in(&tmp);
        app.clear_dirty();
        app.apply(InputEvent::Move(Direction::Right));
        assert!(!app.is_dirty());
        assert_eq!(app.dir().selected(), Some(1));
        assert_eq!(app.dir().selected_prev(), Some(0));
        Ok(())
    }

    #[test]
    fn movement_on_empty_directory_is_a_noop() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let mut app = app_in(&tmp);
        app.apply(InputEvent::Move(Direction::Down));
        assert_eq!(app.dir().selected(), None);
        Ok(())
    }

    #[test]
    fn search_jumps_and_exits() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        for name in ["alpha", "beta", "gamma"] {
            File::create(tmp.path().join(name))?;
        }

        let mut app = app_in(&tmp);
        app.apply(InputEvent::StartSearch);
        assert!(app.searching());

        app.apply(InputEvent::SearchChar('g'));
        assert_eq!(app.search_query(), Some("g"));
        assert_eq!(app.dir().selected(), Some(2));

        // No match keeps the selection.
        app.apply(InputEvent::SearchChar('z'));
        assert_eq!(app.dir().selected(), Some(2));

        app.apply(InputEvent::SearchBackspace);
        assert_eq!(app.search_query(), Some("g"));

        app.apply(InputEvent::SearchAccept);
        assert!(!app.searching());
        assert_eq!(app.dir().selected(), Some(2));
        Ok(())
    }

    #[test]
    fn reload_marks_dirty() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        File::create(tmp.path().join("a"))?;
        let mut app = app_in(&tmp);
        app.clear_dirty();

        File::create(tmp.path().join("b"))?;
        app.apply(InputEvent::Reload);
        assert!(app.is_dirty());
        assert_eq!(app.dir().entries().len(), 2);
        Ok(())
    }

    #[test]
    fn quit_stops_the_loop() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let mut app = app_in(&tmp);
        assert_eq!(app.apply(InputEvent::Quit), Flow::Quit);
        Ok(())
    }
}
