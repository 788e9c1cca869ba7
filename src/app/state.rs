//! Application state for peek.
//!
//! [AppState] owns the directory state, the current layout, the
//! interaction mode and the dirty flag that decides between a full and an
//! incremental redraw. All mutation happens on the single main-loop
//! thread; the renderer reads this state and clears the transient bits it
//! has shown.

use crate::config::Options;
use crate::core::fm::DirState;
use crate::core::layout::Layout;
use crate::core::proc;

/// What the main loop does after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A transient status-line message, cleared on the next redraw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Msg(String),
    Err(String),
}

/// Interaction mode of the controller state machine.
///
/// `Prompting` browses like `Browsing` but has a message pending for the
/// status line; `Searching` accumulates a prefix query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    Prompting(Prompt),
    Searching(String),
}

pub struct AppState {
    dir: DirState,
    layout: Layout,
    mode: Mode,
    dirty: bool,
    options: Options,
    editor: String,
    opener: Option<String>,
}

impl AppState {
    pub fn new(dir: DirState, options: Options, editor: String, opener: Option<String>) -> Self {
        AppState {
            dir,
            layout: Layout::empty(),
            mode: Mode::Browsing,
            dirty: true,
            options,
            editor,
            opener,
        }
    }

    // Accessors

    #[inline]
    pub fn dir(&self) -> &DirState {
        &self.dir
    }

    #[inline]
    pub fn dir_mut(&mut self) -> &mut DirState {
        &mut self.dir
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[inline]
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub(crate) fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    #[inline]
    pub fn editor(&self) -> &str {
        &self.editor
    }

    pub fn opener(&self) -> Option<&str> {
        self.opener.as_deref().or_else(|| proc::default_opener())
    }

    #[inline]
    pub fn searching(&self) -> bool {
        matches!(self.mode, Mode::Searching(_))
    }

    /// The query shown in the status line while searching.
    pub fn search_query(&self) -> Option<&str> {
        match &self.mode {
            Mode::Searching(q) => Some(q),
            _ => None,
        }
    }

    // Dirty tracking

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The cached display no longer matches the logical state; the next
    /// refresh must redraw fully.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Whether the cursor has left the rendered page, which forces a full
    /// redraw even without a dirty mark.
    pub fn selection_left_window(&self) -> bool {
        match self.dir.selected() {
            Some(sel) => !self.layout.contains(sel),
            None => false,
        }
    }

    /// Recomputes the layout for the given terminal size. One row is
    /// reserved for the header/status line.
    pub fn relayout(&mut self, size: (u16, u16)) {
        let (cols, rows) = size;
        let usable = (rows as usize).saturating_sub(1);
        let selected = self.dir.selected().unwrap_or(0);
        self.layout = Layout::compute(
            self.dir.entries(),
            self.options.indicators,
            cols as usize,
            usable,
            selected,
        );
    }

    /// Stores a transient error for the status line.
    pub fn prompt_err(&mut self, message: String) {
        self.mode = Mode::Prompting(Prompt::Err(message));
    }

    /// Takes the pending prompt, if any, returning the mode to browsing.
    /// Called by the renderer when it draws the status line, which is
    /// what makes prompts transient.
    pub fn take_prompt(&mut self) -> Option<Prompt> {
        if matches!(self.mode, Mode::Prompting(_)) {
            match std::mem::replace(&mut self.mode, Mode::Browsing) {
                Mode::Prompting(p) => Some(p),
                _ => unreachable!(),
            }
        } else {
            None
        }
    }
}
