//! Directory scanning and navigation state for peek.
//!
//! Provides the [Entry] struct which is the unit the layout engine and the
//! renderer work on, the [EntryClass] type mapping to colors and `ls -F`
//! style indicator glyphs, and [DirState], the owner of the current
//! directory, its scanned entries and the selection.
//!
//! A failed navigation never mutates the prior [DirState]; the caller gets
//! a [NavigationError] and keeps showing the old listing.

use crate::core::errors::{NavigationError, ScanError};
use crate::core::formatter::measure;

use crossterm::style::Color;

use std::borrow::Cow;
use std::ffi::OsStr;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One filtered, classified, width-measured directory member.
///
/// Immutable once scanned; its index in the entry list is its identity for
/// one scan generation.
#[derive(Debug, Clone)]
pub struct Entry {
    name: Box<OsStr>,
    width: usize,
    class: EntryClass,
}

impl Entry {
    pub fn new(name: OsString, width: usize, class: EntryClass) -> Self {
        Entry {
            name: name.into_boxed_os_str(),
            width,
            class,
        }
    }

    // Accessors

    #[inline]
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    #[inline]
    pub fn name_str(&self) -> Cow<'_, str> {
        self.name.to_string_lossy()
    }

    /// Display width of the sanitized name, excluding any indicator glyph.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn class(&self) -> EntryClass {
        self.class
    }
}

/// Classification of an entry, derived from its file type with an
/// executability fallback for regular/unknown files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryClass {
    Plain,
    Directory,
    Symlink,
    Fifo,
    CharDevice,
    BlockDevice,
    Socket,
    Executable,
}

impl EntryClass {
    /// Executable bits used for the classifier's fallback probe.
    #[cfg(unix)]
    pub const EXEC_FLAG: u32 = 0o111;

    /// Classifies from a (symlink-preserving) file type. `meta` is only
    /// invoked for regular/unknown files, to probe executability; this is
    /// the single place classification touches the filesystem.
    pub fn classify<F>(ft: &fs::FileType, meta: F) -> Self
    where
        F: FnOnce() -> Option<fs::Metadata>,
    {
        if ft.is_symlink() {
            return EntryClass::Symlink;
        }
        if ft.is_dir() {
            return EntryClass::Directory;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if ft.is_fifo() {
                return EntryClass::Fifo;
            }
            if ft.is_char_device() {
                return EntryClass::CharDevice;
            }
            if ft.is_block_device() {
                return EntryClass::BlockDevice;
            }
            if ft.is_socket() {
                return EntryClass::Socket;
            }

            use std::os::unix::fs::PermissionsExt;
            if let Some(md) = meta()
                && md.permissions().mode() & Self::EXEC_FLAG != 0
            {
                return EntryClass::Executable;
            }
        }

        #[cfg(not(unix))]
        {
            let _ = meta;
        }

        EntryClass::Plain
    }

    /// Foreground color and bold flag for this class, or `None` for plain
    /// entries which keep the terminal's default rendition.
    pub fn style(self) -> Option<(Color, bool)> {
        match self {
            EntryClass::Plain => None,
            EntryClass::Directory => Some((Color::DarkBlue, true)),
            EntryClass::Symlink => Some((Color::DarkCyan, true)),
            EntryClass::Fifo => Some((Color::DarkYellow, false)),
            EntryClass::CharDevice => Some((Color::DarkYellow, true)),
            EntryClass::BlockDevice => Some((Color::DarkYellow, true)),
            EntryClass::Socket => Some((Color::DarkMagenta, true)),
            EntryClass::Executable => Some((Color::DarkGreen, true)),
        }
    }

    /// `ls -F` style indicator glyph, when the class has one.
    pub fn indicator(self) -> Option<char> {
        match self {
            EntryClass::Directory => Some('/'),
            EntryClass::Symlink => Some('@'),
            EntryClass::Fifo => Some('|'),
            EntryClass::Socket => Some('='),
            EntryClass::Executable => Some('*'),
            _ => None,
        }
    }
}

/// Options that influence what a scan produces.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    pub show_hidden: bool,
    pub print_hex: bool,
}

/// Whether a name passes the listing filter. `.` and `..` never do;
/// dot-prefixed names only when hidden entries are enabled.
pub fn visible(name: &OsStr, show_hidden: bool) -> bool {
    if name == "." || name == ".." {
        return false;
    }
    if name.to_string_lossy().starts_with('.') {
        return show_hidden;
    }
    true
}

/// Reads the contents of `path` into a sorted, classified entry list.
///
/// Zero entries is a successful scan; an unreadable directory is a
/// [ScanError]. Entries that vanish mid-scan are skipped.
pub fn scan(path: &Path, opts: ScanOptions) -> Result<Vec<Entry>, ScanError> {
    let mut entries = Vec::with_capacity(64);

    for dirent in fs::read_dir(path)? {
        let dirent = match dirent {
            Ok(d) => d,
            Err(_) => continue,
        };

        let name = dirent.file_name();
        if !visible(&name, opts.show_hidden) {
            continue;
        }

        let ft = match dirent.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };

        let class = EntryClass::classify(&ft, || dirent.metadata().ok());
        let width = measure(&name.to_string_lossy(), opts.print_hex);
        entries.push(Entry::new(name, width, class));
    }

    // Case-insensitive name order with a byte-order tiebreak, standing in
    // for locale collation.
    entries.sort_by(|a, b| {
        let la = a.name_str().to_lowercase();
        let lb = b.name_str().to_lowercase();
        la.cmp(&lb).then_with(|| a.name().cmp(b.name()))
    });

    Ok(entries)
}

/// The current directory, its entries and the selection cursor.
///
/// Replaced wholesale on every successful navigation; a failed navigation
/// leaves it untouched.
#[derive(Debug)]
pub struct DirState {
    path: PathBuf,
    entries: Vec<Entry>,
    scan_error: Option<ScanError>,
    selected: Option<usize>,
    selected_prev: Option<usize>,
}

impl DirState {
    /// Opens the starting directory. Unlike [DirState::navigate], failure
    /// here is fatal to the caller (there is no prior state to keep).
    pub fn open(start: &Path, opts: ScanOptions) -> Result<Self, NavigationError> {
        let mut state = DirState {
            path: PathBuf::new(),
            entries: Vec::new(),
            scan_error: None,
            selected: None,
            selected_prev: None,
        };
        state.navigate(start, opts)?;
        Ok(state)
    }

    // Accessors

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[inline]
    pub fn scan_error(&self) -> Option<&ScanError> {
        self.scan_error.as_ref()
    }

    #[inline]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[inline]
    pub fn selected_prev(&self) -> Option<usize> {
        self.selected_prev
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.selected.and_then(|i| self.entries.get(i))
    }

    /// Moves the cursor, remembering the old position for the incremental
    /// redraw. Out-of-range indices are clamped.
    pub fn select(&mut self, index: usize) {
        if self.entries.is_empty() {
            self.selected = None;
            return;
        }
        self.selected_prev = self.selected;
        self.selected = Some(index.min(self.entries.len() - 1));
    }

    /// Forgets the previous selection once its cell has been repainted.
    pub fn clear_prev(&mut self) {
        self.selected_prev = None;
    }

    /// Changes into `target`, resolved against the current directory
    /// unless absolute. On any failure the existing state is untouched and
    /// the error carries the OS message for the status line.
    ///
    /// On success the selection resets to the first entry.
    pub fn navigate(&mut self, target: &Path, opts: ScanOptions) -> Result<(), NavigationError> {
        let resolved = if target.is_absolute() {
            target.to_path_buf()
        } else {
            self.path.join(target)
        };
        let resolved = resolved
            .canonicalize()
            .map_err(NavigationError::Resolve)?;

        if !resolved.is_dir() {
            return Err(NavigationError::Chdir(io::Error::new(
                io::ErrorKind::NotADirectory,
                "not a directory",
            )));
        }

        // The scan is the gate: an unreadable target must not replace the
        // directory we are already showing.
        let entries =
            scan(&resolved, opts).map_err(|ScanError::Unreadable(e)| NavigationError::Chdir(e))?;

        self.selected = if entries.is_empty() { None } else { Some(0) };
        self.selected_prev = None;
        self.path = resolved;
        self.entries = entries;
        self.scan_error = None;
        Ok(())
    }

    /// Rescans the current path in place, keeping the selected *name*
    /// selected when it still exists (best effort).
    pub fn reload(&mut self, opts: ScanOptions) {
        let keep = self.selected_entry().map(|e| e.name().to_os_string());

        match scan(&self.path, opts) {
            Ok(entries) => {
                self.entries = entries;
                self.scan_error = None;
                self.selected = match keep {
                    Some(name) => self
                        .entries
                        .iter()
                        .position(|e| e.name() == name.as_os_str())
                        .or(if self.entries.is_empty() { None } else { Some(0) }),
                    None if self.entries.is_empty() => None,
                    None => Some(0),
                };
            }
            Err(e) => {
                self.entries.clear();
                self.scan_error = Some(e);
                self.selected = None;
            }
        }
        self.selected_prev = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn visibility_filter() {
        assert!(!visible(OsStr::new("."), true));
        assert!(!visible(OsStr::new(".."), true));
        assert!(!visible(OsStr::new(".hidden"), false));
        assert!(visible(OsStr::new(".hidden"), true));
        assert!(visible(OsStr::new("plain"), false));
    }

    #[test]
    fn scan_sorts_and_filters() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        File::create(tmp.path().join("Beta"))?;
        File::create(tmp.path().join("alpha"))?;
        File::create(tmp.path().join(".dot"))?;
        std::fs::create_dir(tmp.path().join("gamma"))?;

        let entries = scan(tmp.path(), ScanOptions::default())?;
        let names: Vec<_> = entries.iter().map(|e| e.name_str().into_owned()).collect();
        assert_eq!(names, vec!["alpha", "Beta", "gamma"]);

        let with_hidden = scan(
            tmp.path(),
            ScanOptions {
                show_hidden: true,
                print_hex: false,
            },
        )?;
        assert_eq!(with_hidden.len(), 4);
        assert_eq!(with_hidden[0].name_str(), ".dot");
        Ok(())
    }

    #[test]
    fn scan_classifies_directories() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        std::fs::create_dir(tmp.path().join("sub"))?;
        File::create(tmp.path().join("file"))?;

        let entries = scan(tmp.path(), ScanOptions::default())?;
        let sub = entries.iter().find(|e| e.name_str() == "sub").unwrap();
        assert_eq!(sub.class(), EntryClass::Directory);
        assert_eq!(sub.class().indicator(), Some('/'));

        let file = entries.iter().find(|e| e.name_str() == "file").unwrap();
        assert_eq!(file.class(), EntryClass::Plain);
        assert_eq!(file.class().indicator(), None);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn scan_flags_executables() -> Result<(), Box<dyn std::error::Error>> {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new()?;
        let path = tmp.path().join("run.sh");
        File::create(&path)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;

        let entries = scan(tmp.path(), ScanOptions::default())?;
        assert_eq!(entries[0].class(), EntryClass::Executable);
        assert_eq!(entries[0].class().indicator(), Some('*'));
        Ok(())
    }

    #[test]
    fn navigate_into_and_out() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let sub = tmp.path().join("sub");
        std::fs::create_dir(&sub)?;
        File::create(sub.join("inner.txt"))?;

        let mut state = DirState::open(tmp.path(), ScanOptions::default())?;
        assert_eq!(state.selected(), Some(0));

        state.navigate(Path::new("sub"), ScanOptions::default())?;
        assert_eq!(state.path(), sub.canonicalize()?);
        assert_eq!(state.entries().len(), 1);
        assert_eq!(state.selected(), Some(0));

        state.navigate(Path::new(".."), ScanOptions::default())?;
        assert_eq!(state.path(), tmp.path().canonicalize()?);
        Ok(())
    }

    #[test]
    fn navigate_failure_keeps_state() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        File::create(tmp.path().join("a.txt"))?;

        let mut state = DirState::open(tmp.path(), ScanOptions::default())?;
        state.select(0);
        let before_path = state.path().to_path_buf();
        let before_len = state.entries().len();

        let err = state.navigate(Path::new("does-not-exist"), ScanOptions::default());
        assert!(err.is_err());
        assert_eq!(state.path(), before_path);
        assert_eq!(state.entries().len(), before_len);
        assert_eq!(state.selected(), Some(0));

        // A plain file is not a navigation target either.
        let err = state.navigate(Path::new("a.txt"), ScanOptions::default());
        assert!(err.is_err());
        assert_eq!(state.path(), before_path);
        Ok(())
    }

    #[test]
    fn navigate_empty_directory() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let state = DirState::open(tmp.path(), ScanOptions::default())?;
        assert!(state.entries().is_empty());
        assert_eq!(state.selected(), None);
        assert!(state.scan_error().is_none());
        Ok(())
    }

    #[test]
    fn reload_keeps_selected_name() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        File::create(tmp.path().join("aa"))?;
        File::create(tmp.path().join("bb"))?;
        File::create(tmp.path().join("cc"))?;

        let mut state = DirState::open(tmp.path(), ScanOptions::default())?;
        state.select(1); // "bb"

        // A new entry sorts ahead of the selection.
        File::create(tmp.path().join("ba"))?;
        state.reload(ScanOptions::default());

        let sel = state.selected_entry().unwrap();
        assert_eq!(sel.name_str(), "bb");
        assert_eq!(state.selected(), Some(2));
        Ok(())
    }

    #[test]
    fn reload_handles_vanished_selection() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        File::create(tmp.path().join("aa"))?;
        File::create(tmp.path().join("bb"))?;

        let mut state = DirState::open(tmp.path(), ScanOptions::default())?;
        state.select(1);
        std::fs::remove_file(tmp.path().join("bb"))?;
        state.reload(ScanOptions::default());
        assert_eq!(state.selected(), Some(0));

        std::fs::remove_file(tmp.path().join("aa"))?;
        state.reload(ScanOptions::default());
        assert_eq!(state.selected(), None);
        Ok(())
    }
}
