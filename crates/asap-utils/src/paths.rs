//! Pipeline home-directory resolution, with a thread-local override for
//! test isolation so tests never touch a real operator's filesystem.

use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;

thread_local! {
    static THREAD_HOME: RefCell<Option<Utf8PathBuf>> = const { RefCell::new(None) };
}

/// Root directory the pipeline persists tracked files, history, and
/// staged artifacts under. Defaults to `$ASAP_HOME`, falling back to
/// `~/.asap`. Tests can override this per-thread via [`set_thread_home`].
pub fn asap_home() -> Utf8PathBuf {
    if let Some(over) = THREAD_HOME.with(|h| h.borrow().clone()) {
        return over;
    }
    if let Ok(env_home) = std::env::var("ASAP_HOME") {
        return Utf8PathBuf::from(env_home);
    }
    let base = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    Utf8PathBuf::from_path_buf(base.join(".asap")).unwrap_or_else(|_| Utf8PathBuf::from("./.asap"))
}

pub fn ensure_dir_all(path: &Utf8Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}

/// Overrides [`asap_home`] for the current thread only. Intended for test
/// setup; production code never calls this.
#[cfg(test)]
pub fn set_thread_home(path: Utf8PathBuf) {
    THREAD_HOME.with(|h| *h.borrow_mut() = Some(path));
}

#[cfg(test)]
pub fn clear_thread_home() {
    THREAD_HOME.with(|h| *h.borrow_mut() = None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn thread_home_override_round_trips() {
        let dir = TempDir::new().unwrap();
        let utf8 = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        set_thread_home(utf8.clone());
        assert_eq!(asap_home(), utf8);
        clear_thread_home();
    }
}
