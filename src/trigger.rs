//! Export hotkey and its process-wide registration.
//!
//! Registration happens at most once per process. Registering again keeps
//! the first hotkey and only repeats the "ready" notice.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use thiserror::Error;
use tracing::debug;

use crate::notify::{Notice, Notifier};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HotkeyError {
    #[error("hotkey is empty")]
    Empty,

    #[error("unknown modifier {0:?}")]
    UnknownModifier(String),

    #[error("hotkey key must be a single character, got {0:?}")]
    BadKey(String),
}

/// A key combination such as `Mod+Shift+M`.
///
/// `Mod` accepts either Cmd (meta) or Ctrl, so one binding covers macOS and
/// other platforms. Modifiers not named in the binding are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotkey {
    pub primary: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
    pub key: char,
}

/// A key press as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Hotkey {
    pub fn matches(&self, event: &KeyEvent) -> bool {
        let mut chars = event.key.chars();
        let (Some(pressed), None) = (chars.next(), chars.next()) else {
            return false;
        };

        pressed.eq_ignore_ascii_case(&self.key)
            && (!self.primary || event.meta || event.ctrl)
            && (!self.ctrl || event.ctrl)
            && (!self.meta || event.meta)
            && (!self.alt || event.alt)
            && (!self.shift || event.shift)
    }
}

impl FromStr for Hotkey {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('+').map(str::trim).filter(|p| !p.is_empty()).collect();
        let Some((key, modifiers)) = parts.split_last() else {
            return Err(HotkeyError::Empty);
        };

        let mut chars = key.chars();
        let key = match (chars.next(), chars.next()) {
            (Some(c), None) => c.to_ascii_uppercase(),
            _ => return Err(HotkeyError::BadKey((*key).to_string())),
        };

        let mut hotkey = Hotkey {
            primary: false,
            ctrl: false,
            meta: false,
            alt: false,
            shift: false,
            key,
        };
        for modifier in modifiers {
            match modifier.to_ascii_lowercase().as_str() {
                "mod" | "cmdorctrl" => hotkey.primary = true,
                "ctrl" | "control" => hotkey.ctrl = true,
                "cmd" | "meta" | "super" => hotkey.meta = true,
                "alt" | "option" => hotkey.alt = true,
                "shift" => hotkey.shift = true,
                other => return Err(HotkeyError::UnknownModifier(other.to_string())),
            }
        }
        Ok(hotkey)
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [
            (self.primary, "Mod"),
            (self.ctrl, "Ctrl"),
            (self.meta, "Cmd"),
            (self.alt, "Alt"),
            (self.shift, "Shift"),
        ];
        for (_, name) in flags.iter().filter(|(on, _)| *on) {
            write!(f, "{name}+")?;
        }
        write!(f, "{}", self.key)
    }
}

impl FromStr for KeyEvent {
    type Err = HotkeyError;

    /// Parse a pressed combination written like a hotkey, e.g. `Ctrl+Shift+m`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('+').map(str::trim).filter(|p| !p.is_empty()).collect();
        let Some((key, modifiers)) = parts.split_last() else {
            return Err(HotkeyError::Empty);
        };

        let mut event = KeyEvent {
            key: (*key).to_string(),
            ..KeyEvent::default()
        };
        for modifier in modifiers {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => event.ctrl = true,
                "cmd" | "meta" | "super" => event.meta = true,
                "alt" | "option" => event.alt = true,
                "shift" => event.shift = true,
                other => return Err(HotkeyError::UnknownModifier(other.to_string())),
            }
        }
        Ok(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Installed,
    AlreadyActive,
}

/// Write-once hotkey registration.
#[derive(Debug, Default)]
pub struct HotkeyRegistry {
    hotkey: OnceLock<Hotkey>,
}

impl HotkeyRegistry {
    pub const fn new() -> Self {
        Self {
            hotkey: OnceLock::new(),
        }
    }

    /// Install `hotkey` unless one is already installed; always notifies
    /// [`Notice::Ready`].
    pub fn register(&self, hotkey: Hotkey, notifier: &dyn Notifier) -> Registration {
        let registration = match self.hotkey.set(hotkey) {
            Ok(()) => Registration::Installed,
            Err(_) => Registration::AlreadyActive,
        };
        debug!(?registration, hotkey = ?self.hotkey.get(), "hotkey registration");
        notifier.notify(Notice::Ready);
        registration
    }

    pub fn hotkey(&self) -> Option<&Hotkey> {
        self.hotkey.get()
    }

    /// `true` if a hotkey is registered and `event` matches it.
    pub fn is_trigger(&self, event: &KeyEvent) -> bool {
        self.hotkey.get().is_some_and(|h| h.matches(event))
    }
}

/// The process-wide registry.
pub fn global() -> &'static HotkeyRegistry {
    static REGISTRY: HotkeyRegistry = HotkeyRegistry::new();
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Count(Mutex<Vec<Notice>>);

    impl Notifier for Count {
        fn notify(&self, notice: Notice) {
            self.0.lock().unwrap().push(notice);
        }
    }

    fn event(s: &str) -> KeyEvent {
        s.parse().unwrap()
    }

    #[test]
    fn parses_default_binding() {
        let hotkey: Hotkey = "Mod+Shift+m".parse().unwrap();
        assert!(hotkey.primary && hotkey.shift && !hotkey.alt);
        assert_eq!(hotkey.key, 'M');
        assert_eq!(hotkey.to_string(), "Mod+Shift+M");
    }

    #[test]
    fn mod_matches_cmd_or_ctrl() {
        let hotkey: Hotkey = "Mod+Shift+M".parse().unwrap();
        assert!(hotkey.matches(&event("Cmd+Shift+M")));
        assert!(hotkey.matches(&event("Ctrl+Shift+m")));
        assert!(!hotkey.matches(&event("Shift+M")));
        assert!(!hotkey.matches(&event("Ctrl+M")));
        assert!(!hotkey.matches(&event("Ctrl+Shift+N")));
        assert!(!hotkey.matches(&event("Ctrl+Shift+Enter")));
    }

    #[test]
    fn rejects_bad_bindings() {
        assert_eq!("".parse::<Hotkey>(), Err(HotkeyError::Empty));
        assert_eq!("Hyper+M".parse::<Hotkey>(), Err(HotkeyError::UnknownModifier("hyper".into())));
        assert_eq!("Ctrl+Home".parse::<Hotkey>(), Err(HotkeyError::BadKey("Home".into())));
    }

    #[test]
    fn second_registration_only_repeats_ready() {
        let registry = HotkeyRegistry::new();
        let notifier = Count::default();

        let first = registry.register("Mod+Shift+M".parse().unwrap(), &notifier);
        let second = registry.register("Ctrl+Alt+X".parse().unwrap(), &notifier);

        assert_eq!(first, Registration::Installed);
        assert_eq!(second, Registration::AlreadyActive);
        assert_eq!(registry.hotkey().unwrap().key, 'M');
        assert_eq!(notifier.0.lock().unwrap().as_slice(), [Notice::Ready, Notice::Ready]);
        assert!(registry.is_trigger(&event("Ctrl+Shift+M")));
        assert!(!registry.is_trigger(&event("Ctrl+Alt+X")));
    }

    #[test]
    fn unregistered_registry_never_triggers() {
        assert!(!HotkeyRegistry::new().is_trigger(&event("Ctrl+Shift+M")));
    }
}
