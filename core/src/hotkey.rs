//! Hotkey tables: fixed mappings from key combinations to actions.
//!
//! Two disjoint tables exist per session. The always-active table is consulted
//! for every key event; the conditional table only while the overlay is visible.

use crate::config::ShortcutsConfig;
use crate::error::ConfigError;
use crate::keys::Binding;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Everything a global shortcut can trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    ToggleVisibility,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    ScrollUp,
    ScrollDown,
    Quit,
    Screenshot,
    Minimize,
    ClearChat,
    SendWithScreenshot,
    SendWithScreenshotFix,
}

impl Action {
    pub const ALL: [Action; 13] = [
        Action::ToggleVisibility,
        Action::MoveLeft,
        Action::MoveRight,
        Action::MoveUp,
        Action::MoveDown,
        Action::ScrollUp,
        Action::ScrollDown,
        Action::Quit,
        Action::Screenshot,
        Action::Minimize,
        Action::ClearChat,
        Action::SendWithScreenshot,
        Action::SendWithScreenshotFix,
    ];

    /// Whether the action fires on every OS auto-repeat while its key is held.
    pub fn repeats(self) -> bool {
        matches!(
            self,
            Action::MoveLeft
                | Action::MoveRight
                | Action::MoveUp
                | Action::MoveDown
                | Action::ScrollUp
                | Action::ScrollDown
        )
    }

    pub fn scope(self) -> Scope {
        match self {
            Action::ToggleVisibility => Scope::Always,
            _ => Scope::Conditional,
        }
    }
}

/// Which table a binding lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Always,
    /// Active only while the main window is visible.
    Conditional,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HotkeyEntry {
    pub action: Action,
    /// May fire repeatedly while held, rather than once per physical press.
    pub repeat: bool,
}

impl HotkeyEntry {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            repeat: action.repeats(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct HotkeyTable {
    entries: HashMap<Binding, HotkeyEntry>,
}

impl HotkeyTable {
    pub fn get(&self, binding: &Binding) -> Option<&HotkeyEntry> {
        self.entries.get(binding)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Binding, &HotkeyEntry)> {
        self.entries.iter()
    }
}

/// The always-active and conditional tables for one session.
#[derive(Clone, Debug, Default)]
pub struct HotkeyTables {
    always: HotkeyTable,
    conditional: HotkeyTable,
}

impl HotkeyTables {
    pub fn builder() -> HotkeyTablesBuilder {
        HotkeyTablesBuilder::default()
    }

    /// Builds both tables from the configured shortcut strings.
    ///
    /// Empty strings leave the action unbound; unparseable strings and
    /// combinations bound twice are rejected.
    pub fn from_config(shortcuts: &ShortcutsConfig) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        for action in Action::ALL {
            let shortcut = shortcuts.get(action).trim();
            if shortcut.is_empty() {
                continue;
            }
            let binding =
                Binding::parse(shortcut).ok_or_else(|| ConfigError::InvalidShortcut {
                    action,
                    shortcut: shortcut.to_string(),
                })?;
            builder.bind(action.scope(), binding, HotkeyEntry::new(action))?;
        }
        Ok(builder.build())
    }

    /// Looks up the always-active table first, then the conditional one if `visible`.
    pub fn lookup(&self, binding: &Binding, visible: bool) -> Option<HotkeyEntry> {
        self.always
            .get(binding)
            .or_else(|| visible.then(|| self.conditional.get(binding)).flatten())
            .copied()
    }

    pub fn always(&self) -> &HotkeyTable {
        &self.always
    }

    pub fn conditional(&self) -> &HotkeyTable {
        &self.conditional
    }
}

#[derive(Debug, Default)]
pub struct HotkeyTablesBuilder {
    tables: HotkeyTables,
}

impl HotkeyTablesBuilder {
    /// Adds a binding, refusing combinations already present in either table.
    pub fn bind(
        &mut self,
        scope: Scope,
        binding: Binding,
        entry: HotkeyEntry,
    ) -> Result<&mut Self, ConfigError> {
        let other = match scope {
            Scope::Always => &self.tables.conditional,
            Scope::Conditional => &self.tables.always,
        };
        if let Some(existing) = other.get(&binding) {
            return Err(duplicate(binding, existing.action, entry.action));
        }

        let table = match scope {
            Scope::Always => &mut self.tables.always,
            Scope::Conditional => &mut self.tables.conditional,
        };
        match table.entries.entry(binding) {
            Entry::Occupied(existing) => {
                Err(duplicate(binding, existing.get().action, entry.action))
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(self)
            }
        }
    }

    pub fn build(self) -> HotkeyTables {
        self.tables
    }
}

fn duplicate(binding: Binding, first: Action, second: Action) -> ConfigError {
    ConfigError::DuplicateBinding {
        shortcut: binding.to_string(),
        first,
        second,
    }
}
