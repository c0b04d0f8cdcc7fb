//! Semantic game actions and the key-binding table that produces them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tactica_core::keys;
use tracing::debug;

use crate::keyboard::{KeyboardState, Modifiers};

/// Number of control groups addressable from the keyboard.
pub const GROUP_COUNT: u8 = 10;

/// Number of viewport bookmarks addressable from the keyboard.
pub const BOOKMARK_COUNT: u8 = 4;

/// Everything the player can ask for through the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameAction {
    /// Scroll the map up while held.
    ScrollUp,
    /// Scroll the map down while held.
    ScrollDown,
    /// Scroll the map left while held.
    ScrollLeft,
    /// Scroll the map right while held.
    ScrollRight,
    /// Multiply keyboard scroll speed while held.
    ScrollFast,
    /// Select every player unit.
    SelectAll,
    /// Select every visible unit sharing the primary selection's type.
    SelectType,
    /// Clear the selection.
    DeselectAll,
    /// Stop the selection.
    Stop,
    /// Guard in place.
    Guard,
    /// Attack-move toward the next clicked location.
    AttackMove,
    /// Scatter the selection.
    Scatter,
    /// Deploy or unload the selection.
    Deploy,
    /// Force-fire modifier held.
    ForceFire,
    /// Force-move modifier held.
    ForceMove,
    /// Recall control group `n`.
    GroupSelect(u8),
    /// Save the selection as control group `n`.
    GroupCreate(u8),
    /// Add the selection to control group `n`.
    GroupAdd(u8),
    /// Toggle sell mode.
    SellMode,
    /// Toggle repair mode.
    RepairMode,
    /// Toggle power mode.
    PowerMode,
    /// Toggle the radar.
    ToggleRadar,
    /// Toggle the sidebar.
    ToggleSidebar,
    /// Open the options menu.
    OptionsMenu,
    /// Open diplomacy.
    Diplomacy,
    /// Pause the game.
    Pause,
    /// Center the view on the base.
    CenterBase,
    /// Center the view on the selection.
    CenterSelection,
    /// Jump to bookmark `n`.
    Bookmark(u8),
    /// Store the view in bookmark `n`.
    SetBookmark(u8),
    /// Reveal the whole map.
    DebugRevealMap,
    /// Grant credits.
    DebugAddMoney,
    /// Finish construction instantly.
    DebugInstantBuild,
    /// Make the player's objects invulnerable.
    DebugGodMode,
}

impl GameAction {
    /// Returns `true` for actions that only respond while debug bindings are enabled.
    #[must_use]
    pub const fn is_debug(&self) -> bool {
        matches!(
            self,
            Self::DebugRevealMap | Self::DebugAddMoney | Self::DebugInstantBuild | Self::DebugGodMode
        )
    }

    /// Returns `true` for the continuous scroll actions.
    #[must_use]
    pub const fn is_scroll(&self) -> bool {
        matches!(
            self,
            Self::ScrollUp | Self::ScrollDown | Self::ScrollLeft | Self::ScrollRight | Self::ScrollFast
        )
    }
}

/// Key plus modifier requirements that produce an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    /// Virtual key code.
    pub key: u8,
    /// Modifiers that must be held.
    pub required: Modifiers,
    /// Modifiers that must not be held.
    pub excluded: Modifiers,
    /// Active while held instead of only on the press.
    pub continuous: bool,
}

impl KeyBinding {
    /// One-shot binding.
    #[must_use]
    pub const fn press(key: u8, required: Modifiers, excluded: Modifiers) -> Self {
        Self {
            key,
            required,
            excluded,
            continuous: false,
        }
    }

    /// Binding that stays active while the key is held.
    #[must_use]
    pub const fn hold(key: u8) -> Self {
        Self {
            key,
            required: Modifiers::empty(),
            excluded: Modifiers::empty(),
            continuous: true,
        }
    }

    fn matches(&self, keyboard: &KeyboardState, modifiers: Modifiers) -> bool {
        let modifiers_ok =
            modifiers.contains(self.required) && !modifiers.intersects(self.excluded);
        let key_ok = if self.continuous {
            keyboard.is_down(self.key)
        } else {
            keyboard.was_pressed(self.key)
        };
        modifiers_ok && key_ok
    }
}

/// Replacement binding supplied through configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingOverride {
    /// Action being rebound.
    pub action: GameAction,
    /// New key code.
    pub key: u8,
    /// New required modifiers.
    #[serde(default)]
    pub modifiers: Modifiers,
}

/// Translates keyboard state into per-frame action state.
#[derive(Clone, Debug)]
pub struct InputMapper {
    bindings: BTreeMap<GameAction, KeyBinding>,
    active: BTreeSet<GameAction>,
    previous: BTreeSet<GameAction>,
    debug_enabled: bool,
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::new(false)
    }
}

impl InputMapper {
    /// Creates a mapper with the classic default layout.
    #[must_use]
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            bindings: default_bindings(),
            active: BTreeSet::new(),
            previous: BTreeSet::new(),
            debug_enabled,
        }
    }

    /// Re-evaluates every binding against the keyboard snapshot.
    pub fn evaluate(&mut self, keyboard: &KeyboardState) {
        let modifiers = keyboard.modifiers();
        self.previous = std::mem::take(&mut self.active);
        for (action, binding) in &self.bindings {
            if action.is_debug() && !self.debug_enabled {
                continue;
            }
            if binding.matches(keyboard, modifiers) {
                let _ = self.active.insert(*action);
            }
        }
    }

    /// Drops all action state, for example while text entry owns the keyboard.
    pub fn clear(&mut self) {
        self.previous = std::mem::take(&mut self.active);
    }

    /// Returns `true` while the action is active this frame.
    #[must_use]
    pub fn is_active(&self, action: GameAction) -> bool {
        self.active.contains(&action)
    }

    /// Returns `true` on the frame the action became active.
    #[must_use]
    pub fn triggered(&self, action: GameAction) -> bool {
        self.active.contains(&action) && !self.previous.contains(&action)
    }

    /// Returns `true` on the frame the action stopped being active.
    #[must_use]
    pub fn released(&self, action: GameAction) -> bool {
        !self.active.contains(&action) && self.previous.contains(&action)
    }

    /// Every action triggered this frame in catalog order.
    pub fn triggered_actions(&self) -> impl Iterator<Item = GameAction> + '_ {
        self.active
            .iter()
            .copied()
            .filter(|action| !self.previous.contains(action))
    }

    /// Control group recalled this frame, if any.
    #[must_use]
    pub fn triggered_group_select(&self) -> Option<u8> {
        self.triggered_actions().find_map(|action| match action {
            GameAction::GroupSelect(group) => Some(group),
            _ => None,
        })
    }

    /// Control group saved this frame, if any.
    #[must_use]
    pub fn triggered_group_create(&self) -> Option<u8> {
        self.triggered_actions().find_map(|action| match action {
            GameAction::GroupCreate(group) => Some(group),
            _ => None,
        })
    }

    /// Control group extended this frame, if any.
    #[must_use]
    pub fn triggered_group_add(&self) -> Option<u8> {
        self.triggered_actions().find_map(|action| match action {
            GameAction::GroupAdd(group) => Some(group),
            _ => None,
        })
    }

    /// Binding currently assigned to the action.
    #[must_use]
    pub fn binding(&self, action: GameAction) -> Option<&KeyBinding> {
        self.bindings.get(&action)
    }

    /// Assigns a new key and required modifiers to the action.
    ///
    /// Excluded modifiers and the hold behaviour of an existing binding are kept.
    pub fn rebind(&mut self, action: GameAction, key: u8, modifiers: Modifiers) {
        let binding = self
            .bindings
            .entry(action)
            .or_insert_with(|| KeyBinding::press(key, modifiers, Modifiers::empty()));
        binding.key = key;
        binding.required = modifiers;
        debug!(?action, key, ?modifiers, "action rebound");
    }

    /// Applies configured overrides in order.
    pub fn apply_overrides(&mut self, overrides: &[BindingOverride]) {
        for entry in overrides {
            self.rebind(entry.action, entry.key, entry.modifiers);
        }
    }

    /// Restores the default layout.
    pub fn reset_defaults(&mut self) {
        self.bindings = default_bindings();
    }

    /// Action already bound to exactly this key and modifier combination.
    #[must_use]
    pub fn has_conflict(&self, key: u8, modifiers: Modifiers) -> Option<GameAction> {
        self.bindings
            .iter()
            .find(|(_, binding)| binding.key == key && binding.required == modifiers)
            .map(|(action, _)| *action)
    }

    /// Enables or disables the debug actions.
    pub fn set_debug_enabled(&mut self, enabled: bool) {
        self.debug_enabled = enabled;
    }

    /// Whether debug actions respond.
    #[must_use]
    pub const fn is_debug_enabled(&self) -> bool {
        self.debug_enabled
    }
}

fn default_bindings() -> BTreeMap<GameAction, KeyBinding> {
    let none = Modifiers::empty();
    let plain = Modifiers::CTRL | Modifiers::SHIFT;
    let mut bindings = BTreeMap::new();
    let mut bind = |action, binding| {
        let _ = bindings.insert(action, binding);
    };

    bind(GameAction::ScrollUp, KeyBinding::hold(keys::UP));
    bind(GameAction::ScrollDown, KeyBinding::hold(keys::DOWN));
    bind(GameAction::ScrollLeft, KeyBinding::hold(keys::LEFT));
    bind(GameAction::ScrollRight, KeyBinding::hold(keys::RIGHT));
    bind(GameAction::ScrollFast, KeyBinding::hold(keys::SHIFT));
    bind(GameAction::ForceFire, KeyBinding::hold(keys::CONTROL));
    bind(GameAction::ForceMove, KeyBinding::hold(keys::ALT));

    bind(
        GameAction::SelectAll,
        KeyBinding::press(keys::letter('a'), Modifiers::CTRL, none),
    );
    bind(GameAction::SelectType, KeyBinding::press(keys::letter('t'), none, plain));
    bind(GameAction::DeselectAll, KeyBinding::press(keys::ESCAPE, none, plain));

    bind(GameAction::Stop, KeyBinding::press(keys::letter('s'), none, plain));
    bind(GameAction::Guard, KeyBinding::press(keys::letter('g'), none, plain));
    bind(GameAction::AttackMove, KeyBinding::press(keys::letter('a'), none, plain));
    bind(GameAction::Scatter, KeyBinding::press(keys::letter('x'), none, plain));
    bind(GameAction::Deploy, KeyBinding::press(keys::letter('d'), none, plain));

    for group in 0..GROUP_COUNT {
        let key = keys::digit(group);
        bind(GameAction::GroupSelect(group), KeyBinding::press(key, none, plain));
        bind(
            GameAction::GroupCreate(group),
            KeyBinding::press(key, Modifiers::CTRL, Modifiers::SHIFT),
        );
        bind(
            GameAction::GroupAdd(group),
            KeyBinding::press(key, Modifiers::SHIFT, Modifiers::CTRL),
        );
    }

    bind(GameAction::SellMode, KeyBinding::press(keys::letter('z'), none, plain));
    bind(GameAction::RepairMode, KeyBinding::press(keys::letter('r'), none, plain));
    bind(GameAction::PowerMode, KeyBinding::press(keys::letter('p'), none, plain));

    bind(GameAction::ToggleRadar, KeyBinding::press(keys::TAB, none, plain));
    bind(GameAction::ToggleSidebar, KeyBinding::press(keys::function(1), none, plain));
    bind(GameAction::OptionsMenu, KeyBinding::press(keys::ESCAPE, none, plain));
    bind(GameAction::Diplomacy, KeyBinding::press(keys::function(2), none, plain));
    bind(GameAction::Pause, KeyBinding::press(keys::PAUSE, none, none));

    bind(GameAction::CenterBase, KeyBinding::press(keys::letter('h'), none, plain));
    bind(GameAction::CenterSelection, KeyBinding::press(keys::SPACE, none, plain));
    for slot in 0..BOOKMARK_COUNT {
        let key = keys::function(5 + slot);
        bind(
            GameAction::Bookmark(slot),
            KeyBinding::press(key, none, Modifiers::CTRL),
        );
        bind(
            GameAction::SetBookmark(slot),
            KeyBinding::press(key, Modifiers::CTRL, none),
        );
    }

    bind(
        GameAction::DebugRevealMap,
        KeyBinding::press(keys::letter('r'), plain, none),
    );
    bind(
        GameAction::DebugAddMoney,
        KeyBinding::press(keys::letter('m'), plain, none),
    );
    bind(
        GameAction::DebugInstantBuild,
        KeyBinding::press(keys::letter('b'), plain, none),
    );
    bind(
        GameAction::DebugGodMode,
        KeyBinding::press(keys::letter('g'), plain, none),
    );

    bindings
}
