//! Host lifecycle stages, and the declarative filter over them.
//!
//! Hosts move through coarse lifecycle stages (loading assets, sitting in a
//! menu, editing an assembly, running it live). Listeners can restrict
//! themselves to the stages where they make sense — an editor gizmo has no
//! business reacting to live telemetry.
//!
//! The bus stores the current [`Stage`] (the host updates it on
//! transitions) and tests each listener's [`StageMask`] at dispatch time.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Coarse host lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Assets and catalogs are still loading.
    Loading,
    /// Main menu or other non-assembly screens.
    Menu,
    /// An assembly is open for editing.
    Editor,
    /// An assembly is running live.
    Live,
}

bitflags! {
    /// Declarative filter over [`Stage`], attached to a listener at
    /// registration.
    ///
    /// # Example
    ///
    /// ```
    /// use trellis_types::{Stage, StageMask};
    ///
    /// let editor_only = StageMask::EDITOR;
    /// assert!(editor_only.permits(Stage::Editor));
    /// assert!(!editor_only.permits(Stage::Live));
    ///
    /// assert!(StageMask::ANY.permits(Stage::Loading));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct StageMask: u8 {
        /// Eligible while loading.
        const LOADING = 1 << 0;
        /// Eligible in menus.
        const MENU = 1 << 1;
        /// Eligible in the editor.
        const EDITOR = 1 << 2;
        /// Eligible while running live.
        const LIVE = 1 << 3;
        /// Eligible in every stage.
        const ANY = Self::LOADING.bits()
            | Self::MENU.bits()
            | Self::EDITOR.bits()
            | Self::LIVE.bits();
    }
}

impl StageMask {
    /// Returns `true` if the mask admits the given stage.
    #[must_use]
    pub fn permits(self, stage: Stage) -> bool {
        match stage {
            Stage::Loading => self.contains(Self::LOADING),
            Stage::Menu => self.contains(Self::MENU),
            Stage::Editor => self.contains(Self::EDITOR),
            Stage::Live => self.contains(Self::LIVE),
        }
    }
}

impl Default for StageMask {
    /// Listeners default to every stage.
    fn default() -> Self {
        Self::ANY
    }
}
