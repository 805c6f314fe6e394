//! Host lifecycle events consumed by the tracker.

use serde::{Deserialize, Serialize};
use vt_core::{TabId, WindowId};

/// Load state reported by tab-updated events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabStatus {
    Loading,
    Complete,
}

/// Host idle detector state.
///
/// The detection threshold is host-side configuration; the tracker only sees
/// the resulting transitions. `Idle` and `Locked` both pause active time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleState {
    Active,
    Idle,
    Locked,
}

impl IdleState {
    #[must_use]
    pub const fn is_user_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// A lifecycle event emitted by the browser host.
///
/// Tagged serde representation so replayable event logs stay line-oriented
/// and human-readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// A tab became the selected tab in its window.
    TabActivated { tab: TabId, window: WindowId },
    /// Tab metadata changed: a load progressed and/or the title updated.
    TabUpdated {
        tab: TabId,
        window: WindowId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<TabStatus>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    /// A tab was closed.
    TabRemoved { tab: TabId },
    /// Focus moved to another window, or left the browser entirely (`None`).
    WindowFocusChanged {
        #[serde(default)]
        window: Option<WindowId>,
    },
    /// The host idle detector changed state.
    IdleStateChanged { state: IdleState },
    /// A top-level navigation finished loading. Only `frame == 0` is consumed.
    NavigationCompleted {
        tab: TabId,
        window: WindowId,
        frame: u32,
        url: String,
    },
    /// A link in `source_tab` opened `new_tab`.
    NavigationTargetCreated { source_tab: TabId, new_tab: TabId },
}
