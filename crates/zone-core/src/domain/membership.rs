//! Managed window membership tracker.
//!
//! Maintains the ordered set of windows currently subject to automatic
//! tiling.  Each window is in one of two states, `unmanaged` or `managed`;
//! transitions are driven by window lifecycle events delivered by the
//! platform event source and by explicit user selection.
//!
//! Ordering is tiling priority: the first entry is the "master" in the
//! two- and three-window layouts.  All transitions are idempotent —
//! re-delivering an event with unchanged geometry reports
//! [`MembershipChange::Unchanged`] so the caller never triggers a
//! redundant retile.

use tracing::debug;

use super::geometry::Rect;
use super::tiling::WindowId;

/// The per-window facts the manageability predicate consumes, captured
/// from the live window table at event time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub id: WindowId,
    pub title: String,
    /// Current bounding rectangle in virtual-screen coordinates.
    pub rect: Rect,
    pub visible: bool,
    /// `true` when the window is owned by another window (tool windows,
    /// dialogs); owned windows are never auto-managed.
    pub has_owner: bool,
}

/// Outcome of a membership transition, consumed by the retile trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Added,
    Removed,
    Unchanged,
}

impl MembershipChange {
    /// `true` when the managed set changed and a retile is needed.
    pub fn needs_retile(&self) -> bool {
        !matches!(self, MembershipChange::Unchanged)
    }
}

/// Decides whether a window is eligible for automatic management.
///
/// Excludes invisible windows, untitled windows (desktop shell internals),
/// owned windows, and windows whose rect exactly matches a monitor
/// rectangle (full-screen or maximized-to-monitor surfaces that must not
/// be captured accidentally).
pub fn is_manageable(snapshot: &WindowSnapshot, monitor_rects: &[Rect]) -> bool {
    snapshot.visible
        && !snapshot.title.is_empty()
        && !snapshot.has_owner
        && !monitor_rects.iter().any(|m| *m == snapshot.rect)
}

/// The ordered, duplicate-free set of managed window handles.
///
/// Persists for the lifetime of "tiling enabled"; cleared entirely when
/// tiling is disabled.
#[derive(Debug, Default, Clone)]
pub struct ManagedWindowSet {
    order: Vec<WindowId>,
}

impl ManagedWindowSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.order.contains(&id)
    }

    /// Copy of the current membership in tiling priority order. Retiling
    /// operates on this snapshot so no lock is held during OS calls.
    pub fn snapshot(&self) -> Vec<WindowId> {
        self.order.clone()
    }

    /// Drops every member (tiling disabled).
    pub fn clear(&mut self) {
        self.order.clear();
    }

    /// Explicit user selection: adds the window regardless of geometry.
    pub fn select(&mut self, id: WindowId) -> MembershipChange {
        if self.contains(id) {
            return MembershipChange::Unchanged;
        }
        self.order.push(id);
        debug!(window = id.as_raw(), "window selected into managed set");
        MembershipChange::Added
    }

    /// Explicit user deselection: authoritative over automatic tracking.
    /// The window stays out until its automatic trigger fires again.
    pub fn deselect(&mut self, id: WindowId) -> MembershipChange {
        self.remove(id)
    }

    /// A "window shown" notification arrived for `snapshot`.
    pub fn on_window_shown(
        &mut self,
        snapshot: &WindowSnapshot,
        tiling_rect: Option<Rect>,
        monitor_rects: &[Rect],
    ) -> MembershipChange {
        self.try_auto_add(snapshot, tiling_rect, monitor_rects)
    }

    /// A "move/resize completed" notification arrived for `snapshot`.
    ///
    /// A managed window whose center left the tiling rect is removed; an
    /// unmanaged window whose center entered it (and which passes the
    /// manageability predicate) is added.
    pub fn on_move_resize_ended(
        &mut self,
        snapshot: &WindowSnapshot,
        tiling_rect: Option<Rect>,
        monitor_rects: &[Rect],
    ) -> MembershipChange {
        if self.contains(snapshot.id) {
            let inside = tiling_rect
                .map(|zone| {
                    let (cx, cy) = snapshot.rect.center();
                    zone.contains_point(cx, cy)
                })
                .unwrap_or(false);
            if inside {
                MembershipChange::Unchanged
            } else {
                self.remove(snapshot.id)
            }
        } else {
            self.try_auto_add(snapshot, tiling_rect, monitor_rects)
        }
    }

    /// A "window hidden" or "window destroyed" notification arrived.
    pub fn on_window_gone(&mut self, id: WindowId) -> MembershipChange {
        self.remove(id)
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn try_auto_add(
        &mut self,
        snapshot: &WindowSnapshot,
        tiling_rect: Option<Rect>,
        monitor_rects: &[Rect],
    ) -> MembershipChange {
        if self.contains(snapshot.id) {
            return MembershipChange::Unchanged;
        }
        let Some(zone) = tiling_rect else {
            return MembershipChange::Unchanged;
        };
        let (cx, cy) = snapshot.rect.center();
        if !zone.contains_point(cx, cy) || !is_manageable(snapshot, monitor_rects) {
            return MembershipChange::Unchanged;
        }
        self.order.push(snapshot.id);
        debug!(
            window = snapshot.id.as_raw(),
            title = %snapshot.title,
            "window entered managed set"
        );
        MembershipChange::Added
    }

    fn remove(&mut self, id: WindowId) -> MembershipChange {
        let before = self.order.len();
        self.order.retain(|w| *w != id);
        if self.order.len() == before {
            MembershipChange::Unchanged
        } else {
            debug!(window = id.as_raw(), "window left managed set");
            MembershipChange::Removed
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const ZONE: Rect = Rect { left: 0, top: 0, right: 960, bottom: 1080 };
    const MONITOR: Rect = Rect { left: 0, top: 0, right: 1920, bottom: 1080 };

    fn snap(raw: u64, rect: Rect) -> WindowSnapshot {
        WindowSnapshot {
            id: WindowId::from_raw(raw),
            title: format!("window-{raw}"),
            rect,
            visible: true,
            has_owner: false,
        }
    }

    fn inside_zone(raw: u64) -> WindowSnapshot {
        snap(raw, Rect::new(100, 100, 500, 500))
    }

    fn outside_zone(raw: u64) -> WindowSnapshot {
        snap(raw, Rect::new(1200, 100, 1800, 500))
    }

    // ── Manageability predicate ───────────────────────────────────────────────

    #[test]
    fn test_manageable_window_passes_predicate() {
        assert!(is_manageable(&inside_zone(1), &[MONITOR]));
    }

    #[test]
    fn test_hidden_window_is_not_manageable() {
        let mut s = inside_zone(1);
        s.visible = false;
        assert!(!is_manageable(&s, &[MONITOR]));
    }

    #[test]
    fn test_untitled_window_is_not_manageable() {
        let mut s = inside_zone(1);
        s.title.clear();
        assert!(!is_manageable(&s, &[MONITOR]));
    }

    #[test]
    fn test_owned_window_is_not_manageable() {
        let mut s = inside_zone(1);
        s.has_owner = true;
        assert!(!is_manageable(&s, &[MONITOR]));
    }

    #[test]
    fn test_window_matching_full_monitor_rect_is_not_manageable() {
        let s = snap(1, MONITOR);
        assert!(!is_manageable(&s, &[MONITOR]));
    }

    // ── Automatic transitions ─────────────────────────────────────────────────

    #[test]
    fn test_shown_window_inside_zone_is_added() {
        let mut set = ManagedWindowSet::new();
        let change = set.on_window_shown(&inside_zone(1), Some(ZONE), &[MONITOR]);
        assert_eq!(change, MembershipChange::Added);
        assert!(set.contains(WindowId::from_raw(1)));
    }

    #[test]
    fn test_shown_window_outside_zone_is_ignored() {
        let mut set = ManagedWindowSet::new();
        let change = set.on_window_shown(&outside_zone(1), Some(ZONE), &[MONITOR]);
        assert_eq!(change, MembershipChange::Unchanged);
        assert!(set.is_empty());
    }

    #[test]
    fn test_shown_window_ignored_when_tiling_disabled() {
        let mut set = ManagedWindowSet::new();
        let change = set.on_window_shown(&inside_zone(1), None, &[MONITOR]);
        assert_eq!(change, MembershipChange::Unchanged);
    }

    #[test]
    fn test_move_into_zone_adds_and_move_out_removes() {
        let mut set = ManagedWindowSet::new();

        assert_eq!(
            set.on_move_resize_ended(&inside_zone(1), Some(ZONE), &[MONITOR]),
            MembershipChange::Added
        );
        assert_eq!(
            set.on_move_resize_ended(&outside_zone(1), Some(ZONE), &[MONITOR]),
            MembershipChange::Removed
        );
        assert!(set.is_empty());
    }

    #[test]
    fn test_membership_transition_is_idempotent() {
        // Delivering the same "still inside" event twice produces at most
        // one retile trigger and leaves the set unchanged.
        let mut set = ManagedWindowSet::new();
        let s = inside_zone(1);

        let first = set.on_move_resize_ended(&s, Some(ZONE), &[MONITOR]);
        let second = set.on_move_resize_ended(&s, Some(ZONE), &[MONITOR]);

        assert_eq!(first, MembershipChange::Added);
        assert_eq!(second, MembershipChange::Unchanged);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_window_gone_removes_member_once() {
        let mut set = ManagedWindowSet::new();
        set.on_window_shown(&inside_zone(1), Some(ZONE), &[MONITOR]);

        assert_eq!(set.on_window_gone(WindowId::from_raw(1)), MembershipChange::Removed);
        assert_eq!(set.on_window_gone(WindowId::from_raw(1)), MembershipChange::Unchanged);
    }

    // ── Explicit selection ────────────────────────────────────────────────────

    #[test]
    fn test_select_adds_regardless_of_geometry() {
        let mut set = ManagedWindowSet::new();
        // Outside the zone, but the user asked for it explicitly.
        assert_eq!(set.select(WindowId::from_raw(9)), MembershipChange::Added);
        assert!(set.contains(WindowId::from_raw(9)));
    }

    #[test]
    fn test_select_is_idempotent() {
        let mut set = ManagedWindowSet::new();
        set.select(WindowId::from_raw(9));
        assert_eq!(set.select(WindowId::from_raw(9)), MembershipChange::Unchanged);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_deselect_removes_window_inside_zone() {
        // Manual deselection is authoritative even while the window is
        // geometrically inside the zone.
        let mut set = ManagedWindowSet::new();
        set.on_window_shown(&inside_zone(1), Some(ZONE), &[MONITOR]);

        assert_eq!(set.deselect(WindowId::from_raw(1)), MembershipChange::Removed);
        assert!(set.is_empty());
    }

    #[test]
    fn test_deselected_window_can_be_re_added_by_new_trigger() {
        let mut set = ManagedWindowSet::new();
        set.on_window_shown(&inside_zone(1), Some(ZONE), &[MONITOR]);
        set.deselect(WindowId::from_raw(1));

        // The automatic trigger fires again: the window comes back.
        let change = set.on_move_resize_ended(&inside_zone(1), Some(ZONE), &[MONITOR]);
        assert_eq!(change, MembershipChange::Added);
    }

    // ── Ordering ──────────────────────────────────────────────────────────────

    #[test]
    fn test_insertion_order_is_preserved_as_tiling_priority() {
        let mut set = ManagedWindowSet::new();
        set.on_window_shown(&inside_zone(3), Some(ZONE), &[MONITOR]);
        set.on_window_shown(&inside_zone(1), Some(ZONE), &[MONITOR]);
        set.on_window_shown(&inside_zone(2), Some(ZONE), &[MONITOR]);

        let order: Vec<u64> = set.snapshot().iter().map(|w| w.as_raw()).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn test_clear_empties_the_set() {
        let mut set = ManagedWindowSet::new();
        set.select(WindowId::from_raw(1));
        set.select(WindowId::from_raw(2));

        set.clear();

        assert!(set.is_empty());
        assert!(set.snapshot().is_empty());
    }
}
