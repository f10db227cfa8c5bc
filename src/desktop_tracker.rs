//! Per-desktop focus memory and wallpaper selection.
//!
//! The tracker follows the host's desktop ordering: slot `i` of the focus
//! table belongs to the desktop at ordinal `i`. Every slot also records the
//! desktop's stable id so focus memory can survive a reordering of the list
//! when desktops are added or removed.

use crate::error::AppError;
use crate::wallpaper::{select_wallpaper, WallpaperSetter};
use log::{debug, info};

/// Stable identity of a virtual desktop (its GUID on Windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DesktopId(pub u128);

/// Raw native window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

/// Enumeration and switching of virtual desktops.
pub trait DesktopHost {
    /// All desktops in the host's current order.
    fn desktops(&self) -> Result<Vec<DesktopId>, AppError>;
    fn current(&self) -> Result<DesktopId, AppError>;
    fn switch_to(&mut self, desktop: DesktopId) -> Result<(), AppError>;
}

/// Access to the OS foreground window.
pub trait WindowFocus {
    fn foreground(&self) -> Option<WindowHandle>;
    fn activate(&mut self, window: WindowHandle);
}

/// What happens to remembered windows when the desktop count changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusRetention {
    /// Forget every desktop's window.
    ClearAll,
    /// Keep the window of every desktop that still exists.
    KeepSurviving,
}

impl FocusRetention {
    pub fn from_setting(keep_focus: bool) -> Self {
        if keep_focus {
            FocusRetention::KeepSurviving
        } else {
            FocusRetention::ClearAll
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FocusSlot {
    desktop: DesktopId,
    window: Option<WindowHandle>,
}

/// Last focused window per desktop, one slot per desktop in host order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FocusTable {
    slots: Vec<FocusSlot>,
}

impl FocusTable {
    /// Replace the table with one slot per entry of `desktops`.
    pub fn rebuild(&mut self, desktops: &[DesktopId], retention: FocusRetention) {
        let previous = std::mem::take(&mut self.slots);
        self.slots = desktops
            .iter()
            .map(|&desktop| {
                let window = match retention {
                    FocusRetention::ClearAll => None,
                    FocusRetention::KeepSurviving => previous
                        .iter()
                        .find(|slot| slot.desktop == desktop)
                        .and_then(|slot| slot.window),
                };
                FocusSlot { desktop, window }
            })
            .collect();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<WindowHandle> {
        self.slots.get(ordinal).and_then(|slot| slot.window)
    }

    /// Store `window` at `ordinal`. Out-of-range ordinals are ignored.
    pub fn set(&mut self, ordinal: usize, window: Option<WindowHandle>) {
        if let Some(slot) = self.slots.get_mut(ordinal) {
            slot.window = window;
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.slots.iter().all(|slot| slot.window.is_none())
    }
}

/// Keeps focus memory and wallpaper in sync with desktop switches and
/// drives cyclic desktop navigation.
pub struct DesktopIndexTracker<H, F, W> {
    host: H,
    focus: F,
    wallpaper: W,
    desktops: Vec<DesktopId>,
    table: FocusTable,
    wallpapers: Vec<String>,
    retention: FocusRetention,
}

impl<H, F, W> DesktopIndexTracker<H, F, W>
where
    H: DesktopHost,
    F: WindowFocus,
    W: WallpaperSetter,
{
    pub fn new(host: H, focus: F, wallpaper: W, retention: FocusRetention) -> Self {
        Self {
            host,
            focus,
            wallpaper,
            desktops: Vec::new(),
            table: FocusTable::default(),
            wallpapers: Vec::new(),
            retention,
        }
    }

    /// Build the focus table and remember the window focused right now.
    /// Returns the current ordinal.
    pub fn start(&mut self) -> Result<usize, AppError> {
        self.on_desktop_count_changed()?;
        let ordinal = self.current_ordinal()?;
        self.capture_focus(Some(ordinal))?;
        Ok(ordinal)
    }

    /// Re-read the desktop list and size the focus table to it.
    pub fn on_desktop_count_changed(&mut self) -> Result<(), AppError> {
        let desktops = self.host.desktops()?;
        self.table.rebuild(&desktops, self.retention);
        info!(
            "Desktop list changed: {} desktop{}",
            desktops.len(),
            if desktops.len() == 1 { "" } else { "s" }
        );
        self.desktops = desktops;
        Ok(())
    }

    /// Re-read the desktop order after a desktop was moved. The count is
    /// unchanged, so every remembered window follows its desktop to the new
    /// ordinal whatever the retention policy.
    pub fn on_desktops_reordered(&mut self) -> Result<(), AppError> {
        let desktops = self.host.desktops()?;
        self.table.rebuild(&desktops, FocusRetention::KeepSurviving);
        debug!("Desktop order changed");
        self.desktops = desktops;
        Ok(())
    }

    /// React to the host reporting a new current desktop: apply its
    /// wallpaper and give focus back to the window it last had.
    pub fn on_desktop_activated(&mut self, hint: Option<usize>) -> Result<usize, AppError> {
        let current = self.host.current()?;
        let ordinal = match hint {
            Some(i) if self.desktops.get(i) == Some(&current) => i,
            _ => self.resolve_ordinal(current)?,
        };

        if let Some(path) = select_wallpaper(&self.wallpapers, ordinal) {
            self.wallpaper.set_wallpaper(path);
        }

        match self.table.get(ordinal) {
            Some(window) if !window.is_null() => {
                debug!("Restoring focus to {:?} on desktop {}", window, ordinal + 1);
                self.focus.activate(window);
            }
            _ => debug!("No remembered window for desktop {}", ordinal + 1),
        }

        Ok(ordinal)
    }

    /// Remember the foreground window for `ordinal`, or for the current
    /// desktop when no ordinal is given.
    pub fn capture_focus(&mut self, ordinal: Option<usize>) -> Result<(), AppError> {
        let ordinal = match ordinal {
            Some(i) => i,
            None => self.current_ordinal()?,
        };
        let window = self.focus.foreground();
        debug!("Captured {:?} for desktop {}", window, ordinal + 1);
        self.table.set(ordinal, window);
        Ok(())
    }

    pub fn switch_right(&mut self) -> Result<(), AppError> {
        let ordinal = self.current_ordinal()?;
        self.capture_focus(Some(ordinal))?;
        let target = (ordinal + 1) % self.desktops.len();
        self.host.switch_to(self.desktops[target])
    }

    pub fn switch_left(&mut self) -> Result<(), AppError> {
        let ordinal = self.current_ordinal()?;
        self.capture_focus(Some(ordinal))?;
        let count = self.desktops.len();
        let target = (ordinal + count - 1) % count;
        self.host.switch_to(self.desktops[target])
    }

    /// Switch to the desktop at `target`. Out-of-range or already-current
    /// targets are ignored; returns whether a switch was requested.
    pub fn switch_to_ordinal(&mut self, target: usize) -> Result<bool, AppError> {
        let ordinal = self.current_ordinal()?;
        self.capture_focus(Some(ordinal))?;
        if target >= self.desktops.len() || target == ordinal {
            debug!("Ignoring switch to ordinal {} (current {})", target, ordinal);
            return Ok(false);
        }
        self.host.switch_to(self.desktops[target])?;
        Ok(true)
    }

    pub fn current_ordinal(&mut self) -> Result<usize, AppError> {
        let current = self.host.current()?;
        self.resolve_ordinal(current)
    }

    pub fn set_wallpapers(&mut self, wallpapers: Vec<String>) {
        self.wallpapers = wallpapers;
    }

    pub fn set_retention(&mut self, retention: FocusRetention) {
        self.retention = retention;
    }

    pub fn desktop_count(&self) -> usize {
        self.desktops.len()
    }

    pub fn focus_table(&self) -> &FocusTable {
        &self.table
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn focus(&self) -> &F {
        &self.focus
    }

    pub fn wallpaper(&self) -> &W {
        &self.wallpaper
    }

    #[cfg(test)]
    pub(crate) fn focus_mut(&mut self) -> &mut F {
        &mut self.focus
    }

    #[cfg(test)]
    pub(crate) fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    // A current desktop missing from the known list means a create/destroy
    // notification was missed; refresh once before giving up.
    fn resolve_ordinal(&mut self, current: DesktopId) -> Result<usize, AppError> {
        if let Some(i) = self.desktops.iter().position(|&d| d == current) {
            return Ok(i);
        }
        self.on_desktop_count_changed()?;
        self.desktops
            .iter()
            .position(|&d| d == current)
            .ok_or(AppError::UnknownDesktop)
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;

    fn host_mut(tracker: &mut FakeTracker) -> &mut FakeHost {
        &mut tracker.host
    }

    fn focus_mut(tracker: &mut FakeTracker) -> &mut FakeFocus {
        tracker.focus_mut()
    }

    #[test]
    fn start_sizes_table_and_captures_focus() {
        let mut t = tracker(3, FocusRetention::ClearAll);
        focus_mut(&mut t).foreground = Some(WindowHandle(11));
        assert_eq!(t.start().unwrap(), 0);
        assert_eq!(t.focus_table().len(), 3);
        assert_eq!(t.focus_table().get(0), Some(WindowHandle(11)));
    }

    #[test]
    fn count_change_clears_every_slot_under_clear_all() {
        let mut t = tracker(2, FocusRetention::ClearAll);
        t.start().unwrap();
        for n in [3u128, 5, 1, 4] {
            for i in 0..t.desktop_count() {
                focus_mut(&mut t).foreground = Some(WindowHandle(100 + i as isize));
                t.capture_focus(Some(i)).unwrap();
            }
            host_mut(&mut t).desktops = (1..=n).map(DesktopId).collect();
            host_mut(&mut t).current = 0;
            t.on_desktop_count_changed().unwrap();
            assert_eq!(t.focus_table().len(), n as usize);
            assert!(t.focus_table().is_cleared());
        }
    }

    #[test]
    fn count_change_keeps_surviving_desktops() {
        let mut t = tracker(3, FocusRetention::KeepSurviving);
        t.start().unwrap();
        focus_mut(&mut t).foreground = Some(WindowHandle(20));
        t.capture_focus(Some(1)).unwrap();
        focus_mut(&mut t).foreground = Some(WindowHandle(30));
        t.capture_focus(Some(2)).unwrap();

        // Desktop 1 destroyed; desktop 3 now sits at ordinal 1.
        host_mut(&mut t).desktops = vec![DesktopId(2), DesktopId(3)];
        t.on_desktop_count_changed().unwrap();

        assert_eq!(t.focus_table().len(), 2);
        assert_eq!(t.focus_table().get(0), Some(WindowHandle(20)));
        assert_eq!(t.focus_table().get(1), Some(WindowHandle(30)));

        host_mut(&mut t).desktops.push(DesktopId(9));
        t.on_desktop_count_changed().unwrap();
        assert_eq!(t.focus_table().len(), 3);
        assert_eq!(t.focus_table().get(2), None);
    }

    #[test]
    fn reorder_moves_remembered_windows_with_their_desktops() {
        let mut t = tracker(3, FocusRetention::ClearAll);
        t.start().unwrap();
        focus_mut(&mut t).foreground = Some(WindowHandle(10));
        t.capture_focus(Some(0)).unwrap();
        focus_mut(&mut t).foreground = Some(WindowHandle(30));
        t.capture_focus(Some(2)).unwrap();

        // Desktop 3 dragged to the front.
        host_mut(&mut t).desktops = vec![DesktopId(3), DesktopId(1), DesktopId(2)];
        t.on_desktops_reordered().unwrap();

        assert_eq!(t.focus_table().len(), 3);
        assert_eq!(t.focus_table().get(0), Some(WindowHandle(30)));
        assert_eq!(t.focus_table().get(1), Some(WindowHandle(10)));
        assert_eq!(t.focus_table().get(2), None);
    }

    #[test]
    fn activation_applies_wallpaper_by_modulo() {
        let mut t = tracker(5, FocusRetention::ClearAll);
        t.set_wallpapers(vec!["a.jpg".into(), "b.jpg".into()]);
        t.start().unwrap();
        for ordinal in 0..5 {
            host_mut(&mut t).current = ordinal;
            assert_eq!(t.on_desktop_activated(None).unwrap(), ordinal);
        }
        assert_eq!(
            t.wallpaper().applied,
            vec!["a.jpg", "b.jpg", "a.jpg", "b.jpg", "a.jpg"]
        );
    }

    #[test]
    fn activation_without_wallpapers_leaves_wallpaper_alone() {
        let mut t = tracker(3, FocusRetention::ClearAll);
        t.start().unwrap();
        host_mut(&mut t).current = 2;
        t.on_desktop_activated(None).unwrap();
        assert!(t.wallpaper().applied.is_empty());
    }

    #[test]
    fn activation_restores_remembered_window_only() {
        let mut t = tracker(2, FocusRetention::ClearAll);
        focus_mut(&mut t).foreground = Some(WindowHandle(7));
        t.start().unwrap();

        host_mut(&mut t).current = 1;
        t.on_desktop_activated(None).unwrap();
        assert!(t.focus().activated.is_empty());

        host_mut(&mut t).current = 0;
        t.on_desktop_activated(None).unwrap();
        assert_eq!(t.focus().activated, vec![WindowHandle(7)]);
    }

    #[test]
    fn activation_skips_null_handle() {
        let mut t = tracker(2, FocusRetention::ClearAll);
        focus_mut(&mut t).foreground = Some(WindowHandle(0));
        t.start().unwrap();
        t.on_desktop_activated(None).unwrap();
        assert!(t.focus().activated.is_empty());
    }

    #[test]
    fn stale_hint_falls_back_to_scan() {
        let mut t = tracker(3, FocusRetention::ClearAll);
        t.start().unwrap();
        host_mut(&mut t).current = 2;
        assert_eq!(t.on_desktop_activated(Some(0)).unwrap(), 2);
        assert_eq!(t.on_desktop_activated(Some(2)).unwrap(), 2);
    }

    #[test]
    fn unknown_current_desktop_refreshes_list() {
        let mut t = tracker(2, FocusRetention::ClearAll);
        t.start().unwrap();
        host_mut(&mut t).desktops.push(DesktopId(42));
        host_mut(&mut t).current = 2;
        assert_eq!(t.on_desktop_activated(None).unwrap(), 2);
        assert_eq!(t.focus_table().len(), 3);
    }

    #[test]
    fn switch_right_wraps_to_first() {
        let mut t = tracker(3, FocusRetention::ClearAll);
        t.start().unwrap();
        t.switch_right().unwrap();
        assert_eq!(host_mut(&mut t).current, 1);
        t.switch_right().unwrap();
        assert_eq!(host_mut(&mut t).current, 2);
        t.switch_right().unwrap();
        assert_eq!(host_mut(&mut t).current, 0);
    }

    #[test]
    fn switch_left_wraps_to_last() {
        let mut t = tracker(3, FocusRetention::ClearAll);
        t.start().unwrap();
        t.switch_left().unwrap();
        assert_eq!(host_mut(&mut t).current, 2);
        t.switch_left().unwrap();
        assert_eq!(host_mut(&mut t).current, 1);
    }

    #[test]
    fn single_desktop_switches_to_itself() {
        let mut t = tracker(1, FocusRetention::ClearAll);
        t.start().unwrap();
        t.switch_right().unwrap();
        t.switch_left().unwrap();
        assert_eq!(t.host().switches, vec![DesktopId(1), DesktopId(1)]);
    }

    #[test]
    fn switch_captures_window_being_left() {
        let mut t = tracker(2, FocusRetention::ClearAll);
        t.start().unwrap();
        focus_mut(&mut t).foreground = Some(WindowHandle(55));
        t.switch_right().unwrap();
        assert_eq!(t.focus_table().get(0), Some(WindowHandle(55)));
    }

    #[test]
    fn switch_to_ordinal_ignores_current_and_out_of_range() {
        let mut t = tracker(3, FocusRetention::ClearAll);
        t.start().unwrap();
        assert!(!t.switch_to_ordinal(0).unwrap());
        assert!(!t.switch_to_ordinal(3).unwrap());
        assert!(!t.switch_to_ordinal(usize::MAX).unwrap());
        assert!(t.host().switches.is_empty());

        assert!(t.switch_to_ordinal(2).unwrap());
        assert_eq!(t.host().switches, vec![DesktopId(3)]);
    }

    #[test]
    fn retention_from_setting() {
        assert_eq!(FocusRetention::from_setting(true), FocusRetention::KeepSurviving);
        assert_eq!(FocusRetention::from_setting(false), FocusRetention::ClearAll);
    }
}
