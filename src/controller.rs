use crate::desktop_tracker::{DesktopHost, DesktopIndexTracker, FocusRetention, WindowFocus};
use crate::error::AppError;
use crate::hotkey::{command_for_id, DesktopCommand, HotkeyMode, HotkeyRegistrar, HotkeySet};
use crate::settings::Settings;
use crate::wallpaper::WallpaperSetter;
use log::{debug, info, warn};

/// Desktop notifications, as far as the tracker cares about them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopSignal {
    Created,
    Destroyed,
    /// A desktop changed position in the ordering.
    Moved,
    Activated,
}

/// Owns the tracker, the hotkeys and the live settings. Every event and
/// command enters the application through here.
pub struct Controller<H, F, W, R> {
    tracker: DesktopIndexTracker<H, F, W>,
    hotkeys: HotkeySet,
    registrar: R,
    settings: Settings,
}

impl<H, F, W, R> Controller<H, F, W, R>
where
    H: DesktopHost,
    F: WindowFocus,
    W: WallpaperSetter,
    R: HotkeyRegistrar,
{
    pub fn new(host: H, focus: F, wallpaper: W, registrar: R, settings: Settings) -> Self {
        let mut tracker = DesktopIndexTracker::new(
            host,
            focus,
            wallpaper,
            FocusRetention::from_setting(settings.keep_focus_on_desktop_change),
        );
        tracker.set_wallpapers(settings.wallpapers.clone());
        Self {
            tracker,
            hotkeys: HotkeySet::new(HotkeyMode::from_setting(settings.use_alternate_hotkeys)),
            registrar,
            settings,
        }
    }

    /// Register hotkeys and start tracking. Hotkey failures are returned
    /// alongside the current ordinal instead of aborting start-up.
    pub fn start(&mut self) -> (Result<usize, AppError>, Vec<AppError>) {
        let failures = self.hotkeys.register_all(&mut self.registrar);
        (self.tracker.start(), failures)
    }

    pub fn handle_hotkey(&mut self, id: i32) -> Result<(), AppError> {
        match command_for_id(id) {
            Some(command) => self.handle_command(command),
            None => {
                debug!("Ignoring unknown hotkey id {}", id);
                Ok(())
            }
        }
    }

    pub fn handle_command(&mut self, command: DesktopCommand) -> Result<(), AppError> {
        debug!("Desktop command {:?}", command);
        match command {
            DesktopCommand::Left => self.tracker.switch_left(),
            DesktopCommand::Right => self.tracker.switch_right(),
            DesktopCommand::Ordinal(n) => self.tracker.switch_to_ordinal(n).map(|_| ()),
        }
    }

    /// Returns the ordinal to show on the tray icon after an activation.
    pub fn handle_desktop_signal(
        &mut self,
        signal: DesktopSignal,
    ) -> Result<Option<usize>, AppError> {
        match signal {
            DesktopSignal::Created | DesktopSignal::Destroyed => {
                self.tracker.on_desktop_count_changed()?;
                Ok(None)
            }
            // Same desktops in a new order; focus memory is not reset.
            DesktopSignal::Moved => {
                self.tracker.on_desktops_reordered()?;
                Ok(None)
            }
            DesktopSignal::Activated => self.tracker.on_desktop_activated(None).map(Some),
        }
    }

    /// Adopt `new` settings. A changed hotkey mode is re-registered before
    /// `persist` runs, so the saved flag never describes hotkeys that were
    /// not attempted. Registration failures are returned. A persist failure
    /// is an error: the previous hotkey mode is registered again and the
    /// live settings are left untouched.
    pub fn apply_settings<P>(&mut self, new: Settings, persist: P) -> Result<Vec<AppError>, AppError>
    where
        P: FnOnce(&Settings) -> Result<(), AppError>,
    {
        let old_mode = self.hotkeys.mode();
        let mode = HotkeyMode::from_setting(new.use_alternate_hotkeys);
        let failures = self.hotkeys.switch_mode(&mut self.registrar, mode);

        if let Err(e) = persist(&new) {
            if mode != old_mode {
                warn!("Settings not saved; restoring {} hotkeys", old_mode.label());
                for failure in self.hotkeys.switch_mode(&mut self.registrar, old_mode) {
                    warn!("Could not restore hotkey: {}", failure);
                }
            }
            return Err(e);
        }

        self.tracker.set_wallpapers(new.wallpapers.clone());
        self.tracker
            .set_retention(FocusRetention::from_setting(new.keep_focus_on_desktop_change));
        info!(
            "Settings applied: {} hotkeys, {} wallpaper{}",
            mode.label(),
            new.wallpapers.len(),
            if new.wallpapers.len() == 1 { "" } else { "s" }
        );
        self.settings = new;
        Ok(failures)
    }

    /// Release every registered hotkey.
    pub fn shutdown(&mut self) {
        self.hotkeys.unregister_all(&mut self.registrar);
        info!("Hotkeys released");
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn hotkeys(&self) -> &HotkeySet {
        &self.hotkeys
    }

    pub fn tracker(&self) -> &DesktopIndexTracker<H, F, W> {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut DesktopIndexTracker<H, F, W> {
        &mut self.tracker
    }

    pub fn registrar(&self) -> &R {
        &self.registrar
    }
}
