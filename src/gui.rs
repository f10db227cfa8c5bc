use crate::settings::Settings;
use crate::shell::ShellHandle;
use crate::tray_number::{base_icon, CANVAS_SIZE};
use crate::utils::show_message_box;
use crate::wallpaper::{
    is_supported_image, move_wallpaper, remove_wallpapers, single_selection, MoveDirection,
    IMAGE_EXTENSIONS,
};
use eframe::egui::{self, ViewportBuilder, ViewportCommand};
use eframe::{App as EframeApp, NativeOptions};
use log::{debug, info, warn};
use rfd::FileDialog;
use std::collections::BTreeSet;

pub const SETTINGS_TITLE: &str = "Desktop Cycle Settings";

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// State of the settings window.
///
/// The window edits a draft copy of the settings; nothing reaches the shell
/// until "Save" sends the whole draft.
pub struct SettingsApp {
    shell: ShellHandle,
    draft: Settings,
    selected: BTreeSet<usize>,
    unsaved_changes: bool,
    status: Option<String>,
}

impl SettingsApp {
    pub fn new(shell: ShellHandle, settings: Settings) -> Self {
        Self {
            shell,
            draft: settings,
            selected: BTreeSet::new(),
            unsaved_changes: false,
            status: None,
        }
    }
}

/// Launches the settings window on the calling thread and blocks until the
/// event loop ends.
///
/// # Behavior
/// - Builds the window with the tray tile as its icon. It starts hidden
///   unless `visible` is set; the tray shows it later.
/// - Hands the native window handle to the shell so the tray's "Settings"
///   entry can bring the window back after it was hidden.
///
/// # Error Conditions
/// - Returns the `eframe` error if no window or renderer could be created.
///   The tray keeps working without a settings window in that case.
pub fn run_gui(app: SettingsApp, visible: bool) -> Result<(), eframe::Error> {
    let icon = egui::IconData {
        rgba: base_icon().into_raw(),
        width: CANVAS_SIZE,
        height: CANVAS_SIZE,
    };

    let options = NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title(SETTINGS_TITLE)
            .with_inner_size([460.0, 440.0])
            .with_visible(visible)
            .with_icon(icon),
        ..Default::default()
    };

    eframe::run_native(
        SETTINGS_TITLE,
        options,
        Box::new(move |cc| {
            match native_window_handle(cc) {
                Some(hwnd) => app.shell.attach_settings_window(hwnd),
                None => warn!("Settings window handle unavailable; tray cannot reopen it"),
            }
            Ok(Box::new(app))
        }),
    )
}

fn native_window_handle(cc: &eframe::CreationContext<'_>) -> Option<isize> {
    use raw_window_handle::{HasWindowHandle, RawWindowHandle};
    match cc.window_handle().map(|h| h.as_raw()) {
        Ok(RawWindowHandle::Win32(h)) => Some(h.hwnd.get()),
        _ => None,
    }
}

impl EframeApp for SettingsApp {
    /// Draws the settings window each frame.
    ///
    /// # Behavior
    /// - A close request is cancelled and the window is hidden instead, so the
    ///   application keeps running in the tray.
    /// - Image files dropped on the window are appended to the wallpaper list.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) {
            debug!("Settings window closed; hiding to tray");
            ctx.send_viewport_cmd(ViewportCommand::CancelClose);
            ctx.send_viewport_cmd(ViewportCommand::Visible(false));
        }

        self.accept_dropped_files(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    self.save();
                }
                if self.unsaved_changes {
                    ui.label("Unsaved changes");
                } else if let Some(status) = &self.status {
                    ui.label(status);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_hotkey_section(ui);
            ui.separator();
            self.render_wallpaper_section(ui);
        });
    }
}

impl SettingsApp {
    fn render_hotkey_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Hotkeys");
        if ui
            .checkbox(
                &mut self.draft.use_alternate_hotkeys,
                "Use Shift+Alt instead of Ctrl+Alt",
            )
            .changed()
        {
            self.unsaved_changes = true;
        }
        ui.label("Left/Right switch desktops, 1-9 jump to a desktop.");

        if ui
            .checkbox(
                &mut self.draft.keep_focus_on_desktop_change,
                "Remember focused windows when desktops are added or removed",
            )
            .changed()
        {
            self.unsaved_changes = true;
        }

        egui::ComboBox::from_label("Log level (next start)")
            .selected_text(&self.draft.log_level)
            .show_ui(ui, |ui| {
                for level in LOG_LEVELS {
                    if ui
                        .selectable_value(&mut self.draft.log_level, level.to_string(), level)
                        .clicked()
                    {
                        self.unsaved_changes = true;
                    }
                }
            });
    }

    /// Renders the ordered wallpaper list and its editing buttons.
    ///
    /// # Behavior
    /// - Click selects one entry; Ctrl+click toggles an entry in a multi-selection.
    /// - "Move up"/"Move down" need exactly one selected entry and explain
    ///   that with a message box otherwise.
    /// - Desktop N gets entry `N mod len`, so the list repeats when there
    ///   are more desktops than wallpapers.
    fn render_wallpaper_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Backgrounds");
        ui.label("Applied by desktop number, repeating from the top.");

        ui.horizontal(|ui| {
            if ui.button("Add background").clicked() {
                self.add_from_dialog();
            }
            if ui.button("Remove file").clicked() {
                self.remove_selected();
            }
            if ui.button("Move up").clicked() {
                self.move_selected(MoveDirection::Up);
            }
            if ui.button("Move down").clicked() {
                self.move_selected(MoveDirection::Down);
            }
        });

        let ctrl = ui.input(|i| i.modifiers.ctrl);
        let mut clicked: Option<usize> = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                if self.draft.wallpapers.is_empty() {
                    ui.weak("No backgrounds. Add files or drop images here.");
                }
                for (i, path) in self.draft.wallpapers.iter().enumerate() {
                    let label = format!("{}. {}", i + 1, path);
                    if ui.selectable_label(self.selected.contains(&i), label).clicked() {
                        clicked = Some(i);
                    }
                }
            });

        if let Some(i) = clicked {
            if ctrl {
                if !self.selected.remove(&i) {
                    self.selected.insert(i);
                }
            } else {
                self.selected.clear();
                self.selected.insert(i);
            }
        }
    }

    fn add_wallpapers<I: IntoIterator<Item = String>>(&mut self, paths: I) {
        let before = self.draft.wallpapers.len();
        for path in paths {
            if is_supported_image(&path) {
                self.draft.wallpapers.push(path);
            } else {
                warn!("Ignoring '{}': not a supported image", path);
            }
        }
        if self.draft.wallpapers.len() != before {
            self.unsaved_changes = true;
        }
    }

    fn add_from_dialog(&mut self) {
        if let Some(files) = FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_files()
        {
            self.add_wallpapers(files.into_iter().map(|p| p.to_string_lossy().to_string()));
        }
    }

    fn accept_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }
        self.add_wallpapers(
            dropped
                .into_iter()
                .filter_map(|f| f.path)
                .map(|p| p.to_string_lossy().to_string()),
        );
    }

    fn remove_selected(&mut self) {
        if self.selected.is_empty() {
            return;
        }
        remove_wallpapers(&mut self.draft.wallpapers, &self.selected);
        self.selected.clear();
        self.unsaved_changes = true;
    }

    fn move_selected(&mut self, direction: MoveDirection) {
        let Some(index) = single_selection(&self.selected) else {
            show_message_box("Select exactly one background to move.", "Move");
            return;
        };
        if let Some(new_index) = move_wallpaper(&mut self.draft.wallpapers, index, direction) {
            self.selected.clear();
            self.selected.insert(new_index);
            self.unsaved_changes = true;
        }
    }

    fn save(&mut self) {
        self.shell.apply_settings(self.draft.clone());
        self.unsaved_changes = false;
        self.status = Some("Settings saved.".to_string());
        info!("Settings sent to shell");
    }
}
