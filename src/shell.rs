//! The shell thread: a hidden window with its message loop, which owns the
//! controller, the tray icon and the hotkey registrations.
//!
//! `RegisterHotKey` delivers `WM_HOTKEY` to the registering thread's window,
//! so everything that touches the controller runs here. Other threads talk
//! to the shell through a [`ShellHandle`], which queues an event and posts a
//! wake-up message.

use crate::controller::{Controller, DesktopSignal};
use crate::error::AppError;
use crate::hotkey::{HotkeyBinding, HotkeyMode, HotkeyRegistrar};
use crate::settings::{save_settings, Settings};
use crate::tray::{self, TrayIcon, TrayMenuChoice, WM_TRAYICON};
use crate::virtual_desktop::{self, DesktopEventListener, WinVirtualDesktops};
use crate::wallpaper::SystemWallpaper;
use crate::window_manager::Win32Focus;
use log::{debug, error, info, warn};
use once_cell::sync::OnceCell;
use poll_promise::Promise;
use std::cell::RefCell;
use std::ffi::c_void;
use std::sync::mpsc::{channel, Receiver, Sender};
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_APARTMENTTHREADED};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::*;
use windows::Win32::UI::WindowsAndMessaging::*;

pub const APP_NAME: &str = "Desktop Cycle";

const WM_SHELL_WAKE: u32 = WM_APP + 1;

static TASKBAR_CREATED: OnceCell<u32> = OnceCell::new();

thread_local! {
    static SHELL: RefCell<Option<ShellState>> = const { RefCell::new(None) };
}

enum ShellEvent {
    Desktop(DesktopSignal),
    ApplySettings(Settings),
    SettingsWindow(isize),
}

/// Sends work to the shell thread from any thread.
#[derive(Clone)]
pub struct ShellHandle {
    hwnd: isize,
    events: Sender<ShellEvent>,
}

impl ShellHandle {
    fn send(&self, event: ShellEvent) {
        if self.events.send(event).is_err() {
            warn!("Shell thread is gone; dropping event");
            return;
        }
        unsafe {
            if let Err(e) = PostMessageW(
                HWND(self.hwnd as *mut c_void),
                WM_SHELL_WAKE,
                WPARAM(0),
                LPARAM(0),
            ) {
                warn!("Failed to wake shell thread: {}", e);
            }
        }
    }

    /// Re-register hotkeys if needed, save to disk, then adopt the settings.
    pub fn apply_settings(&self, settings: Settings) {
        self.send(ShellEvent::ApplySettings(settings));
    }

    /// Tell the shell which window to show for "Settings".
    pub fn attach_settings_window(&self, hwnd: isize) {
        self.send(ShellEvent::SettingsWindow(hwnd));
    }
}

/// The running shell thread.
pub struct ShellThread {
    handle: ShellHandle,
    thread: Promise<()>,
}

impl ShellThread {
    pub fn handle(&self) -> ShellHandle {
        self.handle.clone()
    }

    /// Blocks until the shell's message loop ends.
    pub fn wait(self) {
        self.thread.block_until_ready();
    }
}

/// Start the shell thread and wait until its window, tray icon and hotkeys
/// are set up.
pub fn spawn(settings: Settings, settings_path: String) -> Result<ShellThread, AppError> {
    let (ready_tx, ready_rx) = channel();
    let thread = Promise::spawn_thread("Shell", move || run(settings, settings_path, ready_tx));
    match ready_rx.recv() {
        Ok(Ok(handle)) => Ok(ShellThread { handle, thread }),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(AppError::Os("shell thread exited during start-up".into())),
    }
}

/// `RegisterHotKey` on the shell window.
struct WindowHotkeys {
    hwnd: HWND,
}

fn modifiers(mode: HotkeyMode) -> HOT_KEY_MODIFIERS {
    let base = match mode {
        HotkeyMode::Normal => MOD_CONTROL | MOD_ALT,
        HotkeyMode::Alternate => MOD_SHIFT | MOD_ALT,
    };
    base | MOD_NOREPEAT
}

impl HotkeyRegistrar for WindowHotkeys {
    fn register(&mut self, binding: &HotkeyBinding) -> Result<(), AppError> {
        unsafe {
            RegisterHotKey(
                self.hwnd,
                binding.id(),
                modifiers(binding.mode),
                binding.virtual_key(),
            )
        }
        .map_err(|e| AppError::Hotkey {
            binding: binding.to_string(),
            message: e.to_string(),
        })
    }

    fn unregister(&mut self, binding: &HotkeyBinding) -> Result<(), AppError> {
        unsafe { UnregisterHotKey(self.hwnd, binding.id()) }.map_err(|e| AppError::Hotkey {
            binding: binding.to_string(),
            message: e.to_string(),
        })
    }
}

type LiveController = Controller<WinVirtualDesktops, Win32Focus, SystemWallpaper, WindowHotkeys>;

struct ShellState {
    controller: LiveController,
    tray: TrayIcon,
    events: Receiver<ShellEvent>,
    settings_path: String,
    settings_window: Option<isize>,
    _listener: Option<DesktopEventListener>,
}

impl ShellState {
    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                ShellEvent::Desktop(signal) => self.on_desktop_signal(signal),
                ShellEvent::ApplySettings(settings) => self.on_apply_settings(settings),
                ShellEvent::SettingsWindow(hwnd) => {
                    debug!("Settings window attached: {:#x}", hwnd);
                    self.settings_window = Some(hwnd);
                }
            }
        }
    }

    fn on_hotkey(&mut self, id: i32) {
        if let Err(e) = self.controller.handle_hotkey(id) {
            warn!("Hotkey {} failed: {}", id, e);
        }
    }

    fn on_desktop_signal(&mut self, signal: DesktopSignal) {
        match self.controller.handle_desktop_signal(signal) {
            Ok(Some(ordinal)) => self.tray.show_number(ordinal + 1),
            // Removing or moving a desktop can renumber the current one.
            Ok(None) => match self.controller.tracker_mut().current_ordinal() {
                Ok(ordinal) => self.tray.show_number(ordinal + 1),
                Err(e) => warn!("Failed to resolve current desktop: {}", e),
            },
            Err(e) => warn!("Failed to handle {:?}: {}", signal, e),
        }
    }

    fn on_apply_settings(&mut self, settings: Settings) {
        let path = self.settings_path.clone();
        match self
            .controller
            .apply_settings(settings, |s| save_settings(&path, s))
        {
            Ok(failures) => self.report_hotkey_failures(&failures),
            Err(e) => {
                error!("Failed to save settings to '{}': {}", path, e);
                self.tray.notify("Settings not saved", &e.to_string());
            }
        }
    }

    fn report_hotkey_failures(&self, failures: &[AppError]) {
        let Some(first) = failures.first() else {
            return;
        };
        let mut text = first.to_string();
        if failures.len() > 1 {
            text.push_str(&format!(" (and {} more)", failures.len() - 1));
        }
        let other = self.controller.hotkeys().mode().other();
        text.push_str(&format!("\nTry the {} keys in Settings.", other.label()));
        self.tray.notify("Hotkey unavailable", &text);
    }

    fn show_settings_window(&self) {
        let Some(raw) = self.settings_window else {
            warn!("Settings window is not available");
            return;
        };
        let hwnd = HWND(raw as *mut c_void);
        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOW);
            let _ = SetForegroundWindow(hwnd);
        }
        info!("Settings window shown");
    }
}

/// Runs `f` on the shell state. Messages that arrive while the state is
/// already borrowed (nested message pumping) are skipped; queued events are
/// picked up by the next drain.
fn with_shell<T>(f: impl FnOnce(&mut ShellState) -> T) -> Option<T> {
    SHELL.with(|slot| match slot.try_borrow_mut() {
        Ok(mut guard) => guard.as_mut().map(f),
        Err(_) => {
            debug!("Shell state busy; skipping nested message");
            None
        }
    })
}

fn exit_application() {
    let state = SHELL.with(|slot| slot.try_borrow_mut().ok().and_then(|mut s| s.take()));
    if let Some(mut state) = state {
        state.controller.shutdown();
        // Dropping the state removes the tray icon and stops the listener.
        drop(state);
    }
    info!("Exiting {}", APP_NAME);
    log::logger().flush();
    std::process::exit(0);
}

extern "system" fn wndproc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match msg {
        WM_SHELL_WAKE => {
            with_shell(|s| s.drain_events());
            LRESULT(0)
        }
        WM_HOTKEY => {
            with_shell(|s| {
                s.on_hotkey(wparam.0 as i32);
                s.drain_events();
            });
            LRESULT(0)
        }
        WM_TRAYICON => {
            match (lparam.0 as u32) & 0xFFFF {
                WM_LBUTTONDBLCLK => {
                    with_shell(|s| s.show_settings_window());
                }
                WM_RBUTTONUP => match tray::show_menu(hwnd) {
                    Some(TrayMenuChoice::Settings) => {
                        with_shell(|s| s.show_settings_window());
                    }
                    Some(TrayMenuChoice::Exit) => exit_application(),
                    None => {}
                },
                _ => {}
            }
            LRESULT(0)
        }
        m if Some(&m) == TASKBAR_CREATED.get() => {
            with_shell(|s| s.tray.restore());
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

fn create_window() -> Result<HWND, AppError> {
    unsafe {
        let hinstance = GetModuleHandleW(PCWSTR::null())?;
        let class_name = w!("DesktopCycleShell");
        let wc = WNDCLASSW {
            lpfnWndProc: Some(wndproc),
            hInstance: hinstance.into(),
            lpszClassName: class_name,
            ..Default::default()
        };
        if RegisterClassW(&wc) == 0 {
            return Err(AppError::Os("RegisterClassW failed".into()));
        }
        // Never shown; it only receives hotkey, tray and wake-up messages.
        let hwnd = CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            class_name,
            w!("Desktop Cycle Shell"),
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            None,
            None,
            hinstance,
            None,
        )?;
        Ok(hwnd)
    }
}

fn start(
    hwnd: HWND,
    settings: Settings,
    settings_path: String,
    handle: &ShellHandle,
    events: Receiver<ShellEvent>,
) -> Result<(), AppError> {
    let tray = TrayIcon::add(hwnd, APP_NAME)?;
    TASKBAR_CREATED.get_or_init(|| unsafe { RegisterWindowMessageW(w!("TaskbarCreated")) });

    let mut controller = Controller::new(
        WinVirtualDesktops,
        Win32Focus,
        SystemWallpaper,
        WindowHotkeys { hwnd },
        settings,
    );
    let (current, failures) = controller.start();

    let forward = handle.clone();
    let listener = match virtual_desktop::listen(move |signal| forward.send(ShellEvent::Desktop(signal))) {
        Ok(listener) => Some(listener),
        Err(e) => {
            warn!("Desktop change notifications unavailable: {}", e);
            None
        }
    };

    let mut state = ShellState {
        controller,
        tray,
        events,
        settings_path,
        settings_window: None,
        _listener: listener,
    };
    match current {
        Ok(ordinal) => state.tray.show_number(ordinal + 1),
        Err(e) => warn!("Failed to resolve current desktop at start-up: {}", e),
    }
    state.report_hotkey_failures(&failures);

    SHELL.with(|slot| *slot.borrow_mut() = Some(state));
    Ok(())
}

fn run(settings: Settings, settings_path: String, ready: Sender<Result<ShellHandle, AppError>>) {
    unsafe {
        let _ = CoInitializeEx(None, COINIT_APARTMENTTHREADED);
    }

    let hwnd = match create_window() {
        Ok(hwnd) => hwnd,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    let (events_tx, events_rx) = channel();
    let handle = ShellHandle {
        hwnd: hwnd.0 as isize,
        events: events_tx,
    };
    if let Err(e) = start(hwnd, settings, settings_path, &handle, events_rx) {
        let _ = ready.send(Err(e));
        return;
    }
    info!("Shell thread running");
    let _ = ready.send(Ok(handle));

    unsafe {
        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
        CoUninitialize();
    }
    debug!("Shell message loop ended");
}
