//! Virtual desktop access backed by the `winvd` crate.

use crate::controller::DesktopSignal;
use crate::desktop_tracker::{DesktopHost, DesktopId};
use crate::error::AppError;
use log::{debug, warn};
use std::sync::mpsc::channel;
use winvd::{Desktop, DesktopEvent, DesktopEventThread};

fn host_error(e: winvd::Error) -> AppError {
    AppError::Desktop(format!("{:?}", e))
}

fn desktop_id(desktop: &Desktop) -> Result<DesktopId, AppError> {
    desktop
        .get_id()
        .map(|guid| DesktopId(guid.to_u128()))
        .map_err(host_error)
}

/// The Windows virtual desktop manager.
#[derive(Default)]
pub struct WinVirtualDesktops;

impl DesktopHost for WinVirtualDesktops {
    fn desktops(&self) -> Result<Vec<DesktopId>, AppError> {
        winvd::get_desktops()
            .map_err(host_error)?
            .iter()
            .map(desktop_id)
            .collect()
    }

    fn current(&self) -> Result<DesktopId, AppError> {
        let desktop = winvd::get_current_desktop().map_err(host_error)?;
        desktop_id(&desktop)
    }

    fn switch_to(&mut self, target: DesktopId) -> Result<(), AppError> {
        for desktop in winvd::get_desktops().map_err(host_error)? {
            if desktop_id(&desktop)? == target {
                debug!("Switching to desktop {:x}", target.0);
                return winvd::switch_desktop(desktop).map_err(host_error);
            }
        }
        Err(AppError::Desktop(format!("desktop {:x} no longer exists", target.0)))
    }
}

fn signal_for(event: &DesktopEvent) -> Option<DesktopSignal> {
    match event {
        DesktopEvent::DesktopCreated(_) => Some(DesktopSignal::Created),
        DesktopEvent::DesktopDestroyed { .. } => Some(DesktopSignal::Destroyed),
        DesktopEvent::DesktopMoved { .. } => Some(DesktopSignal::Moved),
        DesktopEvent::DesktopChanged { .. } => Some(DesktopSignal::Activated),
        _ => None,
    }
}

/// Keeps the `winvd` listener alive; dropping it stops the notifications.
pub struct DesktopEventListener {
    _thread: DesktopEventThread,
    _forwarder: poll_promise::Promise<()>,
}

/// Start listening for desktop notifications. Each relevant event is handed
/// to `deliver`, which runs on a forwarding thread.
pub fn listen<D>(deliver: D) -> Result<DesktopEventListener, AppError>
where
    D: Fn(DesktopSignal) + Send + 'static,
{
    let (tx, rx) = channel::<DesktopEvent>();
    let thread = winvd::listen_desktop_events(tx).map_err(host_error)?;
    let forwarder = poll_promise::Promise::spawn_thread("Desktop Events", move || {
        for event in rx {
            match signal_for(&event) {
                Some(signal) => deliver(signal),
                None => debug!("Ignoring desktop event {:?}", event),
            }
        }
        warn!("Desktop event channel closed");
    });
    Ok(DesktopEventListener {
        _thread: thread,
        _forwarder: forwarder,
    })
}

/// 1-based number and id of every desktop, for `--list-desktops`.
pub fn describe_desktops() -> Result<Vec<(usize, DesktopId, String)>, AppError> {
    let mut out = Vec::new();
    for (i, desktop) in winvd::get_desktops().map_err(host_error)?.iter().enumerate() {
        let name = desktop.get_name().unwrap_or_default();
        out.push((i + 1, desktop_id(desktop)?, name));
    }
    Ok(out)
}
