use crate::error::AppError;
use log::{info, warn};
use std::fmt;

/// Which modifier pair drives the desktop hotkeys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyMode {
    /// Ctrl+Alt
    Normal,
    /// Shift+Alt
    Alternate,
}

impl HotkeyMode {
    pub fn from_setting(use_alternate: bool) -> Self {
        if use_alternate {
            HotkeyMode::Alternate
        } else {
            HotkeyMode::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HotkeyMode::Normal => "Ctrl+Alt",
            HotkeyMode::Alternate => "Shift+Alt",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            HotkeyMode::Normal => HotkeyMode::Alternate,
            HotkeyMode::Alternate => HotkeyMode::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyKey {
    Left,
    Right,
    /// Number row digit 1-9.
    Digit(u8),
}

/// A desktop navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopCommand {
    Left,
    Right,
    /// Zero-based desktop ordinal.
    Ordinal(usize),
}

/// A key together with the mode that supplies its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub key: HotkeyKey,
    pub mode: HotkeyMode,
}

const LEFT_ID: i32 = 1;
const RIGHT_ID: i32 = 2;
const DIGIT_BASE_ID: i32 = 10;

impl HotkeyBinding {
    /// Registration id. The same key uses the same id in both modes since
    /// only one mode is registered at a time.
    pub fn id(&self) -> i32 {
        match self.key {
            HotkeyKey::Left => LEFT_ID,
            HotkeyKey::Right => RIGHT_ID,
            HotkeyKey::Digit(d) => DIGIT_BASE_ID + d as i32,
        }
    }

    pub fn command(&self) -> DesktopCommand {
        match self.key {
            HotkeyKey::Left => DesktopCommand::Left,
            HotkeyKey::Right => DesktopCommand::Right,
            HotkeyKey::Digit(d) => DesktopCommand::Ordinal(d as usize - 1),
        }
    }

    /// Windows virtual-key code of the key.
    pub fn virtual_key(&self) -> u32 {
        match self.key {
            HotkeyKey::Left => 0x25,
            HotkeyKey::Right => 0x27,
            HotkeyKey::Digit(d) => 0x30 + d as u32,
        }
    }

    pub fn is_navigation(&self) -> bool {
        matches!(self.key, HotkeyKey::Left | HotkeyKey::Right)
    }
}

impl fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key {
            HotkeyKey::Left => write!(f, "{}+Left", self.mode.label()),
            HotkeyKey::Right => write!(f, "{}+Right", self.mode.label()),
            HotkeyKey::Digit(d) => write!(f, "{}+{}", self.mode.label(), d),
        }
    }
}

/// Map a registration id back to its command.
pub fn command_for_id(id: i32) -> Option<DesktopCommand> {
    match id {
        LEFT_ID => Some(DesktopCommand::Left),
        RIGHT_ID => Some(DesktopCommand::Right),
        _ if (DIGIT_BASE_ID + 1..=DIGIT_BASE_ID + 9).contains(&id) => {
            Some(DesktopCommand::Ordinal((id - DIGIT_BASE_ID - 1) as usize))
        }
        _ => None,
    }
}

/// All bindings of `mode`: the navigation pair first, then digits 1-9.
pub fn bindings_for(mode: HotkeyMode) -> Vec<HotkeyBinding> {
    let mut bindings = vec![
        HotkeyBinding { key: HotkeyKey::Left, mode },
        HotkeyBinding { key: HotkeyKey::Right, mode },
    ];
    bindings.extend((1..=9).map(|d| HotkeyBinding { key: HotkeyKey::Digit(d), mode }));
    bindings
}

/// Registers and unregisters global hotkeys with the OS.
pub trait HotkeyRegistrar {
    fn register(&mut self, binding: &HotkeyBinding) -> Result<(), AppError>;
    fn unregister(&mut self, binding: &HotkeyBinding) -> Result<(), AppError>;
}

/// Tracks which bindings are currently registered.
#[derive(Debug)]
pub struct HotkeySet {
    mode: HotkeyMode,
    registered: Vec<HotkeyBinding>,
}

impl HotkeySet {
    pub fn new(mode: HotkeyMode) -> Self {
        Self {
            mode,
            registered: Vec::new(),
        }
    }

    pub fn mode(&self) -> HotkeyMode {
        self.mode
    }

    pub fn registered(&self) -> &[HotkeyBinding] {
        &self.registered
    }

    /// Register every binding of the current mode. A failing binding does
    /// not stop the others; the failures are returned.
    pub fn register_all<R: HotkeyRegistrar>(&mut self, registrar: &mut R) -> Vec<AppError> {
        let mut failures = Vec::new();
        for binding in bindings_for(self.mode) {
            if self.registered.contains(&binding) {
                continue;
            }
            match registrar.register(&binding) {
                Ok(()) => {
                    info!("Registered hotkey {}", binding);
                    self.registered.push(binding);
                }
                Err(e) => {
                    warn!("Failed to register hotkey {}: {}", binding, e);
                    failures.push(e);
                }
            }
        }
        failures
    }

    pub fn unregister_all<R: HotkeyRegistrar>(&mut self, registrar: &mut R) {
        for binding in self.registered.drain(..) {
            if let Err(e) = registrar.unregister(&binding) {
                warn!("Failed to unregister hotkey {}: {}", binding, e);
            }
        }
    }

    /// Move every registration to `mode`. When the mode is unchanged only
    /// the bindings that are not registered yet are tried again.
    pub fn switch_mode<R: HotkeyRegistrar>(
        &mut self,
        registrar: &mut R,
        mode: HotkeyMode,
    ) -> Vec<AppError> {
        if mode == self.mode {
            return self.register_all(registrar);
        }
        info!("Switching hotkeys from {} to {}", self.mode.label(), mode.label());
        self.unregister_all(registrar);
        self.mode = mode;
        self.register_all(registrar)
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum RegistrarCall {
        Register(HotkeyBinding),
        Unregister(HotkeyBinding),
    }

    /// Records every call; registrations of `taken` bindings fail.
    #[derive(Debug, Default)]
    pub struct RecordingRegistrar {
        pub calls: Vec<RegistrarCall>,
        pub taken: Vec<HotkeyBinding>,
    }

    impl HotkeyRegistrar for RecordingRegistrar {
        fn register(&mut self, binding: &HotkeyBinding) -> Result<(), AppError> {
            self.calls.push(RegistrarCall::Register(*binding));
            if self.taken.contains(binding) {
                return Err(AppError::Hotkey {
                    binding: binding.to_string(),
                    message: "already registered by another program".into(),
                });
            }
            Ok(())
        }

        fn unregister(&mut self, binding: &HotkeyBinding) -> Result<(), AppError> {
            self.calls.push(RegistrarCall::Unregister(*binding));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;

    #[test]
    fn ids_round_trip_to_commands() {
        for mode in [HotkeyMode::Normal, HotkeyMode::Alternate] {
            for binding in bindings_for(mode) {
                assert_eq!(command_for_id(binding.id()), Some(binding.command()));
            }
        }
        assert_eq!(command_for_id(0), None);
        assert_eq!(command_for_id(10), None);
        assert_eq!(command_for_id(20), None);
    }

    #[test]
    fn digits_map_to_zero_based_ordinals() {
        let one = HotkeyBinding { key: HotkeyKey::Digit(1), mode: HotkeyMode::Normal };
        let nine = HotkeyBinding { key: HotkeyKey::Digit(9), mode: HotkeyMode::Normal };
        assert_eq!(one.command(), DesktopCommand::Ordinal(0));
        assert_eq!(nine.command(), DesktopCommand::Ordinal(8));
        assert_eq!(one.virtual_key(), 0x31);
    }

    #[test]
    fn binding_labels() {
        let b = HotkeyBinding { key: HotkeyKey::Right, mode: HotkeyMode::Alternate };
        assert_eq!(b.to_string(), "Shift+Alt+Right");
        let d = HotkeyBinding { key: HotkeyKey::Digit(3), mode: HotkeyMode::Normal };
        assert_eq!(d.to_string(), "Ctrl+Alt+3");
    }

    #[test]
    fn each_mode_has_navigation_pair_and_nine_digits() {
        let bindings = bindings_for(HotkeyMode::Normal);
        assert_eq!(bindings.len(), 11);
        assert_eq!(bindings.iter().filter(|b| b.is_navigation()).count(), 2);
        assert!(bindings.iter().all(|b| b.mode == HotkeyMode::Normal));
    }

    #[test]
    fn failed_registration_does_not_stop_others() {
        let mut registrar = RecordingRegistrar {
            taken: vec![HotkeyBinding { key: HotkeyKey::Left, mode: HotkeyMode::Normal }],
            ..Default::default()
        };
        let mut set = HotkeySet::new(HotkeyMode::Normal);
        let failures = set.register_all(&mut registrar);
        assert_eq!(failures.len(), 1);
        assert_eq!(set.registered().len(), 10);
    }

    #[test]
    fn switch_mode_unregisters_old_before_registering_new() {
        let mut registrar = RecordingRegistrar::default();
        let mut set = HotkeySet::new(HotkeyMode::Normal);
        set.register_all(&mut registrar);
        registrar.calls.clear();

        assert!(set.switch_mode(&mut registrar, HotkeyMode::Alternate).is_empty());

        let last_unregister = registrar
            .calls
            .iter()
            .rposition(|c| matches!(c, RegistrarCall::Unregister(_)))
            .unwrap();
        let first_register = registrar
            .calls
            .iter()
            .position(|c| matches!(c, RegistrarCall::Register(_)))
            .unwrap();
        assert!(last_unregister < first_register);
        assert!(registrar.calls.contains(&RegistrarCall::Unregister(HotkeyBinding {
            key: HotkeyKey::Left,
            mode: HotkeyMode::Normal
        })));
        assert!(registrar.calls.contains(&RegistrarCall::Register(HotkeyBinding {
            key: HotkeyKey::Right,
            mode: HotkeyMode::Alternate
        })));
        assert_eq!(set.mode(), HotkeyMode::Alternate);
        assert!(set.registered().iter().all(|b| b.mode == HotkeyMode::Alternate));
    }

    #[test]
    fn switch_to_same_mode_is_noop() {
        let mut registrar = RecordingRegistrar::default();
        let mut set = HotkeySet::new(HotkeyMode::Normal);
        set.register_all(&mut registrar);
        registrar.calls.clear();
        set.switch_mode(&mut registrar, HotkeyMode::Normal);
        assert!(registrar.calls.is_empty());
    }

    #[test]
    fn same_mode_retries_bindings_that_failed() {
        let taken = HotkeyBinding { key: HotkeyKey::Digit(4), mode: HotkeyMode::Normal };
        let mut registrar = RecordingRegistrar {
            taken: vec![taken],
            ..Default::default()
        };
        let mut set = HotkeySet::new(HotkeyMode::Normal);
        assert_eq!(set.register_all(&mut registrar).len(), 1);

        // The other program let go of the key.
        registrar.taken.clear();
        registrar.calls.clear();
        assert!(set.switch_mode(&mut registrar, HotkeyMode::Normal).is_empty());

        assert_eq!(registrar.calls, vec![RegistrarCall::Register(taken)]);
        assert_eq!(set.registered().len(), 11);
    }

    #[test]
    fn unregister_all_clears_registrations() {
        let mut registrar = RecordingRegistrar::default();
        let mut set = HotkeySet::new(HotkeyMode::Alternate);
        set.register_all(&mut registrar);
        set.unregister_all(&mut registrar);
        assert!(set.registered().is_empty());
        let unregisters = registrar
            .calls
            .iter()
            .filter(|c| matches!(c, RegistrarCall::Unregister(_)))
            .count();
        assert_eq!(unregisters, 11);
    }
}
