use std::error::Error;
use std::fmt;

/// Errors raised by the desktop tracker, the hotkey layer and settings persistence.
#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
    /// The virtual desktop provider rejected a query or a switch request.
    Desktop(String),
    /// A hotkey could not be registered or unregistered with the OS.
    Hotkey { binding: String, message: String },
    /// The provider reported a current desktop that is not in the known list.
    UnknownDesktop,
    /// Any other failing Windows API call.
    Os(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Serialize(err) => write!(f, "Serialization error: {}", err),
            AppError::Desktop(message) => write!(f, "Virtual desktop error: {}", message),
            AppError::Hotkey { binding, message } => {
                write!(f, "Hotkey {} failed: {}", binding, message)
            }
            AppError::UnknownDesktop => write!(f, "Current desktop is not in the desktop list"),
            AppError::Os(message) => write!(f, "Windows API error: {}", message),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Serialize(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialize(err)
    }
}

#[cfg(target_os = "windows")]
impl From<windows::core::Error> for AppError {
    fn from(err: windows::core::Error) -> Self {
        AppError::Os(err.to_string())
    }
}
