//! Active window introspection, one adapter per desktop platform.

/// Reads the title of the window that currently has focus.
///
/// Callers treat any error as "title unknown right now"; adapters report
/// what went wrong and never panic.
pub trait WindowObserver: Send + Sync {
    fn active_window_title(&self) -> anyhow::Result<String>;
}

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "linux")]
pub use linux::X11Observer as NativeObserver;

#[cfg(target_os = "windows")]
pub use windows::ForegroundObserver as NativeObserver;

#[cfg(target_os = "macos")]
pub use macos::WorkspaceObserver as NativeObserver;

// Stub for development on other platforms
#[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
pub struct NativeObserver;

#[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
impl NativeObserver {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
impl WindowObserver for NativeObserver {
    fn active_window_title(&self) -> anyhow::Result<String> {
        Ok("Test Window".to_string())
    }
}
