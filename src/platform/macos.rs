// macOS reads the frontmost application name from NSWorkspace.
//
// A real window title needs the Accessibility permission; the localized
// application name is the best-effort equivalent without it.

use anyhow::anyhow;
use objc2::rc::Retained;
use objc2_app_kit::{NSRunningApplication, NSWorkspace};

use super::WindowObserver;

pub struct WorkspaceObserver;

impl WorkspaceObserver {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self)
    }
}

impl WindowObserver for WorkspaceObserver {
    fn active_window_title(&self) -> anyhow::Result<String> {
        // SAFETY: AppKit generally expects the main thread, but reading
        // frontmostApplication is commonly done off-main in practice.
        let app: Option<Retained<NSRunningApplication>> =
            unsafe { NSWorkspace::sharedWorkspace().frontmostApplication() };

        let app = app.ok_or_else(|| anyhow!("no frontmost application"))?;
        let name = unsafe { app.localizedName() }
            .ok_or_else(|| anyhow!("frontmost application has no name"))?;
        Ok(name.to_string())
    }
}
