// Windows foreground window title.
// Kept behind cfg(target_os = "windows") at the module level in mod.rs.

use anyhow::bail;
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, GetWindowTextLengthW, GetWindowTextW,
};

use super::WindowObserver;

pub struct ForegroundObserver;

impl ForegroundObserver {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self)
    }
}

impl WindowObserver for ForegroundObserver {
    fn active_window_title(&self) -> anyhow::Result<String> {
        unsafe {
            let hwnd: HWND = GetForegroundWindow();
            if hwnd.0.is_null() {
                bail!("no foreground window");
            }

            let len = GetWindowTextLengthW(hwnd);
            if len == 0 {
                // Windows with no caption text report length zero.
                return Ok(String::new());
            }

            let mut buf = vec![0u16; (len as usize) + 1];
            let copied = GetWindowTextW(hwnd, &mut buf);
            let copied = copied.max(0) as usize;
            buf.truncate(copied);
            Ok(String::from_utf16_lossy(&buf))
        }
    }
}
