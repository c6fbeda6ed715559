//! X11 adapter: asks the root window which window is active via EWMH, then
//! reads that window's name property.

use anyhow::{bail, Context};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt, Window};
use x11rb::rust_connection::RustConnection;

use super::WindowObserver;

pub struct X11Observer {
    conn: RustConnection,
    root: Window,
    net_active_window: Atom,
    net_wm_name: Atom,
}

impl X11Observer {
    pub fn new() -> anyhow::Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("connect to X server")?;
        let root = conn.setup().roots[screen_num].root;
        let net_active_window = intern_atom(&conn, "_NET_ACTIVE_WINDOW")?;
        let net_wm_name = intern_atom(&conn, "_NET_WM_NAME")?;

        Ok(Self {
            conn,
            root,
            net_active_window,
            net_wm_name,
        })
    }

    fn active_window_id(&self) -> anyhow::Result<Window> {
        let reply = self
            .conn
            .get_property(false, self.root, self.net_active_window, AtomEnum::WINDOW, 0, 1)?
            .reply()?;

        if reply.value.len() < 4 {
            bail!("window manager does not expose _NET_ACTIVE_WINDOW");
        }

        let id = u32::from_ne_bytes([
            reply.value[0],
            reply.value[1],
            reply.value[2],
            reply.value[3],
        ]);
        if id == 0 {
            bail!("no window has focus");
        }
        Ok(id)
    }

    fn window_property(&self, window: Window, atom: Atom) -> anyhow::Result<Option<String>> {
        let reply = self
            .conn
            .get_property(false, window, atom, AtomEnum::ANY, 0, 1024)?
            .reply()?;

        if reply.value.is_empty() {
            return Ok(None);
        }

        Ok(String::from_utf8(reply.value).ok())
    }
}

impl WindowObserver for X11Observer {
    fn active_window_title(&self) -> anyhow::Result<String> {
        let window = self.active_window_id()?;

        if let Some(title) = self.window_property(window, self.net_wm_name)? {
            return Ok(title);
        }

        // Pre-EWMH clients only set WM_NAME.
        if let Some(title) = self.window_property(window, AtomEnum::WM_NAME.into())? {
            return Ok(title);
        }

        bail!("active window has no name property")
    }
}

fn intern_atom(conn: &RustConnection, name: &str) -> anyhow::Result<Atom> {
    Ok(conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
}
