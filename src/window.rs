//! Surface/window controller
//!
//! xdg-shell requires the client to wait for the first `xdg_surface.configure`
//! before attaching a buffer, and to acknowledge every configure with its
//! serial before the commit that applies it. The controller owns that
//! handshake:
//!
//! ```text
//! Created ──begin──► AwaitingFirstConfigure ──configure──► Ready ◄─┐
//!    │                        │                              │  configure
//!    └────────── close ───────┴──────────── close ───────────┴──► Closing
//! ```
//!
//! Every configure, not only the first, re-attaches, damages, acks,
//! re-renders and commits. Toplevel configure and bounds hints are accepted
//! and ignored; the window never resizes.
//!
//! Wayland requests are issued through [`SurfaceOps`], which keeps the
//! ordering observable without a server.

use log::{debug, info};

use crate::error::LogoResult;

/// Lifecycle of the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Surface and toplevel exist, no commit yet
    Created,
    /// Initial commit sent, no configure seen
    AwaitingFirstConfigure,
    /// At least one configure acked and content committed
    Ready,
    /// Server asked us to close; terminal
    Closing,
}

/// Server events relevant to the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// `xdg_surface.configure`
    SurfaceConfigure { serial: u32 },
    /// `xdg_toplevel.configure`
    ToplevelConfigure { width: i32, height: i32 },
    /// `xdg_toplevel.configure_bounds`
    ToplevelConfigureBounds { width: i32, height: i32 },
    /// `xdg_toplevel.close`
    Close,
}

impl WindowState {
    /// Pure transition function
    pub fn next(self, event: &WindowEvent) -> WindowState {
        match (self, event) {
            (WindowState::Closing, _) => WindowState::Closing,
            (_, WindowEvent::Close) => WindowState::Closing,
            (_, WindowEvent::SurfaceConfigure { .. }) => WindowState::Ready,
            (state, _) => state,
        }
    }

    /// Whether a buffer may be attached and committed in this state
    pub fn accepts_content(self, event: &WindowEvent) -> bool {
        self != WindowState::Closing && matches!(event, WindowEvent::SurfaceConfigure { .. })
    }
}

/// Requests the controller issues against the live surface
#[cfg_attr(test, mockall::automock)]
pub trait SurfaceOps {
    /// `wl_surface.attach` of the single buffer at (0, 0)
    fn attach_buffer(&mut self);
    /// Mark the whole surface damaged
    fn damage_all(&mut self, width: i32, height: i32);
    /// `xdg_surface.ack_configure`
    fn ack_configure(&mut self, serial: u32);
    /// Repopulate the shared buffer
    fn render(&mut self) -> LogoResult<()>;
    /// `wl_surface.commit`
    fn commit(&mut self);
}

#[derive(Debug)]
pub struct WindowController {
    state: WindowState,
    width: i32,
    height: i32,
    last_acked_serial: Option<u32>,
    configures: u64,
    commits: u64,
}

impl WindowController {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            state: WindowState::Created,
            width,
            height,
            last_acked_serial: None,
            configures: 0,
            commits: 0,
        }
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    /// The quit flag read by the event loop
    pub fn should_quit(&self) -> bool {
        self.state == WindowState::Closing
    }

    pub fn last_acked_serial(&self) -> Option<u32> {
        self.last_acked_serial
    }

    /// Surface configure events handled with a commit
    pub fn configures_handled(&self) -> u64 {
        self.configures
    }

    /// Content commits issued; the initial buffer-less commit is not counted
    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// Send the initial buffer-less commit that prompts the first configure
    pub fn begin<O: SurfaceOps + ?Sized>(&mut self, ops: &mut O) {
        if self.state != WindowState::Created {
            return;
        }
        ops.commit();
        self.transition(WindowState::AwaitingFirstConfigure);
    }

    /// React to one server event
    pub fn handle<O: SurfaceOps + ?Sized>(
        &mut self,
        event: WindowEvent,
        ops: &mut O,
    ) -> LogoResult<()> {
        match event {
            WindowEvent::SurfaceConfigure { serial } => {
                if !self.state.accepts_content(&event) {
                    debug!("Ignoring configure {} while closing", serial);
                    return Ok(());
                }

                ops.attach_buffer();
                ops.damage_all(self.width, self.height);
                ops.ack_configure(serial);
                self.last_acked_serial = Some(serial);
                ops.render()?;
                ops.commit();

                self.configures += 1;
                self.commits += 1;
                debug!("Configure {} acked and committed", serial);
            }
            WindowEvent::ToplevelConfigure { width, height } => {
                debug!("Toplevel configure {}x{} (size is fixed)", width, height);
            }
            WindowEvent::ToplevelConfigureBounds { width, height } => {
                debug!("Toplevel bounds {}x{}", width, height);
            }
            WindowEvent::Close => {
                info!("Close requested");
            }
        }

        self.transition(self.state.next(&event));
        Ok(())
    }

    fn transition(&mut self, next: WindowState) {
        if self.state != next {
            debug!("Window state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}
