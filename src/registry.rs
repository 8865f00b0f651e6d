//! Capability registry
//!
//! The server advertises its globals once each during the initial
//! roundtrip. Only three are of interest: the compositor (surfaces), the
//! shared-memory service (pools) and the xdg window manager base
//! (toplevels). Everything else is ignored.
//!
//! Binding is behind the [`Binder`] trait so the selection policy works the
//! same against live Wayland proxies and against test doubles.

use log::{debug, info, warn};

use crate::error::{LogoError, LogoResult};

/// A global as advertised by `wl_registry.global`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalDescriptor {
    pub name: u32,
    pub interface: String,
    pub version: u32,
}

/// The globals this client binds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Compositor,
    SharedMemory,
    WindowShell,
}

impl Capability {
    pub const ALL: [Capability; 3] = [
        Capability::Compositor,
        Capability::SharedMemory,
        Capability::WindowShell,
    ];

    /// Match an advertised interface against the allow-list
    pub fn from_interface(interface: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.interface() == interface)
    }

    pub fn interface(self) -> &'static str {
        match self {
            Capability::Compositor => "wl_compositor",
            Capability::SharedMemory => "wl_shm",
            Capability::WindowShell => "xdg_wm_base",
        }
    }

    /// Highest version this client speaks
    pub fn wanted_version(self) -> u32 {
        match self {
            // damage_buffer arrived in wl_surface v4
            Capability::Compositor => 4,
            Capability::SharedMemory => 1,
            Capability::WindowShell => 1,
        }
    }

    /// Version to request given what the server advertised
    pub fn bind_version(self, advertised: u32) -> u32 {
        advertised.min(self.wanted_version())
    }
}

/// Turns a global into a live proxy
pub trait Binder {
    type Compositor;
    type Shm;
    type WmBase;

    fn bind_compositor(&mut self, name: u32, version: u32) -> Self::Compositor;
    fn bind_shm(&mut self, name: u32, version: u32) -> Self::Shm;
    fn bind_wm_base(&mut self, name: u32, version: u32) -> Self::WmBase;
}

#[derive(Debug)]
struct Bound<T> {
    name: u32,
    proxy: T,
}

/// Capabilities collected so far
#[derive(Debug)]
pub struct Capabilities<C, S, W> {
    compositor: Option<Bound<C>>,
    shm: Option<Bound<S>>,
    wm_base: Option<Bound<W>>,
    seen: usize,
}

/// All three capabilities, ready for use
#[derive(Debug)]
pub struct BoundCapabilities<C, S, W> {
    pub compositor: C,
    pub shm: S,
    pub wm_base: W,
}

impl<C, S, W> Default for Capabilities<C, S, W> {
    fn default() -> Self {
        Self {
            compositor: None,
            shm: None,
            wm_base: None,
            seen: 0,
        }
    }
}

impl<C, S, W> Capabilities<C, S, W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle one `global` event; returns the capability if it was bound
    pub fn on_global<B>(&mut self, binder: &mut B, global: &GlobalDescriptor) -> Option<Capability>
    where
        B: Binder<Compositor = C, Shm = S, WmBase = W>,
    {
        self.seen += 1;
        debug!(
            "Global {}: {} v{}",
            global.name, global.interface, global.version
        );

        let capability = Capability::from_interface(&global.interface)?;
        if self.is_bound(capability) {
            debug!(
                "Ignoring duplicate {} global {}",
                capability.interface(),
                global.name
            );
            return None;
        }

        let version = capability.bind_version(global.version);
        let name = global.name;
        match capability {
            Capability::Compositor => {
                let proxy = binder.bind_compositor(name, version);
                self.compositor = Some(Bound { name, proxy });
            }
            Capability::SharedMemory => {
                let proxy = binder.bind_shm(name, version);
                self.shm = Some(Bound { name, proxy });
            }
            Capability::WindowShell => {
                let proxy = binder.bind_wm_base(name, version);
                self.wm_base = Some(Bound { name, proxy });
            }
        }

        info!("Bound {} v{}", capability.interface(), version);
        Some(capability)
    }

    /// Handle `global_remove`. Nothing is unbound: the client is short-lived
    /// and keeps using what it has.
    pub fn on_global_removed(&mut self, name: u32) {
        match self.capability_named(name) {
            Some(capability) => warn!(
                "Server withdrew bound global {} ({}); ignoring",
                name,
                capability.interface()
            ),
            None => debug!("Global {} removed", name),
        }
    }

    pub fn is_bound(&self, capability: Capability) -> bool {
        match capability {
            Capability::Compositor => self.compositor.is_some(),
            Capability::SharedMemory => self.shm.is_some(),
            Capability::WindowShell => self.wm_base.is_some(),
        }
    }

    /// Required capabilities the server has not offered
    pub fn missing(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| !self.is_bound(*c))
            .collect()
    }

    /// Number of globals advertised so far, bound or not
    pub fn globals_seen(&self) -> usize {
        self.seen
    }

    /// Hand out the bound proxies, failing if anything required is missing
    ///
    /// The set keeps its bindings so later duplicate advertisements are
    /// still ignored.
    pub fn complete(&self) -> LogoResult<BoundCapabilities<C, S, W>>
    where
        C: Clone,
        S: Clone,
        W: Clone,
    {
        match (&self.compositor, &self.shm, &self.wm_base) {
            (Some(compositor), Some(shm), Some(wm_base)) => Ok(BoundCapabilities {
                compositor: compositor.proxy.clone(),
                shm: shm.proxy.clone(),
                wm_base: wm_base.proxy.clone(),
            }),
            _ => Err(LogoError::MissingCapability {
                missing: self
                    .missing()
                    .into_iter()
                    .map(Capability::interface)
                    .collect(),
            }),
        }
    }

    fn capability_named(&self, name: u32) -> Option<Capability> {
        if self.compositor.as_ref().is_some_and(|b| b.name == name) {
            Some(Capability::Compositor)
        } else if self.shm.as_ref().is_some_and(|b| b.name == name) {
            Some(Capability::SharedMemory)
        } else if self.wm_base.as_ref().is_some_and(|b| b.name == name) {
            Some(Capability::WindowShell)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every bind request as (interface, name, version)
    #[derive(Default)]
    struct RecordingBinder {
        binds: Vec<(&'static str, u32, u32)>,
    }

    impl Binder for RecordingBinder {
        type Compositor = u32;
        type Shm = u32;
        type WmBase = u32;

        fn bind_compositor(&mut self, name: u32, version: u32) -> u32 {
            self.binds.push(("wl_compositor", name, version));
            name
        }

        fn bind_shm(&mut self, name: u32, version: u32) -> u32 {
            self.binds.push(("wl_shm", name, version));
            name
        }

        fn bind_wm_base(&mut self, name: u32, version: u32) -> u32 {
            self.binds.push(("xdg_wm_base", name, version));
            name
        }
    }

    fn global(name: u32, interface: &str, version: u32) -> GlobalDescriptor {
        GlobalDescriptor {
            name,
            interface: interface.to_string(),
            version,
        }
    }

    fn advertise(
        caps: &mut Capabilities<u32, u32, u32>,
        binder: &mut RecordingBinder,
        globals: &[GlobalDescriptor],
    ) {
        for g in globals {
            caps.on_global(binder, g);
        }
    }

    #[test]
    fn test_binds_only_allow_listed_globals() {
        let mut caps: Capabilities<u32, u32, u32> = Capabilities::new();
        let mut binder = RecordingBinder::default();
        advertise(
            &mut caps,
            &mut binder,
            &[
                global(1, "wl_compositor", 6),
                global(2, "wl_seat", 9),
                global(3, "wl_shm", 1),
                global(4, "wl_output", 4),
                global(5, "xdg_wm_base", 6),
            ],
        );

        assert_eq!(
            binder.binds,
            vec![
                ("wl_compositor", 1, 4),
                ("wl_shm", 3, 1),
                ("xdg_wm_base", 5, 1),
            ]
        );
        assert_eq!(caps.globals_seen(), 5);

        let bound = caps.complete().unwrap();
        assert_eq!((bound.compositor, bound.shm, bound.wm_base), (1, 3, 5));
    }

    #[test]
    fn test_bind_version_never_exceeds_advertised() {
        let mut caps: Capabilities<u32, u32, u32> = Capabilities::new();
        let mut binder = RecordingBinder::default();
        caps.on_global(&mut binder, &global(7, "wl_compositor", 3));

        assert_eq!(binder.binds, vec![("wl_compositor", 7, 3)]);
    }

    #[test]
    fn test_duplicate_global_keeps_first_binding() {
        let mut caps: Capabilities<u32, u32, u32> = Capabilities::new();
        let mut binder = RecordingBinder::default();

        assert_eq!(
            caps.on_global(&mut binder, &global(1, "wl_shm", 1)),
            Some(Capability::SharedMemory)
        );
        assert_eq!(caps.on_global(&mut binder, &global(9, "wl_shm", 1)), None);
        assert_eq!(binder.binds.len(), 1);
    }

    #[test]
    fn test_missing_shm_is_fatal() {
        let mut caps: Capabilities<u32, u32, u32> = Capabilities::new();
        let mut binder = RecordingBinder::default();
        advertise(
            &mut caps,
            &mut binder,
            &[global(1, "wl_compositor", 4), global(2, "xdg_wm_base", 2)],
        );

        assert_eq!(caps.missing(), vec![Capability::SharedMemory]);
        match caps.complete() {
            Err(LogoError::MissingCapability { missing }) => assert_eq!(missing, vec!["wl_shm"]),
            other => panic!("expected MissingCapability, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_registry_reports_everything_missing() {
        let caps: Capabilities<u32, u32, u32> = Capabilities::new();
        let err = caps.complete().unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            err.to_string(),
            "Required globals could not be obtained: wl_compositor, wl_shm, xdg_wm_base"
        );
    }

    #[test]
    fn test_removal_keeps_binding() {
        let mut caps: Capabilities<u32, u32, u32> = Capabilities::new();
        let mut binder = RecordingBinder::default();
        caps.on_global(&mut binder, &global(3, "wl_shm", 1));

        caps.on_global_removed(3);
        caps.on_global_removed(42);

        assert!(caps.is_bound(Capability::SharedMemory));
    }

    #[test]
    fn test_interface_lookup() {
        for capability in Capability::ALL {
            assert_eq!(
                Capability::from_interface(capability.interface()),
                Some(capability)
            );
        }
        assert_eq!(Capability::from_interface("wl_seat"), None);
    }
}
