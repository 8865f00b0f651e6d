//! Wayland client: application state, protocol event handlers and the
//! event loop.
//!
//! Startup runs in a fixed order:
//! 1. connect and enumerate globals with one roundtrip
//! 2. require `wl_compositor`, `wl_shm` and `xdg_wm_base`
//! 3. create the surface, shared memory pool, buffer and toplevel
//! 4. send the initial buffer-less commit
//!
//! After that the event loop blocks in dispatch until the toplevel is
//! closed or the connection fails. Handlers cannot return errors, so a
//! failure inside one is parked on [`App`] and returned by the loop right
//! after the dispatch that produced it.

use log::{debug, error, info};
use wayland_client::{
    delegate_noop,
    protocol::{
        wl_buffer::WlBuffer,
        wl_compositor::WlCompositor,
        wl_registry::{self, WlRegistry},
        wl_shm::{self, WlShm},
        wl_shm_pool::WlShmPool,
        wl_surface::WlSurface,
    },
    Connection, Dispatch, Proxy, QueueHandle, WEnum,
};
use wayland_protocols::xdg::shell::client::{
    xdg_surface::{self, XdgSurface},
    xdg_toplevel::{self, XdgToplevel},
    xdg_wm_base::{self, XdgWmBase},
};

use crate::config::LogoConfig;
use crate::error::{LogoError, LogoResult};
use crate::registry::{Binder, BoundCapabilities, Capabilities, GlobalDescriptor};
use crate::renderer::{self, FilePixelSource};
use crate::shm::{BufferLayout, ShmRegion};
use crate::transport::{Dispatcher, Transport};
use crate::window::{SurfaceOps, WindowController, WindowEvent, WindowState};

pub type WaylandCapabilities = Capabilities<WlCompositor, WlShm, XdgWmBase>;
pub type WaylandBound = BoundCapabilities<WlCompositor, WlShm, XdgWmBase>;

/// Binds globals on the live registry
struct RegistryBinder<'a> {
    registry: &'a WlRegistry,
    qh: &'a QueueHandle<App>,
}

impl Binder for RegistryBinder<'_> {
    type Compositor = WlCompositor;
    type Shm = WlShm;
    type WmBase = XdgWmBase;

    fn bind_compositor(&mut self, name: u32, version: u32) -> WlCompositor {
        self.registry.bind(name, version, self.qh, ())
    }

    fn bind_shm(&mut self, name: u32, version: u32) -> WlShm {
        self.registry.bind(name, version, self.qh, ())
    }

    fn bind_wm_base(&mut self, name: u32, version: u32) -> XdgWmBase {
        self.registry.bind(name, version, self.qh, ())
    }
}

/// Every object backing the visible window
struct Window {
    surface: WlSurface,
    xdg_surface: XdgSurface,
    toplevel: XdgToplevel,
    pool: WlShmPool,
    buffer: WlBuffer,
    layout: BufferLayout,
    region: ShmRegion,
    source: FilePixelSource,
}

impl Window {
    fn create(
        caps: &WaylandBound,
        config: &LogoConfig,
        layout: BufferLayout,
        qh: &QueueHandle<App>,
    ) -> LogoResult<Self> {
        let surface = caps.compositor.create_surface(qh, ());

        let region = ShmRegion::allocate(layout.byte_len())?;
        let pool = caps
            .shm
            .create_pool(region.fd(), region.len() as i32, qh, ());
        let buffer = pool.create_buffer(
            layout.offset,
            layout.width,
            layout.height,
            layout.stride,
            layout.format,
            qh,
            (),
        );

        let xdg_surface = caps.wm_base.get_xdg_surface(&surface, qh, ());
        let toplevel = xdg_surface.get_toplevel(qh, ());
        toplevel.set_title(config.window.title.clone());

        debug!(
            "Created {}x{} window with {} byte pool",
            layout.width,
            layout.height,
            region.len()
        );

        Ok(Self {
            surface,
            xdg_surface,
            toplevel,
            pool,
            buffer,
            layout,
            region,
            source: FilePixelSource::new(&config.image.pixel_source),
        })
    }

    /// Destroy protocol objects child-first
    ///
    /// The region is handed back so it outlives the flush of these requests.
    fn destroy(self) -> ShmRegion {
        self.buffer.destroy();
        self.pool.destroy();
        self.toplevel.destroy();
        self.xdg_surface.destroy();
        self.surface.destroy();
        self.region
    }
}

impl SurfaceOps for Window {
    fn attach_buffer(&mut self) {
        self.surface.attach(Some(&self.buffer), 0, 0);
    }

    fn damage_all(&mut self, width: i32, height: i32) {
        if self.surface.version() >= 4 {
            self.surface.damage_buffer(0, 0, width, height);
        } else {
            self.surface.damage(0, 0, width, height);
        }
    }

    fn ack_configure(&mut self, serial: u32) {
        self.xdg_surface.ack_configure(serial);
    }

    fn render(&mut self) -> LogoResult<()> {
        renderer::render_from(
            self.region.as_mut_slice(),
            &self.source,
            self.layout.width as u32,
            self.layout.height as u32,
        )
    }

    fn commit(&mut self) {
        self.surface.commit();
    }
}

/// Application state handed to every event handler
pub struct App {
    capabilities: WaylandCapabilities,
    bound: Option<WaylandBound>,
    window: Option<Window>,
    controller: WindowController,
    fatal: Option<LogoError>,
}

impl App {
    pub fn new(layout: &BufferLayout) -> Self {
        Self {
            capabilities: WaylandCapabilities::new(),
            bound: None,
            window: None,
            controller: WindowController::new(layout.width, layout.height),
            fatal: None,
        }
    }

    pub fn window_state(&self) -> WindowState {
        self.controller.state()
    }

    /// Record the first fatal error raised inside a handler
    fn fail(&mut self, err: LogoError) {
        error!("{}", err);
        if self.fatal.is_none() {
            self.fatal = Some(err);
        }
    }

    fn window_event(&mut self, event: WindowEvent) {
        let Some(window) = self.window.as_mut() else {
            debug!("Window event {:?} before window exists", event);
            return;
        };
        if let Err(err) = self.controller.handle(event, window) {
            self.fail(err);
        }
    }

    /// Repeat dispatch until the quit flag is set or something fails
    pub fn run_event_loop<E: Dispatcher<App>>(&mut self, events: &mut E) -> LogoResult<()> {
        loop {
            if let Some(err) = self.fatal.take() {
                return Err(err);
            }
            if self.controller.should_quit() {
                info!("Window closed, leaving event loop");
                return Ok(());
            }
            events.dispatch_blocking(self)?;
        }
    }

    /// Destroy the window and globals that have destructors, flush, then
    /// unmap and close the memfd
    fn teardown<E: Dispatcher<App>>(&mut self, events: &mut E) {
        let region = self.window.take().map(Window::destroy);
        if let Some(bound) = self.bound.take() {
            // wl_compositor and wl_shm v1 have no destructor request
            bound.wm_base.destroy();
        }
        if let Err(e) = events.flush() {
            debug!("Flush during teardown failed: {}", e);
        }
        drop(region);
    }
}

/// Require every capability, then build the window from them
///
/// Nothing is created when a capability is missing.
fn establish<C, S, W, T, F>(
    capabilities: &Capabilities<C, S, W>,
    create: F,
) -> LogoResult<(BoundCapabilities<C, S, W>, T)>
where
    C: Clone,
    S: Clone,
    W: Clone,
    F: FnOnce(&BoundCapabilities<C, S, W>) -> LogoResult<T>,
{
    let bound = capabilities.complete()?;
    let window = create(&bound)?;
    Ok((bound, window))
}

/// Connect, negotiate, show the image and block until the window is closed
pub fn run(config: &LogoConfig) -> LogoResult<()> {
    let layout = BufferLayout::for_window(&config.window)?;

    let mut transport = Transport::<App>::connect(&config.display.endpoint)?;
    let qh = transport.handle();
    let mut app = App::new(&layout);

    let _registry = transport.connection().display().get_registry(&qh, ());
    transport.round_trip(&mut app)?;
    info!(
        "Server advertised {} globals",
        app.capabilities.globals_seen()
    );

    let (bound, mut window) = establish(&app.capabilities, |bound| {
        Window::create(bound, config, layout, &qh)
    })?;
    app.controller.begin(&mut window);
    app.window = Some(window);
    app.bound = Some(bound);

    let result = app.run_event_loop(&mut transport);

    app.teardown(&mut transport);
    transport.disconnect();
    result
}

impl Dispatch<WlRegistry, ()> for App {
    fn event(
        state: &mut Self,
        registry: &WlRegistry,
        event: wl_registry::Event,
        _data: &(),
        _conn: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                let mut binder = RegistryBinder { registry, qh };
                state.capabilities.on_global(
                    &mut binder,
                    &GlobalDescriptor {
                        name,
                        interface,
                        version,
                    },
                );
            }
            wl_registry::Event::GlobalRemove { name } => {
                state.capabilities.on_global_removed(name);
            }
            _ => {}
        }
    }
}

impl Dispatch<WlShm, ()> for App {
    fn event(
        _state: &mut Self,
        _shm: &WlShm,
        event: wl_shm::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_shm::Event::Format { format } = event {
            match format {
                WEnum::Value(format) => debug!("wl_shm supports {:?}", format),
                WEnum::Unknown(raw) => debug!("wl_shm supports unknown format {:#x}", raw),
            }
        }
    }
}

impl Dispatch<XdgWmBase, ()> for App {
    fn event(
        _state: &mut Self,
        wm_base: &XdgWmBase,
        event: xdg_wm_base::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            wm_base.pong(serial);
        }
    }
}

impl Dispatch<XdgSurface, ()> for App {
    fn event(
        state: &mut Self,
        _xdg_surface: &XdgSurface,
        event: xdg_surface::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            state.window_event(WindowEvent::SurfaceConfigure { serial });
        }
    }
}

impl Dispatch<XdgToplevel, ()> for App {
    fn event(
        state: &mut Self,
        _toplevel: &XdgToplevel,
        event: xdg_toplevel::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            xdg_toplevel::Event::Configure { width, height, .. } => {
                state.window_event(WindowEvent::ToplevelConfigure { width, height });
            }
            xdg_toplevel::Event::ConfigureBounds { width, height } => {
                state.window_event(WindowEvent::ToplevelConfigureBounds { width, height });
            }
            xdg_toplevel::Event::Close => {
                state.window_event(WindowEvent::Close);
            }
            _ => {}
        }
    }
}

delegate_noop!(App: WlCompositor);
delegate_noop!(App: WlShmPool);
delegate_noop!(App: ignore WlBuffer);
delegate_noop!(App: ignore WlSurface);
