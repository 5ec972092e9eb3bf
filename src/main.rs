// =============================================================================
// VULKAN INITIALIZATION - Hello Triangle groundwork
// =============================================================================
//
// Stands up everything a renderer needs before the first draw call:
// instance, validation layers, debug messenger, surface, device selection,
// logical device, and the swapchain configuration queries. Nothing is
// rendered; the event loop idles until the window is closed.
//
// STARTUP FLOW:
// 1. Window creation (winit, fixed size, non-resizable)
// 2. Instance + validation layers + debug messenger
// 3. Surface (platform window connection)
// 4. Physical device selection (first with graphics + present queues)
// 5. Logical device + queue handles
// 6. Swapchain support query (format / present mode / extent)
//
// =============================================================================

mod backend;
mod config;

use anyhow::{Context, Result};
use backend::{swapchain, SwapChainSupportDetails, VulkanDevice};
use config::Config;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes},
};

// =============================================================================
// ENTRY POINT
// =============================================================================

fn main() -> Result<()> {
    // Load configuration from config.toml
    let config = Config::load();

    // Initialize logging
    init_logging();
    log::info!("Starting Vulkan initialization");
    log::info!("Window: {}x{}", config.window.width, config.window.height);

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    // Failures inside the event loop surface here so the process exits
    // with a failure status
    if let Some(e) = app.init_error.take() {
        return Err(e);
    }

    Ok(())
}

/// Initialize logging, Info level unless RUST_LOG overrides it
fn init_logging() {
    use env_logger::Builder;
    use log::LevelFilter;

    let mut builder = Builder::from_default_env();
    builder.filter_level(LevelFilter::Info);
    builder.init();
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Main application struct holding the window and Vulkan resources.
///
/// IMPORTANT: Field order matters for Drop! The device wrapper must be
/// destroyed before the window it presents to.
pub struct App {
    config: Config,
    device: Option<Arc<VulkanDevice>>,
    window: Option<Arc<Window>>,
    /// First error hit during window/Vulkan setup, reported from main
    init_error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            device: None,
            window: None,
            init_error: None,
        }
    }

    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    /// Initialize all Vulkan resources.
    ///
    /// Called once when the window is created. Sets up the instance, debug
    /// messenger, surface, and devices, then queries what a swapchain for
    /// this window would look like.
    fn init_vulkan(&mut self, window: &Window) -> Result<()> {
        log::info!("Initializing Vulkan...");

        // Validation needs both a debug build and the config toggle
        let enable_validation = cfg!(debug_assertions) && self.config.debug.validation_layers;
        let device = VulkanDevice::new(window, &self.config.window.title, enable_validation)?;

        // Describe the swapchain this surface would get. Queried fresh from
        // the live device+surface pair; nothing is created from it.
        let support = SwapChainSupportDetails::query(
            &device.surface_loader,
            device.physical_device,
            device.surface,
        )?;

        if support.formats.is_empty() || support.present_modes.is_empty() {
            anyhow::bail!("Surface reports no formats or no present modes");
        }

        let surface_format = swapchain::choose_surface_format(&support.formats)
            .context("No surface format available")?;
        let present_mode = swapchain::choose_present_mode(&support.present_modes);

        let size = window.inner_size();
        let extent = swapchain::choose_extent(&support.capabilities, size.width, size.height);

        log::info!(
            "Swapchain config: {:?} ({:?}), {:?}, {}x{}",
            surface_format.format,
            surface_format.color_space,
            present_mode,
            extent.width,
            extent.height
        );

        self.device = Some(device);

        log::info!("Vulkan initialized successfully!");
        Ok(())
    }
}

// =============================================================================
// EVENT HANDLING
// =============================================================================

impl ApplicationHandler for App {
    /// Called when the application is ready to create windows.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        // Fixed-size window; no client rendering API is attached to it
        let window_attributes = WindowAttributes::default()
            .with_title(&self.config.window.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ))
            .with_resizable(false);

        let window = match event_loop.create_window(window_attributes) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {:?}", e);
                self.init_error = Some(e.into());
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.init_vulkan(&window) {
            log::error!("Failed to initialize Vulkan: {:?}", e);
            self.init_error = Some(e);
            event_loop.exit();
            return;
        }

        self.window = Some(window);
    }

    /// Handle window events. The loop does no per-frame work; it only
    /// waits for a close request.
    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down...");
                // Vulkan objects go before the window they present to
                drop(self.device.take());
                event_loop.exit();
            }
            _ => {}
        }
    }
}
