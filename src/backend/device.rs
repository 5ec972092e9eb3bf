// Vulkan Device - Core GPU interface
//
// Responsibilities:
// - Instance creation with validation layers
// - Debug messenger setup
// - Surface creation (platform window connection)
// - Physical device selection (first device with usable queues)
// - Logical device + queue creation

use anyhow::{Context, Result};
use ash::{vk, Entry};
use std::collections::HashSet;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::sync::Arc;
use winit::window::Window;

use super::debug;

/// Validation layers requested when the toggle is on.
const VALIDATION_LAYERS: [&CStr; 1] = [c"VK_LAYER_KHRONOS_validation"];

/// Queue family indices located during a suitability check.
///
/// A device is only usable once both families are found; on most hardware
/// they resolve to the same index.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics_family: Option<u32>,
    pub present_family: Option<u32>,
}

impl QueueFamilyIndices {
    pub fn is_complete(&self) -> bool {
        self.graphics_family.is_some() && self.present_family.is_some()
    }
}

/// Vulkan device wrapper with automatic cleanup
pub struct VulkanDevice {
    // Vulkan handles (order matters for drop!)
    pub device: ash::Device,
    pub physical_device: vk::PhysicalDevice,
    pub surface: vk::SurfaceKHR,
    pub surface_loader: ash::extensions::khr::Surface,
    pub instance: ash::Instance,
    _entry: Entry,

    // Queue handles
    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,
    pub graphics_queue_family: u32,
    pub present_queue_family: u32,

    // Debug utils (if validation enabled)
    debug_utils: Option<(ash::extensions::ext::DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

impl VulkanDevice {
    /// Create the full Vulkan stack for a window.
    ///
    /// # Arguments
    /// * `window` - Window the surface is created for
    /// * `app_name` - Application name reported to the driver
    /// * `enable_validation` - Enable Vulkan validation layers (debug only)
    pub fn new(window: &Window, app_name: &str, enable_validation: bool) -> Result<Arc<Self>> {
        log::info!("Creating Vulkan device: {}", app_name);

        // Step 1: Load Vulkan library
        let entry = unsafe { Entry::load() }
            .context("Failed to load Vulkan library. Is Vulkan installed?")?;

        // Step 2: Create instance (validates layers and extensions first)
        let instance = Self::create_instance(&entry, app_name, enable_validation)?;

        // Step 3: Setup debug messenger if validation enabled
        let debug_utils = if enable_validation {
            Some(Self::setup_debug_messenger(&entry, &instance)?)
        } else {
            None
        };

        // Step 4: Create surface (platform-specific window connection)
        let surface = Self::create_surface(&entry, &instance, window)?;
        let surface_loader = ash::extensions::khr::Surface::new(&entry, &instance);

        // Step 5: Pick physical device (GPU)
        let (physical_device, indices) =
            Self::pick_physical_device(&instance, &surface_loader, surface)?;

        // Selection only succeeds with a complete index set
        let graphics_queue_family = indices
            .graphics_family
            .context("Graphics queue family missing after device selection")?;
        let present_queue_family = indices
            .present_family
            .context("Present queue family missing after device selection")?;

        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        log::info!(
            "Selected GPU: {}",
            unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }.to_string_lossy()
        );
        log::info!(
            "API Version: {}.{}.{}",
            vk::api_version_major(properties.api_version),
            vk::api_version_minor(properties.api_version),
            vk::api_version_patch(properties.api_version)
        );
        log::info!(
            "Queue families: graphics={}, present={}",
            graphics_queue_family,
            present_queue_family
        );

        // Step 6: Create logical device and fetch queue handles
        let (device, graphics_queue, present_queue) = Self::create_logical_device(
            &instance,
            physical_device,
            graphics_queue_family,
            present_queue_family,
        )?;

        Ok(Arc::new(Self {
            device,
            physical_device,
            surface,
            surface_loader,
            instance,
            _entry: entry,
            graphics_queue,
            present_queue,
            graphics_queue_family,
            present_queue_family,
            debug_utils,
        }))
    }

    fn create_instance(
        entry: &Entry,
        app_name: &str,
        enable_validation: bool,
    ) -> Result<ash::Instance> {
        let app_name_cstr = CString::new(app_name)?;
        let engine_name = CString::new("No Engine")?;

        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name_cstr)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(&engine_name)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        // Validation layers
        let layers: Vec<&CStr> = if enable_validation {
            VALIDATION_LAYERS.to_vec()
        } else {
            Vec::new()
        };
        Self::check_layer_support(entry, &layers)?;

        // Required extensions (surface + platform surface, debug utils when validating)
        let extensions = Self::required_extensions(enable_validation);
        Self::check_extension_support(entry, &extensions)?;

        let layer_ptrs: Vec<*const c_char> = layers.iter().map(|l| l.as_ptr()).collect();
        let extension_ptrs: Vec<*const c_char> = extensions.iter().map(|e| e.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs);

        let instance = unsafe { entry.create_instance(&create_info, None) }
            .context("Failed to create Vulkan instance")?;

        Ok(instance)
    }

    /// Instance extensions this application cannot run without.
    fn required_extensions(enable_validation: bool) -> Vec<&'static CStr> {
        let mut extensions = vec![
            ash::extensions::khr::Surface::name(),
            #[cfg(target_os = "windows")]
            ash::extensions::khr::Win32Surface::name(),
            #[cfg(target_os = "linux")]
            ash::extensions::khr::XlibSurface::name(),
            #[cfg(target_os = "linux")]
            ash::extensions::khr::WaylandSurface::name(),
        ];

        if enable_validation {
            extensions.push(ash::extensions::ext::DebugUtils::name());
        }

        extensions
    }

    /// Verify every required layer is in the platform's supported set.
    fn check_layer_support(entry: &Entry, required: &[&CStr]) -> Result<()> {
        let available = entry
            .enumerate_instance_layer_properties()
            .context("Failed to enumerate instance layers")?;

        let names: Vec<CString> = available
            .iter()
            .map(|props| unsafe { CStr::from_ptr(props.layer_name.as_ptr()) }.to_owned())
            .collect();

        for name in &names {
            log::debug!("Supported layer: {}", name.to_string_lossy());
        }

        if let Some(missing) = find_missing(required, &names) {
            anyhow::bail!("Required layer not supported: {}", missing.to_string_lossy());
        }

        Ok(())
    }

    /// Verify every required instance extension is in the supported set.
    fn check_extension_support(entry: &Entry, required: &[&CStr]) -> Result<()> {
        let available = entry
            .enumerate_instance_extension_properties(None)
            .context("Failed to enumerate instance extensions")?;

        let names: Vec<CString> = available
            .iter()
            .map(|props| unsafe { CStr::from_ptr(props.extension_name.as_ptr()) }.to_owned())
            .collect();

        for name in &names {
            log::debug!("Supported extension: {}", name.to_string_lossy());
        }

        if let Some(missing) = find_missing(required, &names) {
            anyhow::bail!(
                "Required extension not supported: {}",
                missing.to_string_lossy()
            );
        }

        Ok(())
    }

    fn setup_debug_messenger(
        entry: &Entry,
        instance: &ash::Instance,
    ) -> Result<(ash::extensions::ext::DebugUtils, vk::DebugUtilsMessengerEXT)> {
        let debug_utils = ash::extensions::ext::DebugUtils::new(entry, instance);
        let create_info = debug::messenger_create_info();

        let messenger = unsafe { debug_utils.create_debug_utils_messenger(&create_info, None) }
            .context("Failed to set up debug messenger")?;

        Ok((debug_utils, messenger))
    }

    fn create_surface(
        entry: &Entry,
        instance: &ash::Instance,
        window: &Window,
    ) -> Result<vk::SurfaceKHR> {
        use raw_window_handle::{
            HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle,
        };

        let window_handle = window
            .window_handle()
            .context("Failed to get window handle")?
            .as_raw();
        let display_handle = window
            .display_handle()
            .context("Failed to get display handle")?
            .as_raw();

        match (display_handle, window_handle) {
            #[cfg(target_os = "windows")]
            (RawDisplayHandle::Windows(_), RawWindowHandle::Win32(handle)) => {
                let hinstance =
                    handle.hinstance.map(|h| h.get()).unwrap_or(0) as *const std::ffi::c_void;
                let hwnd = handle.hwnd.get() as *const std::ffi::c_void;
                let create_info = vk::Win32SurfaceCreateInfoKHR::builder()
                    .hinstance(hinstance)
                    .hwnd(hwnd);
                let loader = ash::extensions::khr::Win32Surface::new(entry, instance);
                unsafe { loader.create_win32_surface(&create_info, None) }
                    .context("Failed to create Win32 surface")
            }

            #[cfg(target_os = "linux")]
            (RawDisplayHandle::Xlib(display), RawWindowHandle::Xlib(handle)) => {
                let dpy = display
                    .display
                    .map_or(std::ptr::null_mut(), |d| d.as_ptr());
                let create_info = vk::XlibSurfaceCreateInfoKHR::builder()
                    .dpy(dpy as *mut _)
                    .window(handle.window);
                let loader = ash::extensions::khr::XlibSurface::new(entry, instance);
                unsafe { loader.create_xlib_surface(&create_info, None) }
                    .context("Failed to create Xlib surface")
            }

            #[cfg(target_os = "linux")]
            (RawDisplayHandle::Wayland(display), RawWindowHandle::Wayland(handle)) => {
                let create_info = vk::WaylandSurfaceCreateInfoKHR::builder()
                    .display(display.display.as_ptr() as *mut _)
                    .surface(handle.surface.as_ptr() as *mut _);
                let loader = ash::extensions::khr::WaylandSurface::new(entry, instance);
                unsafe { loader.create_wayland_surface(&create_info, None) }
                    .context("Failed to create Wayland surface")
            }

            _ => anyhow::bail!("Unsupported window handle type"),
        }
    }

    /// Take the first enumerated device with a complete queue family set.
    /// No scoring between candidates.
    fn pick_physical_device(
        instance: &ash::Instance,
        surface_loader: &ash::extensions::khr::Surface,
        surface: vk::SurfaceKHR,
    ) -> Result<(vk::PhysicalDevice, QueueFamilyIndices)> {
        let devices = unsafe { instance.enumerate_physical_devices() }
            .context("Failed to enumerate physical devices")?;

        if devices.is_empty() {
            anyhow::bail!("No Vulkan-capable GPU found");
        }

        for device in devices {
            let indices = Self::find_queue_families(instance, surface_loader, device, surface)?;
            if indices.is_complete() {
                return Ok((device, indices));
            }
        }

        anyhow::bail!("No suitable GPU found")
    }

    /// Locate graphics and present queue families for one device.
    fn find_queue_families(
        instance: &ash::Instance,
        surface_loader: &ash::extensions::khr::Surface,
        device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<QueueFamilyIndices> {
        let families = unsafe { instance.get_physical_device_queue_family_properties(device) };

        let mut indices = QueueFamilyIndices {
            graphics_family: graphics_family_index(&families),
            present_family: None,
        };

        // Present support is a per-family surface query, not a capability bit
        for i in 0..families.len() {
            let supported = unsafe {
                surface_loader.get_physical_device_surface_support(device, i as u32, surface)
            }
            .context("Failed to query surface support")?;

            if supported {
                indices.present_family = Some(i as u32);
                break;
            }
        }

        Ok(indices)
    }

    fn create_logical_device(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        graphics_family: u32,
        present_family: u32,
    ) -> Result<(ash::Device, vk::Queue, vk::Queue)> {
        // One create info per distinct family; graphics and present often coincide
        let unique_families: HashSet<u32> = [graphics_family, present_family].into_iter().collect();

        let queue_priorities = [1.0];
        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .into_iter()
            .map(|family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
                    .build()
            })
            .collect();

        // No device features or extensions needed yet
        let features = vk::PhysicalDeviceFeatures::default();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_create_infos)
            .enabled_features(&features);

        let device = unsafe { instance.create_device(physical_device, &create_info, None) }
            .context("Failed to create logical device")?;

        let graphics_queue = unsafe { device.get_device_queue(graphics_family, 0) };
        let present_queue = unsafe { device.get_device_queue(present_family, 0) };

        Ok((device, graphics_queue, present_queue))
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        log::info!("Destroying Vulkan device...");

        // Cleanup in reverse order of creation
        unsafe {
            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);

            if let Some((debug_utils, messenger)) = self.debug_utils.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}

/// Index of the first family advertising the graphics capability bit.
fn graphics_family_index(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    families
        .iter()
        .enumerate()
        .find(|(_, props)| props.queue_flags.contains(vk::QueueFlags::GRAPHICS))
        .map(|(i, _)| i as u32)
}

/// First required name that does not appear in the supported set.
/// Names compare by exact match.
fn find_missing<'a>(required: &[&'a CStr], supported: &[CString]) -> Option<&'a CStr> {
    required
        .iter()
        .copied()
        .find(|req| !supported.iter().any(|sup| sup.as_c_str() == *req))
}
