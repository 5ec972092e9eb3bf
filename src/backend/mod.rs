// Backend module - Vulkan abstraction layer
//
// Design: Thin wrapper around ash, initialization only

pub mod debug;
pub mod device;
pub mod shader;
pub mod swapchain;

pub use device::VulkanDevice;
pub use swapchain::SwapChainSupportDetails;
