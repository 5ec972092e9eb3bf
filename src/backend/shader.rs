// Shader module loading
//
// Vulkan consumes SPIR-V bytecode. Nothing in the startup path submits
// shader work yet, so the loader is exercised by tests only.

use anyhow::{Context, Result};
use ash::vk;
use std::path::Path;

use super::VulkanDevice;

/// Read compiled SPIR-V bytecode from disk.
pub fn read_spirv<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).with_context(|| format!("Failed to open shader file: {:?}", path))
}

/// Wrap SPIR-V bytes into a shader module.
pub fn create_shader_module(device: &VulkanDevice, code: &[u8]) -> Result<vk::ShaderModule> {
    // SPIR-V uses 4-byte words, so we need to convert bytes to u32s
    // Safety: We trust that the shader compiler produces valid aligned data
    let code_aligned =
        unsafe { std::slice::from_raw_parts(code.as_ptr() as *const u32, code.len() / 4) };

    let create_info = vk::ShaderModuleCreateInfo::builder().code(code_aligned);

    unsafe {
        device
            .device
            .create_shader_module(&create_info, None)
            .context("Failed to create shader module")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_spirv_fails_on_missing_file() {
        let err = read_spirv("does-not-exist.spv").unwrap_err();
        assert!(err.to_string().contains("does-not-exist.spv"));
    }

    #[test]
    fn read_spirv_returns_file_bytes() {
        let path = std::env::temp_dir().join("read_spirv_returns_file_bytes.spv");
        std::fs::write(&path, [0x03, 0x02, 0x23, 0x07]).unwrap();

        let bytes = read_spirv(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(bytes, [0x03, 0x02, 0x23, 0x07]);
    }
}
