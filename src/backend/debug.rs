// Debug messenger bridge - validation layer output
//
// Formats severity and message-type codes from the native callback into
// readable labels and routes each message through the log facade.

use ash::vk;
use std::ffi::CStr;

/// Human-readable label for a severity enumerant.
pub fn severity_label(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> &'static str {
    match severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE => "VERBOSE",
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => "INFO",
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => "WARNING",
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => "ERROR",
        _ => "UNKNOWN",
    }
}

/// Pipe-joined label for a message-type bitmask, or UNKNOWN when no bit is set.
pub fn message_type_label(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> String {
    let mut labels = Vec::new();
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::GENERAL) {
        labels.push("GENERAL");
    }
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        labels.push("VALIDATION");
    }
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        labels.push("PERFORMANCE");
    }

    if labels.is_empty() {
        return "UNKNOWN".to_string();
    }
    labels.join("|")
}

/// Create info for the messenger registered during instance setup.
pub fn messenger_create_info<'a>() -> vk::DebugUtilsMessengerCreateInfoEXTBuilder<'a> {
    vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback))
}

/// Callback handed to the driver for validation layer messages
pub unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let message = CStr::from_ptr((*p_callback_data).p_message);

    let level = match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => log::Level::Error,
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => log::Level::Warn,
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => log::Level::Info,
        _ => log::Level::Debug,
    };

    log::log!(
        level,
        "[Vulkan] {} ({}): {}",
        severity_label(message_severity),
        message_type_label(message_type),
        message.to_string_lossy()
    );

    vk::FALSE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_labels_match_enumerants() {
        assert_eq!(
            severity_label(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE),
            "VERBOSE"
        );
        assert_eq!(
            severity_label(vk::DebugUtilsMessageSeverityFlagsEXT::INFO),
            "INFO"
        );
        assert_eq!(
            severity_label(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING),
            "WARNING"
        );
        assert_eq!(
            severity_label(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR),
            "ERROR"
        );
    }

    #[test]
    fn unrecognized_severity_is_unknown() {
        assert_eq!(
            severity_label(vk::DebugUtilsMessageSeverityFlagsEXT::empty()),
            "UNKNOWN"
        );
    }

    #[test]
    fn message_types_join_with_pipes() {
        let all = vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE;
        assert_eq!(message_type_label(all), "GENERAL|VALIDATION|PERFORMANCE");

        assert_eq!(
            message_type_label(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION),
            "VALIDATION"
        );
    }

    #[test]
    fn empty_message_type_is_unknown() {
        assert_eq!(
            message_type_label(vk::DebugUtilsMessageTypeFlagsEXT::empty()),
            "UNKNOWN"
        );
    }
}
