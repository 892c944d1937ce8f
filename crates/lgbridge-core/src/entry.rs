//! Typed descriptors for the Bridge exports this crate calls.
//!
//! Signatures follow `bridge.h`. `unsigned long` maps to `c_ulong`, which is
//! 32 bits on Windows and 64 bits on LP64 systems, and `PixelFormats` is
//! passed as its raw `u32` value.

use std::os::raw::{c_char, c_int, c_long, c_uint, c_ulong, c_ulonglong};

use libc::wchar_t;

use crate::entry_points;
use crate::types::{CalibrationSubpixelCell, WindowHandle};

/// `bool (unsigned long display_index, int* count, wchar_t* buffer)`
pub type DisplayStringFn = unsafe extern "C" fn(c_ulong, *mut c_int, *mut wchar_t) -> bool;

/// `bool (unsigned long display_index, <T>* value)`
pub type DisplayScalarFn<T> = unsafe extern "C" fn(c_ulong, *mut T) -> bool;

/// `bool (WINDOW_HANDLE wnd, <T>* value)`
pub type WindowScalarFn<T> = unsafe extern "C" fn(WindowHandle, *mut T) -> bool;

entry_points! {
    /// `initialize_bridge` on macOS and POSIX, UTF-8 application name.
    pub InitializeBridge = "initialize_bridge":
        unsafe extern "C" fn(*const c_char) -> bool;

    /// `initialize_bridge` on Windows, UTF-16 application name.
    pub InitializeBridgeWide = "initialize_bridge":
        unsafe extern "C" fn(*const u16) -> bool;

    pub UninitializeBridge = "uninitialize_bridge":
        unsafe extern "C" fn() -> bool;

    pub GetBridgeVersion = "get_bridge_version":
        unsafe extern "C" fn(*mut c_ulong, *mut c_ulong, *mut c_ulong, *mut c_int, *mut wchar_t) -> bool;

    pub InstanceWindowGl = "instance_window_gl":
        unsafe extern "C" fn(*mut WindowHandle, c_ulong) -> bool;

    pub InstanceOffscreenWindowGl = "instance_offscreen_window_gl":
        unsafe extern "C" fn(*mut WindowHandle, c_ulong) -> bool;

    pub ShowWindow = "show_window":
        unsafe extern "C" fn(WindowHandle, bool) -> bool;

    pub GetWindowDimensions = "get_window_dimensions":
        unsafe extern "C" fn(WindowHandle, *mut c_ulong, *mut c_ulong) -> bool;

    pub GetWindowPosition = "get_window_position":
        unsafe extern "C" fn(WindowHandle, *mut c_long, *mut c_long) -> bool;

    pub GetMaxTextureSize = "get_max_texture_size":
        WindowScalarFn<c_ulong>;

    pub SetInteropQuiltTextureGl = "set_interop_quilt_texture_gl":
        unsafe extern "C" fn(WindowHandle, c_ulonglong, c_uint, c_ulong, c_ulong, c_ulong, c_ulong, f32, f32) -> bool;

    pub DrawInteropQuiltTextureGl = "draw_interop_quilt_texture_gl":
        unsafe extern "C" fn(WindowHandle, c_ulonglong, c_uint, c_ulong, c_ulong, c_ulong, c_ulong, f32, f32) -> bool;

    /// `save_texture_to_file_gl` on macOS and POSIX, UTF-8 file name.
    pub SaveTextureToFileGl = "save_texture_to_file_gl":
        unsafe extern "C" fn(WindowHandle, *const c_char, c_ulonglong, c_uint, c_ulong, c_ulong) -> bool;

    /// `save_texture_to_file_gl` on Windows, UTF-16 file name.
    pub SaveTextureToFileGlWide = "save_texture_to_file_gl":
        unsafe extern "C" fn(WindowHandle, *const u16, c_ulonglong, c_uint, c_ulong, c_ulong) -> bool;

    pub GetDisplayForWindow = "get_display_for_window":
        WindowScalarFn<c_ulong>;

    pub GetDeviceType = "get_device_type":
        WindowScalarFn<c_int>;

    pub GetViewcone = "get_viewcone":
        WindowScalarFn<f32>;

    pub GetDefaultQuiltSettings = "get_default_quilt_settings":
        unsafe extern "C" fn(WindowHandle, *mut f32, *mut c_int, *mut c_int, *mut c_int, *mut c_int) -> bool;

    pub GetDisplays = "get_displays":
        unsafe extern "C" fn(*mut c_int, *mut c_ulong) -> bool;

    pub GetDeviceNameForDisplay = "get_device_name_for_display":
        DisplayStringFn;

    pub GetDeviceSerialForDisplay = "get_device_serial_for_display":
        DisplayStringFn;

    pub GetDimensionsForDisplay = "get_dimensions_for_display":
        unsafe extern "C" fn(c_ulong, *mut c_ulong, *mut c_ulong) -> bool;

    pub GetDeviceTypeForDisplay = "get_device_type_for_display":
        DisplayScalarFn<c_int>;

    pub GetViewconeForDisplay = "get_viewcone_for_display":
        DisplayScalarFn<f32>;

    pub GetCalibrationForDisplay = "get_calibration_for_display":
        unsafe extern "C" fn(
            c_ulong,
            *mut f32,
            *mut f32,
            *mut f32,
            *mut c_int,
            *mut c_int,
            *mut f32,
            *mut f32,
            *mut c_int,
            *mut f32,
            *mut f32,
            *mut c_int,
            *mut c_int,
            *mut CalibrationSubpixelCell,
        ) -> bool;

    pub GetWindowPositionForDisplay = "get_window_position_for_display":
        unsafe extern "C" fn(c_ulong, *mut c_long, *mut c_long) -> bool;

    pub GetDefaultQuiltSettingsForDisplay = "get_default_quilt_settings_for_display":
        unsafe extern "C" fn(c_ulong, *mut f32, *mut c_int, *mut c_int, *mut c_int, *mut c_int) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::EntryPoint;

    #[test]
    fn test_wide_and_narrow_views_share_symbol() {
        assert_eq!(InitializeBridge::SYMBOL, InitializeBridgeWide::SYMBOL);
        assert_eq!(SaveTextureToFileGl::SYMBOL, SaveTextureToFileGlWide::SYMBOL);
    }

    #[test]
    fn test_symbol_names() {
        assert_eq!(UninitializeBridge::SYMBOL, "uninitialize_bridge");
        assert_eq!(GetDisplays::SYMBOL, "get_displays");
        assert_eq!(
            GetDefaultQuiltSettingsForDisplay::SYMBOL,
            "get_default_quilt_settings_for_display"
        );
    }
}
