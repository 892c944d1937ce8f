//! Value types exchanged with the Bridge library.

use std::fmt;
use std::os::raw::c_ulong;

use serde::Serialize;

/// Bridge window handle (`WINDOW_HANDLE`, a C `unsigned long`).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct WindowHandle(pub c_ulong);

impl WindowHandle {
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

/// Texture pixel formats understood by Bridge (OpenGL enum values).
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PixelFormat {
    NoFormat = 0x0,
    YCoCgDxt5 = 0x01,
    Rgb = 0x1907,
    Rgba = 0x1908,
    Bgra = 0x80E1,
    Red = 0x1903,
    RgbDxt1 = 0x83F0,
    RgbaDxt5 = 0x83F3,
    ARgtc1 = 0x8DBB,
    Srgb = 0x8C41,
    SrgbA = 0x8C43,
    R32F = 0x822E,
    Rgba32F = 0x8814,
}

impl PixelFormat {
    pub fn as_raw(self) -> u32 {
        self as u32
    }

    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0x0 => PixelFormat::NoFormat,
            0x01 => PixelFormat::YCoCgDxt5,
            0x1907 => PixelFormat::Rgb,
            0x1908 => PixelFormat::Rgba,
            0x80E1 => PixelFormat::Bgra,
            0x1903 => PixelFormat::Red,
            0x83F0 => PixelFormat::RgbDxt1,
            0x83F3 => PixelFormat::RgbaDxt5,
            0x8DBB => PixelFormat::ARgtc1,
            0x8C41 => PixelFormat::Srgb,
            0x8C43 => PixelFormat::SrgbA,
            0x822E => PixelFormat::R32F,
            0x8814 => PixelFormat::Rgba32F,
            _ => return None,
        })
    }
}

/// Subpixel offsets of one lenticular cell.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CalibrationSubpixelCell {
    pub r_offset_x: f32,
    pub r_offset_y: f32,
    pub g_offset_x: f32,
    pub g_offset_y: f32,
    pub b_offset_x: f32,
    pub b_offset_y: f32,
}

/// Display calibration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Calibration {
    pub center: f32,
    pub pitch: f32,
    pub slope: f32,
    pub width: i32,
    pub height: i32,
    pub dpi: f32,
    pub flip_x: f32,
    pub inv_view: i32,
    pub viewcone: f32,
    pub fringe: f32,
    pub cell_pattern_mode: i32,
    pub cells: Vec<CalibrationSubpixelCell>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DefaultQuiltSettings {
    pub aspect: f32,
    pub quilt_width: i32,
    pub quilt_height: i32,
    pub quilt_columns: i32,
    pub quilt_rows: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u64,
    pub height: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowPosition {
    pub x: i64,
    pub y: i64,
}

/// Version reported by the loaded Bridge library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BridgeVersion {
    pub major: u64,
    pub minor: u64,
    pub build: u64,
    /// Build hash or channel suffix, may be empty.
    pub postfix: String,
}

impl fmt::Display for BridgeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)?;
        if !self.postfix.is_empty() {
            write!(f, "-{}", self.postfix)?;
        }
        Ok(())
    }
}

/// Everything Bridge reports about one connected display.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayInfo {
    pub display_id: u64,
    pub serial: String,
    pub name: String,
    pub dimensions: Dimensions,
    pub hw_enum: i32,
    pub calibration: Calibration,
    pub viewcone: f32,
    pub default_quilt_settings: DefaultQuiltSettings,
    pub window_position: WindowPosition,
}

/// Snapshot of a Bridge window's render parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WindowData {
    pub wnd: WindowHandle,
    pub display_index: u64,
    pub device_type: i32,
    pub viewcone: f32,
    pub quilt: DefaultQuiltSettings,
    pub output: Dimensions,
    pub view_width: i32,
    pub view_height: i32,
    pub window_position: WindowPosition,
}

/// A quilt texture handed to Bridge for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuiltTexture {
    /// Native texture name or handle.
    pub texture: u64,
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    /// Views per row.
    pub columns: u32,
    /// Views per column.
    pub rows: u32,
    pub aspect: f32,
    pub zoom: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_format_raw_values() {
        assert_eq!(PixelFormat::Rgba.as_raw(), 0x1908);
        assert_eq!(PixelFormat::from_raw(0x80E1), Some(PixelFormat::Bgra));
        assert_eq!(PixelFormat::from_raw(0xDEAD), None);
    }

    #[test]
    fn test_bridge_version_display() {
        let mut version = BridgeVersion {
            major: 2,
            minor: 5,
            build: 1,
            postfix: String::new(),
        };
        assert_eq!(version.to_string(), "2.5.1");

        version.postfix = "a1b2c3".to_string();
        assert_eq!(version.to_string(), "2.5.1-a1b2c3");
    }

    #[test]
    fn test_subpixel_cell_layout() {
        assert_eq!(std::mem::size_of::<CalibrationSubpixelCell>(), 6 * 4);
    }

    #[test]
    fn test_window_handle_validity() {
        assert!(!WindowHandle::default().is_valid());
        assert!(WindowHandle(7).is_valid());
    }
}
