//! OpenGL window operations on an initialized bridge.
//!
//! Window and texture handles are passed through untouched.

use std::os::raw::{c_int, c_long, c_ulong};
use std::path::Path;

use crate::config::FIRST_LOOKING_GLASS_DEVICE;
use crate::entry::{
    DrawInteropQuiltTextureGl, GetDefaultQuiltSettings, GetDeviceType, GetDisplayForWindow,
    GetMaxTextureSize, GetViewcone, GetWindowDimensions, GetWindowPosition, InstanceOffscreenWindowGl,
    InstanceWindowGl, SaveTextureToFileGl, SaveTextureToFileGlWide, SetInteropQuiltTextureGl,
    ShowWindow,
};
use crate::error::{BridgeError, Result};
use crate::loader::LibraryLoader;
use crate::marshal::{to_c_ulong, NativeString};
use crate::types::{
    DefaultQuiltSettings, Dimensions, PixelFormat, QuiltTexture, WindowData, WindowHandle,
    WindowPosition,
};
use crate::Bridge;

fn display_index(display: Option<u64>) -> Result<c_ulong> {
    match display {
        Some(index) => to_c_ulong(index, "display index"),
        None => Ok(c_ulong::from(FIRST_LOOKING_GLASS_DEVICE)),
    }
}

impl<L: LibraryLoader> Bridge<L> {
    /// Open a Bridge window on `display`, or on the first Looking Glass
    /// device when `None`.
    pub fn instance_window_gl(&self, display: Option<u64>) -> Result<WindowHandle> {
        let display = display_index(display)?;
        let mut wnd = WindowHandle::default();
        // SAFETY: valid out-pointer.
        self.call_checked::<InstanceWindowGl>(|f| unsafe { f(&mut wnd, display) })?;
        Ok(wnd)
    }

    /// Like [`Bridge::instance_window_gl`] but renders offscreen.
    pub fn instance_offscreen_window_gl(&self, display: Option<u64>) -> Result<WindowHandle> {
        let display = display_index(display)?;
        let mut wnd = WindowHandle::default();
        // SAFETY: valid out-pointer.
        self.call_checked::<InstanceOffscreenWindowGl>(|f| unsafe { f(&mut wnd, display) })?;
        Ok(wnd)
    }

    pub fn show_window(&self, wnd: WindowHandle, visible: bool) -> Result<()> {
        // SAFETY: scalar arguments only.
        self.call_checked::<ShowWindow>(|f| unsafe { f(wnd, visible) })
    }

    pub fn window_dimensions(&self, wnd: WindowHandle) -> Result<Dimensions> {
        let (mut width, mut height): (c_ulong, c_ulong) = (0, 0);
        // SAFETY: valid out-pointers.
        self.call_checked::<GetWindowDimensions>(|f| unsafe { f(wnd, &mut width, &mut height) })?;
        Ok(Dimensions {
            width: width.into(),
            height: height.into(),
        })
    }

    pub fn window_position(&self, wnd: WindowHandle) -> Result<WindowPosition> {
        let (mut x, mut y): (c_long, c_long) = (0, 0);
        // SAFETY: valid out-pointers.
        self.call_checked::<GetWindowPosition>(|f| unsafe { f(wnd, &mut x, &mut y) })?;
        Ok(WindowPosition {
            x: x.into(),
            y: y.into(),
        })
    }

    pub fn max_texture_size(&self, wnd: WindowHandle) -> Result<u64> {
        let mut size: c_ulong = 0;
        // SAFETY: valid out-pointer.
        self.call_checked::<GetMaxTextureSize>(|f| unsafe { f(wnd, &mut size) })?;
        Ok(size.into())
    }

    /// Register `quilt` as the window's interop texture.
    pub fn set_interop_quilt_texture_gl(&self, wnd: WindowHandle, quilt: &QuiltTexture) -> Result<()> {
        // SAFETY: scalar arguments only.
        self.call_checked::<SetInteropQuiltTextureGl>(|f| unsafe {
            f(
                wnd,
                quilt.texture,
                quilt.format.as_raw(),
                c_ulong::from(quilt.width),
                c_ulong::from(quilt.height),
                c_ulong::from(quilt.columns),
                c_ulong::from(quilt.rows),
                quilt.aspect,
                quilt.zoom,
            )
        })
    }

    /// Draw `quilt` to the window.
    pub fn draw_interop_quilt_texture_gl(&self, wnd: WindowHandle, quilt: &QuiltTexture) -> Result<()> {
        // SAFETY: scalar arguments only.
        self.call_checked::<DrawInteropQuiltTextureGl>(|f| unsafe {
            f(
                wnd,
                quilt.texture,
                quilt.format.as_raw(),
                c_ulong::from(quilt.width),
                c_ulong::from(quilt.height),
                c_ulong::from(quilt.columns),
                c_ulong::from(quilt.rows),
                quilt.aspect,
                quilt.zoom,
            )
        })
    }

    /// Save an OpenGL texture to an image file.
    ///
    /// The file name is marshaled as UTF-16 on Windows and UTF-8 elsewhere.
    pub fn save_texture_to_file_gl(
        &self,
        wnd: WindowHandle,
        filename: &Path,
        texture: u64,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let name = filename.to_str().ok_or_else(|| {
            BridgeError::InvalidString(format!("{} is not valid Unicode", filename.display()))
        })?;
        let name = NativeString::for_platform(name, self.platform())?;
        let (format, width, height) = (format.as_raw(), c_ulong::from(width), c_ulong::from(height));

        match &name {
            NativeString::Utf16(wide) => {
                // SAFETY: NUL-terminated UTF-16 that outlives the call.
                self.call_checked::<SaveTextureToFileGlWide>(|f| unsafe {
                    f(wnd, wide.as_ptr(), texture, format, width, height)
                })
            }
            NativeString::Utf8(utf8) => {
                // SAFETY: NUL-terminated UTF-8 that outlives the call.
                self.call_checked::<SaveTextureToFileGl>(|f| unsafe {
                    f(wnd, utf8.as_ptr(), texture, format, width, height)
                })
            }
        }
    }

    /// Snapshot of a window's render parameters. An invalid handle yields
    /// the default snapshot without calling into Bridge.
    pub fn window_data(&self, wnd: WindowHandle) -> Result<WindowData> {
        let mut data = WindowData {
            wnd,
            ..WindowData::default()
        };
        if !wnd.is_valid() {
            return Ok(data);
        }

        let mut display: c_ulong = 0;
        let mut device_type: c_int = 0;
        let mut viewcone = 0.0f32;
        let mut q = DefaultQuiltSettings::default();

        // SAFETY: every out-pointer below references a live local.
        self.call_checked::<GetDisplayForWindow>(|f| unsafe { f(wnd, &mut display) })?;
        self.call_checked::<GetDeviceType>(|f| unsafe { f(wnd, &mut device_type) })?;
        self.call_checked::<GetViewcone>(|f| unsafe { f(wnd, &mut viewcone) })?;
        self.call_checked::<GetDefaultQuiltSettings>(|f| unsafe {
            f(
                wnd,
                &mut q.aspect,
                &mut q.quilt_width,
                &mut q.quilt_height,
                &mut q.quilt_columns,
                &mut q.quilt_rows,
            )
        })?;

        data.display_index = display.into();
        data.device_type = device_type;
        data.viewcone = viewcone;
        data.quilt = q;
        data.output = self.window_dimensions(wnd)?;
        data.window_position = self.window_position(wnd)?;
        if q.quilt_columns > 0 && q.quilt_rows > 0 {
            data.view_width = (q.quilt_width as f32 / q.quilt_columns as f32) as i32;
            data.view_height = (q.quilt_height as f32 / q.quilt_rows as f32) as i32;
        }

        Ok(data)
    }
}
