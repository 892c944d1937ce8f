//! Display queries on an initialized bridge.
//!
//! Variable-length results use Bridge's two-call protocol: the first call
//! passes a null buffer and receives the element count, the second call
//! fills a buffer of that size.

use std::os::raw::{c_int, c_long, c_ulong};
use std::ptr;

use crate::entry::{
    DisplayStringFn, GetBridgeVersion, GetCalibrationForDisplay, GetDefaultQuiltSettingsForDisplay,
    GetDeviceNameForDisplay, GetDeviceSerialForDisplay, GetDeviceTypeForDisplay,
    GetDimensionsForDisplay, GetDisplays, GetViewconeForDisplay, GetWindowPositionForDisplay,
};
use crate::error::Result;
use crate::loader::{EntryPoint, LibraryLoader};
use crate::marshal::{from_wide, to_c_ulong};
use crate::types::{
    BridgeVersion, Calibration, CalibrationSubpixelCell, DefaultQuiltSettings, Dimensions,
    DisplayInfo, WindowPosition,
};
use crate::Bridge;

const DISPLAY_INDEX: &str = "display index";

fn buffer_len(count: c_int) -> usize {
    usize::try_from(count).unwrap_or(0)
}

impl<L: LibraryLoader> Bridge<L> {
    /// Version of the loaded Bridge library.
    pub fn bridge_version(&self) -> Result<BridgeVersion> {
        let (mut major, mut minor, mut build): (c_ulong, c_ulong, c_ulong) = (0, 0, 0);
        let mut count: c_int = 0;

        // SAFETY: all out-pointers are valid; a null postfix asks for its length.
        self.call_checked::<GetBridgeVersion>(|f| unsafe {
            f(&mut major, &mut minor, &mut build, &mut count, ptr::null_mut())
        })?;

        let mut postfix = String::new();
        if count > 0 {
            let mut buffer: Vec<libc::wchar_t> = vec![0; buffer_len(count)];
            // SAFETY: buffer holds `count` wide characters.
            self.call_checked::<GetBridgeVersion>(|f| unsafe {
                f(&mut major, &mut minor, &mut build, &mut count, buffer.as_mut_ptr())
            })?;
            postfix = from_wide(&buffer);
        }

        Ok(BridgeVersion {
            major: major.into(),
            minor: minor.into(),
            build: build.into(),
            postfix,
        })
    }

    /// Indices of all displays Bridge knows about.
    pub fn displays(&self) -> Result<Vec<u64>> {
        let mut count: c_int = 0;
        // SAFETY: a null index buffer asks for the count only.
        self.call_checked::<GetDisplays>(|f| unsafe { f(&mut count, ptr::null_mut()) })?;
        if count <= 0 {
            return Ok(Vec::new());
        }

        let mut indices: Vec<c_ulong> = vec![0; buffer_len(count)];
        // SAFETY: indices holds `count` elements.
        self.call_checked::<GetDisplays>(|f| unsafe { f(&mut count, indices.as_mut_ptr()) })?;
        indices.truncate(buffer_len(count));

        Ok(indices.into_iter().map(u64::from).collect())
    }

    fn display_string<E>(&self, display: u64) -> Result<String>
    where
        E: EntryPoint<Fn = DisplayStringFn>,
    {
        let display = to_c_ulong(display, DISPLAY_INDEX)?;
        let mut count: c_int = 0;
        // SAFETY: a null buffer asks for the length only.
        self.call_checked::<E>(|f| unsafe { f(display, &mut count, ptr::null_mut()) })?;
        if count <= 0 {
            return Ok(String::new());
        }

        let mut buffer: Vec<libc::wchar_t> = vec![0; buffer_len(count)];
        // SAFETY: buffer holds `count` wide characters.
        self.call_checked::<E>(|f| unsafe { f(display, &mut count, buffer.as_mut_ptr()) })?;
        Ok(from_wide(&buffer))
    }

    pub fn device_name_for_display(&self, display: u64) -> Result<String> {
        self.display_string::<GetDeviceNameForDisplay>(display)
    }

    pub fn device_serial_for_display(&self, display: u64) -> Result<String> {
        self.display_string::<GetDeviceSerialForDisplay>(display)
    }

    pub fn dimensions_for_display(&self, display: u64) -> Result<Dimensions> {
        let (mut width, mut height): (c_ulong, c_ulong) = (0, 0);
        let display = to_c_ulong(display, DISPLAY_INDEX)?;
        // SAFETY: valid out-pointers.
        self.call_checked::<GetDimensionsForDisplay>(|f| unsafe {
            f(display, &mut width, &mut height)
        })?;
        Ok(Dimensions {
            width: width.into(),
            height: height.into(),
        })
    }

    pub fn device_type_for_display(&self, display: u64) -> Result<i32> {
        let mut hw_enum: c_int = 0;
        let display = to_c_ulong(display, DISPLAY_INDEX)?;
        // SAFETY: valid out-pointer.
        self.call_checked::<GetDeviceTypeForDisplay>(|f| unsafe {
            f(display, &mut hw_enum)
        })?;
        Ok(hw_enum)
    }

    pub fn viewcone_for_display(&self, display: u64) -> Result<f32> {
        let mut viewcone = 0.0f32;
        let display = to_c_ulong(display, DISPLAY_INDEX)?;
        // SAFETY: valid out-pointer.
        self.call_checked::<GetViewconeForDisplay>(|f| unsafe {
            f(display, &mut viewcone)
        })?;
        Ok(viewcone)
    }

    pub fn window_position_for_display(&self, display: u64) -> Result<WindowPosition> {
        let (mut x, mut y): (c_long, c_long) = (0, 0);
        let display = to_c_ulong(display, DISPLAY_INDEX)?;
        // SAFETY: valid out-pointers.
        self.call_checked::<GetWindowPositionForDisplay>(|f| unsafe {
            f(display, &mut x, &mut y)
        })?;
        Ok(WindowPosition {
            x: x.into(),
            y: y.into(),
        })
    }

    pub fn default_quilt_settings_for_display(&self, display: u64) -> Result<DefaultQuiltSettings> {
        let mut q = DefaultQuiltSettings::default();
        let display = to_c_ulong(display, DISPLAY_INDEX)?;
        // SAFETY: valid out-pointers into `q`.
        self.call_checked::<GetDefaultQuiltSettingsForDisplay>(|f| unsafe {
            f(
                display,
                &mut q.aspect,
                &mut q.quilt_width,
                &mut q.quilt_height,
                &mut q.quilt_columns,
                &mut q.quilt_rows,
            )
        })?;
        Ok(q)
    }

    pub fn calibration_for_display(&self, display: u64) -> Result<Calibration> {
        let display = to_c_ulong(display, DISPLAY_INDEX)?;
        let mut cal = Calibration::default();
        let mut cell_count: c_int = 0;

        let query = |cal: &mut Calibration, count: &mut c_int, cells: *mut CalibrationSubpixelCell| {
            // SAFETY: out-pointers reference `cal` and `count`; `cells` is
            // either null or holds `count` cells.
            self.call_checked::<GetCalibrationForDisplay>(|f| unsafe {
                f(
                    display,
                    &mut cal.center,
                    &mut cal.pitch,
                    &mut cal.slope,
                    &mut cal.width,
                    &mut cal.height,
                    &mut cal.dpi,
                    &mut cal.flip_x,
                    &mut cal.inv_view,
                    &mut cal.viewcone,
                    &mut cal.fringe,
                    &mut cal.cell_pattern_mode,
                    count,
                    cells,
                )
            })
        };

        query(&mut cal, &mut cell_count, ptr::null_mut())?;
        if cell_count > 0 {
            let mut cells = vec![CalibrationSubpixelCell::default(); buffer_len(cell_count)];
            query(&mut cal, &mut cell_count, cells.as_mut_ptr())?;
            cells.truncate(buffer_len(cell_count));
            cal.cells = cells;
        }

        Ok(cal)
    }

    /// Everything Bridge reports about one display.
    pub fn display_info(&self, display: u64) -> Result<DisplayInfo> {
        Ok(DisplayInfo {
            display_id: display,
            serial: self.device_serial_for_display(display)?,
            name: self.device_name_for_display(display)?,
            dimensions: self.dimensions_for_display(display)?,
            hw_enum: self.device_type_for_display(display)?,
            calibration: self.calibration_for_display(display)?,
            viewcone: self.viewcone_for_display(display)?,
            default_quilt_settings: self.default_quilt_settings_for_display(display)?,
            window_position: self.window_position_for_display(display)?,
        })
    }

    /// [`Bridge::display_info`] for every connected display.
    pub fn display_info_list(&self) -> Result<Vec<DisplayInfo>> {
        self.displays()?
            .into_iter()
            .map(|display| self.display_info(display))
            .collect()
    }

    /// Whether no connected display reports `serial`.
    pub fn is_display_disconnected(&self, serial: &str) -> Result<bool> {
        for display in self.displays()? {
            if self.device_serial_for_display(display)? == serial {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
