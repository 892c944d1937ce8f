//! Macros for declaring native entry points.

/// Declare zero-sized [`EntryPoint`](crate::loader::EntryPoint) descriptors.
///
/// Each line names a descriptor type, the exported symbol and its function
/// pointer type. The function pointer type must match the export exactly;
/// the macro implements an unsafe trait on the caller's behalf.
///
/// # Example
///
/// ```rust
/// use lgbridge_core::entry_points;
/// use lgbridge_core::loader::EntryPoint;
///
/// entry_points! {
///     /// `bool get_max_texture_size(WINDOW_HANDLE, unsigned long*)`
///     pub GetMaxTextureSize = "get_max_texture_size":
///         unsafe extern "C" fn(std::os::raw::c_ulong, *mut std::os::raw::c_ulong) -> bool;
/// }
///
/// assert_eq!(GetMaxTextureSize::SYMBOL, "get_max_texture_size");
/// ```
#[macro_export]
macro_rules! entry_points {
    ($($(#[$meta:meta])* $vis:vis $name:ident = $symbol:literal : $fn_ty:ty;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            $vis struct $name;

            unsafe impl $crate::loader::EntryPoint for $name {
                const SYMBOL: &'static str = $symbol;
                type Fn = $fn_ty;
            }
        )*
    };
}
