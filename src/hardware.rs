//! Hardware actuation interface.

use onroad_common::Platform;

/// Display and platform control.
///
/// Implementations must be callable from any thread: brightness changes are
/// issued from a detached background thread.
pub trait Hardware: Send + Sync {
    /// Platform the process is running on.
    fn platform(&self) -> Platform;

    /// Turn the display on or off.
    fn set_display_power(&self, on: bool);

    /// Set the backlight, in percent (0-100). May block on I/O.
    fn set_brightness(&self, percent: i32);
}
