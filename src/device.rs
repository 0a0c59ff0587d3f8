//! Display backlight and power controller.
//!
//! Runs once per UI tick after the scene is updated. Brightness is computed
//! first, from the awake state of the previous tick, then the wake countdown
//! advances. Backlight writes can block on sysfs I/O, so each change is
//! handed to a detached thread; the last commanded value itself is only ever
//! touched on the tick thread.

use std::sync::Arc;
use std::thread;

use log::{debug, warn};
use onroad_common::{Backlight, WakeInputs, Wakefulness};

use crate::hardware::Hardware;
use crate::scene::SceneSnapshot;

/// Brightness and wakefulness state for the display.
pub struct Device {
    backlight: Backlight,
    wake: Wakefulness,
    hw: Arc<dyn Hardware>,
}

impl Device {
    pub fn new(hw: Arc<dyn Hardware>) -> Self {
        Self {
            backlight: Backlight::new(),
            wake: Wakefulness::new(),
            hw,
        }
    }

    /// Run one tick against the current scene. Returns whether the display
    /// is awake afterwards.
    pub fn update(&mut self, scene: &SceneSnapshot) -> bool {
        self.update_brightness(scene);
        self.update_wakefulness(scene);
        self.wake.is_awake()
    }

    #[inline]
    pub const fn is_awake(&self) -> bool {
        self.wake.is_awake()
    }

    /// Last brightness handed to the hardware, in percent.
    #[inline]
    pub const fn brightness(&self) -> Option<i32> {
        self.backlight.last()
    }

    fn update_brightness(&mut self, scene: &SceneSnapshot) {
        let Some(percent) = self
            .backlight
            .update(scene.device.light_sensor, scene.started, self.wake.is_awake())
        else {
            return;
        };

        let hw = Arc::clone(&self.hw);
        let spawned = thread::Builder::new()
            .name("backlight".into())
            .spawn(move || hw.set_brightness(percent));
        if let Err(e) = spawned {
            warn!("failed to spawn backlight thread: {e}");
        }
    }

    fn update_wakefulness(&mut self, scene: &SceneSnapshot) {
        let inputs = WakeInputs {
            started: scene.started,
            ignition: scene.ignition,
            accel: scene.device.accel_sensor,
            gyro: scene.device.gyro_sensor,
        };
        if let Some(awake) = self.wake.update(inputs) {
            self.hw.set_display_power(awake);
            debug!("setting display power {awake}");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
