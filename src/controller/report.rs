//! Button-down detection from raw input reports
//!
//! Joy-Con 2 controllers stream input reports continuously (motion data keeps
//! them coming even when nothing is touched), so a report arriving is not
//! activity by itself. Only a button that was up in the previous report and is
//! down now counts.

use crate::controller::constants::{REPORT_BUTTONS_END, REPORT_BUTTONS_START};

/// Minimum report length that still carries the button bitfield
const MIN_REPORT_LEN: usize = REPORT_BUTTONS_END;

/// Tracks the button bitfield of one controller across reports
#[derive(Debug, Clone, Default)]
pub struct ButtonTracker {
    previous: u32,
}

impl ButtonTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one input report.
    ///
    /// Returns true if any button is pressed now that was not pressed in the
    /// previous report. Reports too short to carry buttons are ignored.
    pub fn update(&mut self, report: &[u8]) -> bool {
        if report.len() < MIN_REPORT_LEN {
            return false;
        }

        let current = report[REPORT_BUTTONS_START..REPORT_BUTTONS_END]
            .iter()
            .fold(0u32, |mask, byte| (mask << 8) | u32::from(*byte));

        let newly_pressed = current & !self.previous;
        self.previous = current;

        newly_pressed != 0
    }

    /// Current button bitfield
    pub fn buttons(&self) -> u32 {
        self.previous
    }
}
