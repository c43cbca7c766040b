//! Button and charger-detect inputs.
//!
//! Both lines are active-low: a closed switch, or a charger pulling its status pin down, reads
//! `LOW`. The monitor inverts them so that `true` means pressed / connected. There is no
//! debouncing. The button is held for as long as the fob is expected to stay awake, and a
//! bounce only affects which LED pattern is shown.

use embedded_hal::digital::InputPin;

use crate::error::Error;

/// One sample of both inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Inputs {
    /// The button is held.
    pub button_pressed: bool,
    /// A charger is connected.
    pub charger_connected: bool,
}

impl Inputs {
    /// Whether either input keeps the fob awake.
    pub const fn any_active(&self) -> bool {
        self.button_pressed || self.charger_connected
    }
}

/// Owns the two input pins.
#[derive(Debug)]
pub struct InputMonitor<BTN, CHG>
where
    BTN: InputPin,
    CHG: InputPin,
{
    /// Button pin
    pub button: BTN,
    /// Charger-detect pin
    pub charger: CHG,
}

impl<BTN, CHG> InputMonitor<BTN, CHG>
where
    BTN: InputPin,
    CHG: InputPin,
{
    /// Wraps the two pins.
    pub fn new(button: BTN, charger: CHG) -> Self {
        Self { button, charger }
    }

    /// Samples both inputs, charger first.
    pub fn poll(&mut self) -> Result<Inputs, Error> {
        let charger_connected = self.charger.is_low().map_err(Error::pin)?;
        let button_pressed = self.button.is_low().map_err(Error::pin)?;
        Ok(Inputs {
            button_pressed,
            charger_connected,
        })
    }
}
