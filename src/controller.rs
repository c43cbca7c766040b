//! Activity and sleep controller.
//!
//! [`Keyfob`] owns every peripheral and runs the firmware's super-loop. Each [`tick`] does the
//! following:
//!
//! 1. samples the button and charger inputs
//! 2. while a charger is connected, grants a transmit permit at most once per
//!    [`charger_tx_interval_ms`](crate::config::Config::charger_tx_interval_ms)
//! 3. refreshes the battery indicator if its period has elapsed
//! 4. spends a held permit on one burst of [`PACKET_REPEATS`](crate::consts::PACKET_REPEATS)
//!    packets
//! 5. keeps the fob awake while either input is active
//! 6. after [`awake_window_ms`](crate::config::Config::awake_window_ms) of inactivity, turns all
//!    outputs off, arms the wake interrupts and powers down
//!
//! Returning from power-down re-enables the converter, restarts the awake window and the
//! charger interval, and grants a permit, so the press that woke the fob is also transmitted
//! on the next tick.
//!
//! ## Permit
//!
//! The permit is a single flag. It is set on wake and by the charger interval, and cleared by
//! exactly one burst. A button held down therefore transmits once per wake, not continuously.
//!
//! ## Faults
//!
//! Nothing in the loop is fatal. Pin, converter and payload errors are logged and the tick
//! carries on; a zero bandgap reading leaves the LEDs as they were until the next refresh.
//!
//! [`tick`]: Keyfob::tick

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::Config;
use crate::error::Error;
use crate::indicator::{BatteryIndicator, LedBank};
use crate::input::{InputMonitor, Inputs};
use crate::payload::Payload;
use crate::power::DeepSleep;
use crate::rng::ParkMiller;
use crate::timer::{Clock, Stopwatch};
use crate::transmitter::Transmitter;
use crate::vcc::{BandgapAdc, sample_vcc};

/// Lifecycle state of the fob.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum PowerState {
    /// Awake, neither input active; counting down to sleep.
    #[default]
    AwakeIdle,
    /// Awake with the button held and/or the charger connected.
    AwakeActive,
    /// Powered down until a wake interrupt.
    Sleeping,
}

/// The keyfob firmware.
///
/// ## Type Parameters
///
/// - `BTN`, `CHG`: button and charger-detect inputs (active low)
/// - `R`, `Y`, `G`: red, yellow and green LED outputs
/// - `TX`: RF transmitter data output
/// - `A`: converter, see [`BandgapAdc`]
/// - `D`: delay used for waveform timing and converter settling
/// - `C`: millisecond clock
/// - `S`: power management, see [`DeepSleep`]
#[derive(Debug)]
pub struct Keyfob<BTN, CHG, R, Y, G, TX, A, D, C, S>
where
    BTN: InputPin,
    CHG: InputPin,
    R: OutputPin,
    Y: OutputPin,
    G: OutputPin,
    TX: OutputPin,
    A: BandgapAdc,
    D: DelayNs,
    C: Clock,
    S: DeepSleep,
{
    config: Config,
    /// Button and charger inputs.
    pub inputs: InputMonitor<BTN, CHG>,
    /// Indicator LEDs.
    pub leds: LedBank<R, Y, G>,
    /// RF transmitter.
    pub radio: Transmitter<TX>,
    /// Converter.
    pub adc: A,
    /// Delay provider.
    pub delay: D,
    /// Millisecond clock.
    pub clock: C,
    /// Power management.
    pub sleep: S,
    indicator: BatteryIndicator,
    rng: ParkMiller,
    state: PowerState,
    tx_allowed: bool,
    last_inputs: Inputs,
    wake_timer: Stopwatch,
    transmit_timer: Stopwatch,
    last_vcc_mv: Option<u32>,
    /// Number of completed sleep/wake cycles.
    pub sleep_cycles: u32,
    /// Number of returns from power-down that were not a wake.
    pub spurious_wakes: u32,
}

impl<BTN, CHG, R, Y, G, TX, A, D, C, S> Keyfob<BTN, CHG, R, Y, G, TX, A, D, C, S>
where
    BTN: InputPin,
    CHG: InputPin,
    R: OutputPin,
    Y: OutputPin,
    G: OutputPin,
    TX: OutputPin,
    A: BandgapAdc,
    D: DelayNs,
    C: Clock,
    S: DeepSleep,
{
    /// Assembles the firmware from its peripherals.
    ///
    /// The TX pin is driven low. All timers start at the current clock reading and no permit is
    /// held: the first transmission follows the first wake or charger interval.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if `config` fails [`Config::validate`].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        button: BTN,
        charger: CHG,
        red: R,
        yellow: Y,
        green: G,
        tx: TX,
        adc: A,
        delay: D,
        clock: C,
        sleep: S,
    ) -> Result<Self, Error> {
        config.validate()?;
        let now = clock.millis();
        Ok(Self {
            config,
            inputs: InputMonitor::new(button, charger),
            leds: LedBank::new(red, yellow, green),
            radio: Transmitter::new(tx),
            adc,
            delay,
            clock,
            sleep,
            indicator: BatteryIndicator::new(
                config.thresholds,
                config.charging_blink_ms,
                config.low_blink_ms,
            ),
            rng: ParkMiller::new(config.random_seed),
            state: PowerState::AwakeIdle,
            tx_allowed: false,
            last_inputs: Inputs::default(),
            wake_timer: Stopwatch::started_at(now),
            transmit_timer: Stopwatch::started_at(now),
            last_vcc_mv: None,
            sleep_cycles: 0,
            spurious_wakes: 0,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Whether a transmit permit is held.
    pub fn tx_allowed(&self) -> bool {
        self.tx_allowed
    }

    /// Inputs as sampled on the last tick.
    pub fn last_inputs(&self) -> Inputs {
        self.last_inputs
    }

    /// Supply voltage from the last usable sample.
    pub fn last_vcc_mv(&self) -> Option<u32> {
        self.last_vcc_mv
    }

    /// The battery indicator state machine.
    pub fn indicator(&self) -> &BatteryIndicator {
        &self.indicator
    }

    /// Number of bursts sent to completion.
    pub fn bursts_sent(&self) -> u16 {
        self.radio.bursts_sent
    }

    /// Runs the super-loop forever.
    pub fn run(&mut self) -> ! {
        loop {
            let _ = self.tick();
        }
    }

    /// Runs one iteration of the super-loop and returns the resulting state.
    ///
    /// If the fob goes to sleep, this call blocks inside [`DeepSleep::power_down`] and returns
    /// after the wake with [`PowerState::AwakeIdle`].
    pub fn tick(&mut self) -> PowerState {
        let inputs = match self.inputs.poll() {
            Ok(inputs) => inputs,
            Err(e) => {
                warn!("input poll failed: {:?}", e);
                self.last_inputs
            }
        };
        self.last_inputs = inputs;

        let now = self.clock.millis();
        if inputs.charger_connected
            && self
                .transmit_timer
                .has_elapsed(now, self.config.charger_tx_interval_ms)
        {
            debug!("charger interval: permit granted");
            self.grant_permit();
            self.transmit_timer.reset(now);
        }

        self.refresh_indicator(inputs.charger_connected);

        if self.tx_allowed && (inputs.button_pressed || !self.config.transmit_requires_button) {
            self.transmit();
        }

        let now = self.clock.millis();
        if inputs.any_active() {
            self.wake_timer.reset(now);
            self.state = PowerState::AwakeActive;
        } else {
            self.state = PowerState::AwakeIdle;
        }

        if self.wake_timer.has_elapsed(now, self.config.awake_window_ms) {
            self.sleep_until_wake();
        }
        self.state
    }

    /// Only a wake and the charger interval grant a permit.
    fn grant_permit(&mut self) {
        self.tx_allowed = true;
    }

    /// Spends the permit on one burst. The permit is cleared whatever the outcome.
    fn transmit(&mut self) {
        let rolling = self.rng.rolling();
        match Payload::new(self.config.button.code(), self.config.device_id, rolling) {
            Ok(payload) => {
                info!("sending burst, rolling {}", rolling);
                match self.radio.send_burst(&mut self.delay, &payload) {
                    Ok(()) => debug!("burst sent"),
                    Err(e) => warn!("burst aborted: {:?}", e),
                }
            }
            Err(e) => warn!("payload rejected: {:?}", e),
        }
        self.tx_allowed = false;
    }

    fn refresh_indicator(&mut self, charging: bool) {
        if !self.indicator.is_due(self.clock.millis()) {
            return;
        }
        let sample = sample_vcc(&mut self.adc, &mut self.delay, self.config.vref_mv);
        let now = self.clock.millis();
        match sample {
            Ok(vcc_mv) => {
                self.last_vcc_mv = Some(vcc_mv);
                let update = self.indicator.update(now, vcc_mv, charging);
                trace!("vcc {} mV", vcc_mv);
                if let Err(e) = self.leds.apply(update) {
                    warn!("led update failed: {:?}", e);
                }
            }
            Err(e) => {
                warn!("vcc sample skipped: {:?}", e);
                self.indicator.skip(now);
            }
        }
    }

    fn sleep_until_wake(&mut self) {
        self.state = PowerState::Sleeping;
        info!("idle, powering down");

        if let Err(e) = self.leds.all_off() {
            warn!("led off failed: {:?}", e);
        }
        if let Err(e) = self.radio.force_low() {
            warn!("tx off failed: {:?}", e);
        }

        self.sleep.arm_wake_sources();
        loop {
            self.sleep.power_down();
            if self.sleep.take_wake_event() {
                break;
            }
            self.spurious_wakes = self.spurious_wakes.wrapping_add(1);
            trace!("spurious wake, sleeping again");
        }
        self.on_wake();
        self.sleep.disarm_wake_sources();
    }

    fn on_wake(&mut self) {
        if self.adc.enable().is_err() {
            warn!("adc enable failed");
        }
        let now = self.clock.millis();
        self.wake_timer.reset(now);
        self.transmit_timer.reset(now);
        self.grant_permit();
        // The LEDs were blanked for sleep; show the level again on the next tick.
        self.indicator.restart();
        self.sleep_cycles = self.sleep_cycles.wrapping_add(1);
        self.state = PowerState::AwakeIdle;
        info!("woke up, permit granted");
    }
}
