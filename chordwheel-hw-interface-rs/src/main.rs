//! chordwheel-hw-interface
//!
//! Firmware for the Chordwheel controller on the Raspberry Pi Pico 2.
//! Wires the encoder unit driver, the interaction engine and a serial-MIDI
//! output into one fixed-period loop:
//!
//! 1. A `Ticker` fires every `tick_period_ms` (20 ms).
//! 2. `Controller::poll` samples the encoder unit (debounce burst, retries,
//!    bus recovery) and runs one engine tick; note messages are queued in
//!    the `MidiOutbox`.
//! 3. The outbox is flushed to the UART at 31250 baud.
//! 4. If anything visible changed, the latch LEDs are updated and the
//!    snapshot is handed to the status task, which logs it over RTT.
//!
//! An unrecoverable bus fault silences every note, flushes the outbox and
//! resets the MCU.

#![no_std]
#![no_main]

mod midi_out;
mod surface;

use chordwheel::{Controller, EngineConfig, OperatingMode, Snapshot};
use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::block::ImageDef;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_rp::uart::{self, UartTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Delay, Duration, Instant, Ticker};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use encoder_unit_driver::{EightEncoderUnit, DEFAULT_ADDRESS};
use midi_out::{MidiOutbox, MidiUart, MIDI_BAUD};
use surface::UnitSurface;

// ---------------------------------------------------------------------------
// Boot block and interrupt binding
// ---------------------------------------------------------------------------

/// Tell the RP2350 Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = embassy_rp::block::ImageDef::secure_exe();

// Wire the I2C0 peripheral interrupt to Embassy's async handler.
bind_interrupts!(struct Irqs {
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
});

// ---------------------------------------------------------------------------
// Static storage
// ---------------------------------------------------------------------------

/// The engine lives for the whole run; kept out of the task arena.
static CONTROLLER: StaticCell<Controller> = StaticCell::new();

/// Latest display snapshot, written by the control task and consumed by
/// the status task. Older snapshots are overwritten.
static STATUS: Signal<CriticalSectionRawMutex, Snapshot> = Signal::new();

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Fixed-period control loop.
///
/// Never returns: a bus fault ends in an MCU reset.
#[embassy_executor::task]
async fn control_task(
    controller: &'static mut Controller,
    mut surface: UnitSurface,
    mut uart: MidiUart,
) {
    info!("Control task started");

    let period = Duration::from_millis(controller.config().tick_period_ms);
    let mut ticker = Ticker::every(period);
    let mut delay = Delay;
    let mut outbox = MidiOutbox::new();

    loop {
        ticker.next().await;
        let now_ms = Instant::now().as_millis();

        let result = controller.poll(&mut surface, &mut delay, now_ms, &mut outbox).await;
        outbox.flush(&mut uart).await;

        match result {
            Ok(summary) => {
                if summary.panicked {
                    info!("All notes off");
                }
            }
            Err(fault) => {
                error!("{}; restarting", fault);
                // Let the last bytes leave the UART before the reset.
                embassy_time::Timer::after_millis(10).await;
                cortex_m::peripheral::SCB::sys_reset();
            }
        }

        if let Some(snapshot) = controller.take_display_changes() {
            surface
                .show_latches(&snapshot.buttons, snapshot.mode == OperatingMode::Chord)
                .await;
            STATUS.signal(snapshot);
        }
    }
}

/// Logs every display snapshot. Stands in for a screen.
#[embassy_executor::task]
async fn status_task() {
    loop {
        let snapshot = STATUS.wait().await;
        let scale = &snapshot.scale;
        let (degree, chord) = snapshot.chord_label();
        if snapshot.full_redraw {
            info!("── {} / {} ──", snapshot.mode.name(), snapshot.sub_mode);
        }
        info!(
            "root={} scale={} oct={} focus={} chord={}{} vel={} cvel={}",
            chordwheel::theory::NOTE_NAMES[scale.root() as usize],
            chordwheel::theory::scales::scale_name(scale.scale()),
            scale.octave(),
            snapshot.focus.name(),
            degree,
            chord,
            snapshot.velocities,
            snapshot.chord_velocity,
        );
        for control in snapshot.latched() {
            debug!("control {} latched", control);
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("chordwheel-hw-interface starting");

    // —— Pin assignments ————————————————————————————————————————————————————
    // I2C_SDA  → GP20  (p.PIN_20)
    // I2C_SCL  → GP21  (p.PIN_21)
    // MIDI_TX  → GP0   (p.PIN_0)   UART0, 31250 baud
    // PANIC    → GP15  (p.PIN_15)  active-low, pull-up enabled
    // ———————————————————————————————————————————————————————————————————————

    // I2C0, the encoder unit is the only device on the bus.
    let i2c = I2c::new_async(
        p.I2C0,
        p.PIN_21, // SCL
        p.PIN_20, // SDA
        Irqs,
        i2c::Config::default(),
    );
    let mut unit = EightEncoderUnit::new(i2c, DEFAULT_ADDRESS);

    match unit.firmware_version().await {
        Ok(version) => info!("Encoder unit firmware {}", version),
        Err(e) => warn!("Encoder unit not answering: {}", e),
    }

    // Start from zeroed counters so the engine's baseline matches the
    // hardware. On failure the first ticks absorb the offset as one step.
    if let Err(e) = unit.reset_all_positions().await {
        warn!("Could not reset encoder counters: {}", e);
    }

    let panic_pin = Input::new(p.PIN_15, Pull::Up);
    let surface = UnitSurface::new(unit, panic_pin);

    let mut uart_config = uart::Config::default();
    uart_config.baudrate = MIDI_BAUD;
    let uart = UartTx::new(p.UART0, p.PIN_0, p.DMA_CH0, uart_config);

    let config = EngineConfig::default();
    info!("Engine config: {}", config);
    let controller = CONTROLLER.init(Controller::new(config));

    // —— Spawn tasks ————————————————————————————————————————————————————————

    spawner.spawn(status_task()).unwrap();
    spawner.spawn(control_task(controller, surface, uart)).unwrap();

    info!("All tasks spawned");
}
