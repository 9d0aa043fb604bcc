//! Serial-to-servo bridge for ESP32-C3.
//!
//! Bytes received on UART0 (GPIO20 RX, GPIO21 TX) at 9600 baud are written as
//! servo angles. The servo signal is driven by LEDC channel 0 on GPIO2.
//!
//! # Build and Flash
//!
//! ```bash
//! cd demos && cargo run --bin esp32c3_bridge --features esp32c3 --target riscv32imc-unknown-none-elf --release
//! ```

#![no_std]
#![no_main]

use core::convert::Infallible;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};
use esp_backtrace as _;
use esp_bootloader_esp_idf::esp_app_desc;
use esp_hal::{
    Config,
    gpio::DriveMode,
    ledc::{
        LSGlobalClkSource, Ledc, LowSpeed,
        channel::{self, Channel, ChannelHW, ChannelIFace},
        timer::{self, TimerIFace, config::Duty},
    },
    time::Rate,
    uart::{self, Uart},
};
use log::info;
use serial_servo::{BAUD_RATE, Bridge, Servo, ServoConfig};

esp_app_desc!();

const DUTY: Duty = Duty::Duty14Bit;

/// LEDC channel exposed through the `embedded-hal` PWM trait.
struct LedcPwm<'a> {
    channel: Channel<'a, LowSpeed>,
    max_duty: u16,
}

impl ErrorType for LedcPwm<'_> {
    type Error = Infallible;
}

impl SetDutyCycle for LedcPwm<'_> {
    fn max_duty_cycle(&self) -> u16 {
        self.max_duty
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        // hardware method has better resolution than percentages
        self.channel.set_duty_hw(duty as u32);
        Ok(())
    }
}

#[riscv_rt::entry]
fn main() -> ! {
    let peripherals = esp_hal::init(Config::default());
    esp_println::logger::init_logger(log::LevelFilter::Info);

    info!("Starting serial servo bridge");

    let config = ServoConfig::hobby();

    // Create LEDC controller and configure timer
    let mut ledc = Ledc::new(peripherals.LEDC);
    ledc.set_global_slow_clock(LSGlobalClkSource::APBClk);
    let mut lstimer = ledc.timer::<LowSpeed>(timer::Number::Timer0);
    lstimer
        .configure(timer::config::Config {
            duty: DUTY,
            clock_source: timer::LSClockSource::APBClk,
            frequency: Rate::from_hz(config.frequency_hz),
        })
        .expect("failed to configure timer");

    let mut channel = ledc.channel(channel::Number::Channel0, peripherals.GPIO2);
    channel
        .configure(channel::config::Config {
            timer: &lstimer,
            duty_pct: 0,
            drive_mode: DriveMode::PushPull,
        })
        .expect("failed to configure channel");

    let pwm = LedcPwm {
        channel,
        max_duty: ((1u32 << DUTY as u32) - 1) as u16,
    };
    let servo = Servo::new("gpio2", config, pwm).expect("failed to attach servo");

    let uart = Uart::new(
        peripherals.UART0,
        uart::Config::default().with_baudrate(BAUD_RATE),
    )
    .expect("failed to configure uart")
    .with_rx(peripherals.GPIO20)
    .with_tx(peripherals.GPIO21);

    info!("Listening at {BAUD_RATE} baud");
    Bridge::new(uart, servo).run()
}
