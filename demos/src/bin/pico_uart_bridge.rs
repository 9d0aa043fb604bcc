//! UART variant of the Pico bridge, for hosts wired to the pins through a
//! USB-to-serial adapter instead of the Pico's own USB port.
//!
//! Bytes received on UART0 (GP1 RX, GP0 TX) at 9600 baud are written as servo
//! angles. The servo signal is on GP28 (physical pin 34), PWM slice 6 channel A.
//!
//! # Build and Flash
//!
//! ```bash
//! cd demos && cargo run --bin pico_uart_bridge --features rp2040 --target thumbv6m-none-eabi --release
//! ```

#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::{
    bind_interrupts,
    peripherals::UART0,
    pwm::{Config as PwmConfig, Pwm},
    uart::{self, BufferedInterruptHandler, BufferedUart},
};
use panic_probe as _;
use serial_servo::{BAUD_RATE, Bridge, Servo, ServoConfig};

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

const PWM_DIVIDER: u8 = 64;

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    info!("Starting serial servo bridge on UART0");

    let config = ServoConfig::hobby();

    // 125MHz / 64 / 50Hz fits the 16-bit counter
    let top = embassy_rp::clocks::clk_sys_freq() / (config.frequency_hz * PWM_DIVIDER as u32) - 1;
    let mut pwm_config = PwmConfig::default();
    pwm_config.divider = PWM_DIVIDER.into();
    pwm_config.top = top as u16;
    let pwm = Pwm::new_output_a(p.PWM_SLICE6, p.PIN_28, pwm_config);

    let servo = match Servo::new("gp28", config, pwm) {
        Ok(servo) => servo,
        Err(_) => defmt::panic!("failed to attach servo"),
    };

    let mut uart_config = uart::Config::default();
    uart_config.baudrate = BAUD_RATE;
    let mut tx_buf = [0u8; 16];
    let mut rx_buf = [0u8; 64];
    let uart = BufferedUart::new(
        p.UART0,
        Irqs,
        p.PIN_0,
        p.PIN_1,
        &mut tx_buf,
        &mut rx_buf,
        uart_config,
    );

    info!("Listening at {} baud", BAUD_RATE);
    // rx is interrupt driven, so busy polling here is fine
    Bridge::new(uart, servo).run()
}
