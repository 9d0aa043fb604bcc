//! Serial-to-servo bridge for the Raspberry Pi Pico (RP2040).
//!
//! The Pico enumerates as a USB CDC-ACM serial port. Every byte the host
//! writes to it is written as a servo angle. The servo signal is on GP28
//! (physical pin 34), PWM slice 6 channel A.
//!
//! The line coding the host picks (9600 baud by default) does not matter over
//! USB. See `pico_uart_bridge` for the variant reading UART0 pins.
//!
//! # Build and Flash
//!
//! ```bash
//! cd demos && cargo run --bin pico_bridge --features rp2040 --target thumbv6m-none-eabi --release
//! ```

#![no_std]
#![no_main]

use core::convert::Infallible;

use defmt::{info, unwrap, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::yield_now;
use embassy_rp::{
    bind_interrupts,
    peripherals::USB,
    pwm::{Config as PwmConfig, Pwm},
    usb::{self, Driver},
};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, pipe::Pipe};
use embassy_usb::{
    UsbDevice,
    class::cdc_acm::{CdcAcmClass, State},
};
use embedded_io::{ErrorType, Read, ReadReady};
use panic_probe as _;
use serial_servo::{Bridge, Servo, ServoConfig};
use static_cell::StaticCell;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => usb::InterruptHandler<USB>;
});

const PWM_DIVIDER: u8 = 64;
const MAX_PACKET_SIZE: u16 = 64;
const RX_CAPACITY: usize = 64;

/// Bytes received from the host, not yet written to the servo.
static RX: Pipe<CriticalSectionRawMutex, RX_CAPACITY> = Pipe::new();

/// Receive side of the CDC-ACM port as seen by the bridge.
struct UsbRx(&'static Pipe<CriticalSectionRawMutex, RX_CAPACITY>);

impl ErrorType for UsbRx {
    type Error = Infallible;
}

impl ReadReady for UsbRx {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.is_empty())
    }
}

impl Read for UsbRx {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(self.0.try_read(buf).unwrap_or(0))
    }
}

#[embassy_executor::task]
async fn usb_task(mut usb: UsbDevice<'static, Driver<'static, USB>>) -> ! {
    usb.run().await
}

#[embassy_executor::task]
async fn cdc_task(mut class: CdcAcmClass<'static, Driver<'static, USB>>) -> ! {
    let mut packet = [0u8; MAX_PACKET_SIZE as usize];
    loop {
        class.wait_connection().await;
        info!("Host connected");
        while let Ok(n) = class.read_packet(&mut packet).await {
            RX.write_all(&packet[..n]).await;
        }
        info!("Host disconnected");
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    info!("Starting serial servo bridge");

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

    let driver = Driver::new(p.USB, Irqs);
    let mut usb_config = embassy_usb::Config::new(0xc0de, 0xcafe);
    usb_config.manufacturer = Some("serial-servo");
    usb_config.product = Some("Serial servo bridge");
    usb_config.serial_number = Some("00000001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();
    static CDC_STATE: StaticCell<State> = StaticCell::new();

    let mut builder = embassy_usb::Builder::new(
        driver,
        usb_config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        &mut [],
        CONTROL_BUF.init([0; 64]),
    );
    let class = CdcAcmClass::new(&mut builder, CDC_STATE.init(State::new()), MAX_PACKET_SIZE);
    let usb = builder.build();

    unwrap!(spawner.spawn(usb_task(usb)));
    unwrap!(spawner.spawn(cdc_task(class)));

    info!("Listening on USB CDC-ACM");
    let mut bridge = Bridge::new(UsbRx(&RX), servo);
    loop {
        if let Err(err) = bridge.poll() {
            warn!("{}", defmt::Debug2Format(&err));
        }
        // lets the USB tasks run between polls
        yield_now().await;
    }
}
