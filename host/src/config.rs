use clap::Parser;
use serial_servo::{BAUD_RATE, IntensityConfig};

#[derive(Debug, Clone, Parser)]
#[command(name = "serial-servo-host")]
#[command(about = "WebSocket device server driving a servo over serial")]
pub struct HostConfig {
    #[arg(long, default_value = "12345")]
    pub port: u16,

    #[arg(long, default_value = "/dev/ttyACM0", help = "Serial port of the servo firmware")]
    pub serial_port: String,

    #[arg(long, default_value_t = BAUD_RATE)]
    pub baud_rate: u32,

    #[arg(long, default_value = "180", help = "Angle sent for intensity 0")]
    pub servo_max_degrees: u8,

    #[arg(long, default_value = "1500")]
    pub cycle_max_ms: u32,

    #[arg(long, default_value = "200")]
    pub cycle_min_ms: u32,

    #[arg(long, default_value = "6", help = "Half-cycles averaged for the cycle time")]
    pub cycle_max_samples: usize,

    #[arg(long, default_value = "5000", help = "Window the amplitude is measured over")]
    pub amplitude_sample_ms: u32,

    #[arg(long, default_value = "100", help = "Silence after which the servo is released")]
    pub idle_timeout_ms: u32,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl HostConfig {
    pub fn intensity_config(&self) -> IntensityConfig {
        IntensityConfig {
            cycle_max_ms: self.cycle_max_ms,
            cycle_min_ms: self.cycle_min_ms,
            cycle_max_samples: self.cycle_max_samples,
            amplitude_sample_ms: self.amplitude_sample_ms,
            servo_max_degrees: self.servo_max_degrees,
            idle_timeout_ms: self.idle_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_estimator_defaults() {
        let config = HostConfig::parse_from(["serial-servo-host"]);
        assert_eq!(config.port, 12345);
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.serial_port, "/dev/ttyACM0");
        assert_eq!(config.intensity_config(), IntensityConfig::default());
    }

    #[test]
    fn tunables_are_forwarded() {
        let config = HostConfig::parse_from([
            "serial-servo-host",
            "--cycle-max-ms",
            "2000",
            "--servo-max-degrees",
            "170",
        ]);
        let intensity = config.intensity_config();
        assert_eq!(intensity.cycle_max_ms, 2000);
        assert_eq!(intensity.servo_max_degrees, 170);
    }
}
