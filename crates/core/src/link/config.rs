//! Serial link configuration
//!
//! Converts our configuration types into the serialport crate's types.
//! Nothing is default-filled: a value the driver cannot accept is an error.

use serde::{Deserialize, Serialize};
use serialport::{DataBits, Parity as SpParity, StopBits};
use std::fmt;
use std::str::FromStr;

use crate::{CoreError, Result};

/// Baud rates offered by the configuration wizard
pub const BAUD_RATES: [u32; 8] = [9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600];

/// Parity setting for serial port configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
    Mark,
    Space,
}

impl Parity {
    /// All parity settings, in wizard order
    pub const ALL: [Parity; 5] = [
        Parity::None,
        Parity::Odd,
        Parity::Even,
        Parity::Mark,
        Parity::Space,
    ];

    /// Settings the serial driver can open, in wizard order
    pub const SUPPORTED: [Parity; 3] = [Parity::None, Parity::Odd, Parity::Even];

    /// Whether the serial driver can open a port with this parity
    pub fn is_supported(&self) -> bool {
        Self::SUPPORTED.contains(self)
    }

    /// Single-letter code used in "8N1" style summaries
    pub fn code(&self) -> char {
        match self {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
            Parity::Mark => 'M',
            Parity::Space => 'S',
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Parity::None => "None",
            Parity::Odd => "Odd",
            Parity::Even => "Even",
            Parity::Mark => "Mark",
            Parity::Space => "Space",
        };
        f.write_str(name)
    }
}

impl FromStr for Parity {
    type Err = CoreError;

    /// Accepts the full name or the single-letter code, case-insensitive
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "n" | "none" => Ok(Parity::None),
            "o" | "odd" => Ok(Parity::Odd),
            "e" | "even" => Ok(Parity::Even),
            "m" | "mark" => Ok(Parity::Mark),
            "s" | "space" => Ok(Parity::Space),
            other => Err(CoreError::InvalidConfig(format!("unknown parity '{}'", other))),
        }
    }
}

/// Fully-populated serial link configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Port identifier (e.g. `/dev/ttyUSB0`, `COM3`)
    pub port: String,
    pub baud_rate: u32,
    /// 5 to 8
    pub data_bits: u8,
    /// 1 or 2
    pub stop_bits: u8,
    pub parity: Parity,
}

impl LinkConfig {
    /// Create a configuration from explicit values
    pub fn new(
        port: impl Into<String>,
        baud_rate: u32,
        data_bits: u8,
        stop_bits: u8,
        parity: Parity,
    ) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            data_bits,
            stop_bits,
            parity,
        }
    }

    /// Check every field against what the driver accepts
    pub fn validate(&self) -> Result<()> {
        if self.port.trim().is_empty() {
            return Err(CoreError::InvalidConfig("port name is empty".into()));
        }
        if self.baud_rate == 0 {
            return Err(CoreError::InvalidConfig("baud rate must be positive".into()));
        }
        to_serialport_data_bits(self.data_bits)?;
        to_serialport_stop_bits(self.stop_bits)?;
        Ok(())
    }

    /// Short form like `/dev/ttyUSB0 @ 115200 8N1`
    pub fn summary(&self) -> String {
        format!(
            "{} @ {} {}{}{}",
            self.port,
            self.baud_rate,
            self.data_bits,
            self.parity.code(),
            self.stop_bits
        )
    }
}

/// Convert our Parity enum to serialport crate's Parity type
///
/// The driver only knows None/Odd/Even.
pub fn to_serialport_parity(p: Parity) -> Result<SpParity> {
    match p {
        Parity::None => Ok(SpParity::None),
        Parity::Odd => Ok(SpParity::Odd),
        Parity::Even => Ok(SpParity::Even),
        Parity::Mark | Parity::Space => Err(CoreError::UnsupportedParity(p)),
    }
}

/// Convert data bits count to serialport crate's DataBits type
pub fn to_serialport_data_bits(bits: u8) -> Result<DataBits> {
    match bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        other => Err(CoreError::InvalidConfig(format!(
            "data bits must be 5-8, got {}",
            other
        ))),
    }
}

/// Convert stop bits count to serialport crate's StopBits type
pub fn to_serialport_stop_bits(bits: u8) -> Result<StopBits> {
    match bits {
        1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        other => Err(CoreError::InvalidConfig(format!(
            "stop bits must be 1 or 2, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LinkConfig {
        LinkConfig::new("/dev/ttyUSB0", 115200, 8, 1, Parity::None)
    }

    #[test]
    fn test_parity_default() {
        assert_eq!(Parity::default(), Parity::None);
    }

    #[test]
    fn test_parity_from_str() {
        assert_eq!("N".parse::<Parity>().unwrap(), Parity::None);
        assert_eq!("odd".parse::<Parity>().unwrap(), Parity::Odd);
        assert_eq!(" Even ".parse::<Parity>().unwrap(), Parity::Even);
        assert_eq!("m".parse::<Parity>().unwrap(), Parity::Mark);
        assert_eq!("SPACE".parse::<Parity>().unwrap(), Parity::Space);
        assert!("x".parse::<Parity>().is_err());
    }

    #[test]
    fn test_to_serialport_parity() {
        assert!(matches!(to_serialport_parity(Parity::None), Ok(SpParity::None)));
        assert!(matches!(to_serialport_parity(Parity::Odd), Ok(SpParity::Odd)));
        assert!(matches!(to_serialport_parity(Parity::Even), Ok(SpParity::Even)));
        assert!(matches!(
            to_serialport_parity(Parity::Mark),
            Err(CoreError::UnsupportedParity(Parity::Mark))
        ));
        assert!(matches!(
            to_serialport_parity(Parity::Space),
            Err(CoreError::UnsupportedParity(Parity::Space))
        ));
    }

    #[test]
    fn test_to_serialport_data_bits() {
        assert!(matches!(to_serialport_data_bits(5), Ok(DataBits::Five)));
        assert!(matches!(to_serialport_data_bits(6), Ok(DataBits::Six)));
        assert!(matches!(to_serialport_data_bits(7), Ok(DataBits::Seven)));
        assert!(matches!(to_serialport_data_bits(8), Ok(DataBits::Eight)));
        assert!(to_serialport_data_bits(9).is_err());
    }

    #[test]
    fn test_to_serialport_stop_bits() {
        assert!(matches!(to_serialport_stop_bits(1), Ok(StopBits::One)));
        assert!(matches!(to_serialport_stop_bits(2), Ok(StopBits::Two)));
        assert!(to_serialport_stop_bits(0).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(config().validate().is_ok());

        let mut bad = config();
        bad.baud_rate = 0;
        assert!(matches!(bad.validate(), Err(CoreError::InvalidConfig(_))));

        let mut bad = config();
        bad.port = "  ".into();
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.data_bits = 4;
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.stop_bits = 3;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_summary() {
        let cfg = LinkConfig::new("COM3", 9600, 7, 2, Parity::Even);
        assert_eq!(cfg.summary(), "COM3 @ 9600 7E2");
    }

    #[test]
    fn test_config_serialization() {
        let json = serde_json::to_string(&config()).unwrap();
        assert!(json.contains("\"parity\":\"none\""));
        let back: LinkConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config());
    }

    #[test]
    fn test_supported_parity_matches_driver() {
        for parity in Parity::ALL {
            assert_eq!(parity.is_supported(), to_serialport_parity(parity).is_ok());
        }
    }
}
