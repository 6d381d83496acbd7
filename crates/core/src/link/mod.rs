//! Serial link abstraction

mod config;
mod handle;
mod mock;

pub use config::{
    to_serialport_data_bits, to_serialport_parity, to_serialport_stop_bits, LinkConfig, Parity,
    BAUD_RATES,
};
pub use handle::{Link, LinkHandle, LinkReadHalf, READ_POLL_TIMEOUT};
pub use mock::MockLink;
