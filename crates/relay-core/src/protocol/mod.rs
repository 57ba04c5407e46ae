//! Wire-level formats: the inbound JSON job envelope and ESC/POS constants.

pub mod envelope;
pub mod escpos;
