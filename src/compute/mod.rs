pub mod rate;

pub use rate::{apply_rate, parse_rate_operand, parse_seed, RateType};
