pub mod view;

pub use view::{display_order, scenario_rows, spread, OperationRow, Spread};
