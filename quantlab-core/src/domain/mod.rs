//! Domain types: money, bars, orders, fills, positions, exits, equity.

pub mod bar;
pub mod equity;
pub mod exit;
pub mod fill;
pub mod money;
pub mod order;
pub mod position;

pub use bar::Bar;
pub use equity::EquitySnapshot;
pub use exit::{ExitOrder, ExitTrigger};
pub use fill::{Fill, FillId, FillIdGen};
pub use money::{Money, ParseMoneyError, MICROS_PER_UNIT};
pub use order::{Instruction, Order, OrderSide, OrderType, Signal};
pub use position::{Position, EPSILON};
