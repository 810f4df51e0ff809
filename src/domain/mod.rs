//! Domain Layer - Core types for the day-stepped signal engine
//!
//! Pure data and state transitions with no I/O. Strategies read these types
//! and the ports layer carries them out of the engine.
//!
//! - `panel`: the read-only close-price matrix
//! - `score`: per-asset scores and their ranked form
//! - `order`: signed trade-at-close instructions
//! - `position`: pair position state and its transitions
//! - `fault`: `(day, subject, kind, message)` failure reports

pub mod fault;
pub mod order;
pub mod panel;
pub mod position;
pub mod score;

pub use fault::{Fault, FaultKind, Subject};
pub use order::{Order, Side};
pub use panel::{PanelError, PricePanel};
pub use position::{LegTrade, PairPosition, PositionError, SpreadBias};
pub use score::{AssetScore, RankedSelection};
