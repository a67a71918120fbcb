pub mod block;
pub mod clock;
pub mod consensus;
pub mod model;

pub use block::Block;
pub use clock::{Clock, FixedClock, SystemClock};
pub use consensus::resolve;
pub use model::Chain;
