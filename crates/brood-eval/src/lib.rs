pub mod connection;
pub mod master;
pub mod protocol;
pub mod slave;
pub mod wire;

pub use connection::Connection;
pub use master::{EvalReply, MasterConnection};
pub use protocol::{Opcode, ResultKind};
pub use slave::{Slave, SlaveCheckpoint, SlaveConfig, build_state, default_registry};
