pub mod contracts;
pub mod ports;
pub mod rpc;

pub use ports::{ChainReader, ChainWriter};
pub use rpc::RpcClient;
