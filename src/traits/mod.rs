pub mod node_executor;

pub use node_executor::NodeExecutor;
