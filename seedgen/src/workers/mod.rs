pub mod assembler;
pub mod pool;

pub use assembler::BatchAssemblerWorker;
pub use pool::AssemblerPool;
