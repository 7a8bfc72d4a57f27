pub mod builder;
pub mod defaults;
pub mod pool;
pub mod runtime;
pub mod traits;
