mod lifecycle;
mod reasoning;
mod triple_store;

pub use lifecycle::*;
pub use reasoning::*;
pub use triple_store::*;
