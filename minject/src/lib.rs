pub mod container;
pub mod error;
pub mod injector;
pub mod key;
pub mod monitor;
pub mod parameter;
pub mod policy;
pub mod provider;
pub mod resolve_guard;
pub mod scope;
pub mod statics;
pub mod target;

pub use container::*;
pub use error::*;
pub use injector::*;
pub use key::*;
pub use monitor::*;
pub use parameter::*;
pub use policy::*;
pub use provider::*;
pub use resolve_guard::*;
pub use scope::*;
pub use statics::*;
pub use target::*;
