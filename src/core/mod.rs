pub mod error;
pub mod types;
pub mod value;

pub use error::{DictError, Result};
pub use types::{ComponentType, ModificationType};
pub use value::{RecordFields, Value};
