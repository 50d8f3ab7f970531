pub mod error;
pub mod event;
pub mod title;
mod util;

pub use error::{Error, Result};
pub use event::*;
pub use title::Title;
pub use util::*;
