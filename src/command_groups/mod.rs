mod checks;
mod miscellaneous;
mod pug;

pub use miscellaneous::*;
pub use pug::*;
