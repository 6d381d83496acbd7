//! Interactive components of the presentation surface

mod input;
mod scroll;

pub use input::{InputBox, CHAR_LIMIT, PLACEHOLDER};
pub use scroll::ScrollView;
