//! Line-oriented building blocks for text mesh decks.
//!
//! - [`LineCursor`]: single-pass cursor the text codecs pull records from
//! - [`Deck`]/[`Card`]: `*KEYWORD, PARAM=value` card splitter with `*INCLUDE` expansion

mod card;
mod cursor;
mod error;
mod include;

pub use card::{Card, Deck, Parameter};
pub use cursor::LineCursor;
pub use error::ParseError;
