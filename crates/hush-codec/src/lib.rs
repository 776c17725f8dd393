#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

mod decode;
mod frame;

pub use decode::{decode, DecodedSymbol};
pub use frame::{frame, starter_frame, symbol_frame, terminator_frame};
