#![doc = include_str!("../README.md")]
#![warn(rust_2018_idioms)]

mod dummy_move_base;
mod error;
mod input;
mod move_base;
mod publisher;
mod state;

pub use crate::{dummy_move_base::*, error::*, input::*, move_base::*, publisher::*, state::*};
