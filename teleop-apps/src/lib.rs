#![doc = include_str!("../README.md")]

mod config;
mod error;
#[cfg(unix)]
pub mod keyboard;
mod logging_move_base;
mod overwrite;
pub mod utils;

pub use crate::{config::*, error::*, logging_move_base::*, overwrite::*};
