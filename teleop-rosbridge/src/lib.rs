#![doc = include_str!("../README.md")]
#![warn(rust_2018_idioms)]

mod client;
mod cmd_vel_move_base;
mod error;
pub mod msg;
mod protocol;

pub use crate::{client::*, cmd_vel_move_base::*, error::*, protocol::*};
