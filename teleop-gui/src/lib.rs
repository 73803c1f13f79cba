#![doc = include_str!("../README.md")]
#![warn(rust_2018_idioms)]

mod error;
mod joystick;
mod panel;
mod settings;
mod style;

pub use crate::{error::*, panel::*, settings::*};
