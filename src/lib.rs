#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod animation;
pub mod board_move;
pub mod board_view;
pub mod config;
pub mod coord;
pub mod display;
pub mod drawing;
pub mod error;
pub mod event;
pub mod force;
pub mod grid;
pub mod interaction;
pub mod piece;
pub mod premove;
pub mod render;
pub mod rules;
pub mod shakmaty_rules;
pub mod snapshot;
pub mod surface;
pub mod theme;
pub mod util;
