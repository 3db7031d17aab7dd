#![deny(warnings)]

pub mod events;
pub mod frame;
pub mod render_loop;
pub mod time;
