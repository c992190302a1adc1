//! A cycle-counted 6510/SID core for driving C64 music routines.
//!
//! This crate models just enough of a Commodore 64 to execute original
//! 6510 machine code and observe what it does to the SID register file
//! at $D400 — a CPU interpreter, a SID write observer, and a coarse VIC-II
//! raster timer, wired together by [`facade::C64`]. It does not produce
//! audio: the SID module tracks *what was written*, not what it would
//! have sounded like. Pixel-accurate video, sprites, CIA timers and disk
//! I/O are all out of scope (see each module's docs for specifics).

pub mod cpu;
pub mod error;
pub mod facade;
pub mod memory;
pub mod sid;
pub mod vic;

pub use error::PrgError;
pub use facade::C64;
pub use memory::Memory;
pub use sid::{RegisterChange, RegisterMeaning, Sid};
pub use vic::{Model, Vic};
