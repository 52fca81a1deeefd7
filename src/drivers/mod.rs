//! Hardware initialisation and the periodic wake timer.

pub mod hw_init;
pub mod hw_timer;
