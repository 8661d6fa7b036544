//! Background loops for continuous processing.

pub mod session_loop;
