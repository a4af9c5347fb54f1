pub mod clock;
pub mod dir;
pub mod logging;
pub mod percentage;
