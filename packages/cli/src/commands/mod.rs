pub mod diff;
pub mod init;
pub mod render;

pub use diff::{diff, DiffArgs};
pub use init::{init, InitArgs};
pub use render::{render, RenderArgs};
