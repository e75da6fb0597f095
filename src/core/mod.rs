pub mod color;
pub mod error;
pub mod loader;
pub mod mesh;
pub mod view;
