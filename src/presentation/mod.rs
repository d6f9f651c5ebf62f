// Presentation layer - Console rendering and operator input
pub mod console;
pub mod input;
pub mod render;
pub mod surface;
