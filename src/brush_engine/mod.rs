pub mod brush;
pub mod stroke;
