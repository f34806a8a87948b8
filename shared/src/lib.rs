pub mod constants;
pub mod palettes;
pub mod roller;
pub mod validation;
