pub mod bhe;
pub mod bounds;
pub mod convolve;
pub mod gfunction;
pub mod ghe;
pub mod line_source;
pub mod loads;
pub mod media;
pub mod superposition;
