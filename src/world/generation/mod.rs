//! World generation for hosted arenas

mod void_generator;

pub use void_generator::{VoidGenerator, VoidPopulator};
