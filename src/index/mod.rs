pub mod posting;
pub mod inverted;
pub mod text;
pub mod facet;
pub mod vector;
