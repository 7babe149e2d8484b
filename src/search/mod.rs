pub mod results;
pub mod projection;
pub mod executor;
