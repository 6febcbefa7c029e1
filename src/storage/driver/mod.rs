pub mod filesystem;
pub mod object;
