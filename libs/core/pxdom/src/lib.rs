pub mod mutation;
pub mod tree;
