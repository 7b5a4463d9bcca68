pub mod arena;
pub mod summation;

pub use arena::{
    ConfArena,
    ConfId,
};
pub use summation::StableSum;
