pub mod layered;
pub mod ordered;
pub mod stochastic;
pub mod threshold;

pub use layered::{
    LayeredGenerator,
    DEFAULT_LAYER_STEP,
};
pub use ordered::OrderedGenerator;
pub use stochastic::StochasticGenerator;
pub use threshold::ThresholdGenerator;
