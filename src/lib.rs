//! Test-fixture generation: populate a declared type with random, constraint
//! aware values, honoring cross-field assignment rules.
pub mod assignment;
pub mod constraint;
pub mod context;
pub mod engine;
pub mod error;
pub mod generator;
pub mod hints;
pub mod model;
pub mod node;
pub mod path_de;
pub mod pojo_store;
pub mod populate;
pub mod post_process;
pub mod random;
pub mod resolver;
pub mod result;
pub mod selector;
pub mod settings;
pub mod value;

pub use context::ModelContext;
pub use engine::Engine;
pub use error::{BoxError, FixtureError};
pub use model::{Fixture, ModelSpec};
pub use random::Random;
pub use settings::Settings;
pub use value::Value;
