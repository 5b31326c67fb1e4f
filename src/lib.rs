use std::sync::Once;

pub mod s1_model;
pub mod s2_analyzer;
pub mod s3_optimizer;
pub mod s4_generator;

pub use s1_model::Model;
pub use s2_analyzer::{Analyser, AnalyserModel};
pub use s4_generator::{generate_code, Generator, GeneratorProfile};

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        env_logger::init();
    });
}
