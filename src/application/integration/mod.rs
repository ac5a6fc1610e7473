pub mod integrator;
pub mod name_matching;
pub mod query_assembler;
pub mod windowing;

pub use integrator::{DatasetIntegrator, IntegrationOutput};
pub use name_matching::{NameMatch, NameMatcher, normalize_name};
