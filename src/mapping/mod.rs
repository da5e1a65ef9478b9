pub mod generator;

pub use generator::generate_mapping_id;
