pub mod config;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod mapping;
pub mod xml;

pub use config::Config;
pub use error::{Result, XmlGraphError};
pub use graph::{write_plan, GraphSink, Neo4jStore, WriteSummary};
pub use ingest::{import_file, plan_file, ImportSummary};
pub use mapping::{ImportPlan, MappingConfig};
