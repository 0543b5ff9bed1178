//! Estimates the FPGA area needed to implement each circuit's logical RAMs by greedily
//! mapping them onto the physical memories of a target architecture.

pub mod config;
pub mod error;
pub mod mapper;
pub mod model;
pub mod resource;
pub mod utils;

pub use config::{ArchConfig, ArchMode, ArchParams, BlockSpec};
pub use error::{MapError, Result};
pub use mapper::{AreaModel, BasicArea, CustomArea, Mapper, map_circuits};
pub use model::{Circuit, LogicalRam, MappedRam, MemMode, PhysType};
pub use resource::{ResourceEntry, build_catalog};
