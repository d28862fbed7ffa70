//! # Panbatch
//!
//! Batch orthorectification and pansharpening of satellite image pairs.
//!
//! ## Usage
//!
//! ```bash
//! panbatch -p 3413 [-t Byte] [-c rf] [--parallel-processes N | --pbs] <SRC> <DST>
//! ```
//!
//! ## Modules
//!
//! - `cli` - Argument parsing and the batch command
//! - `config` - Output options, tool configuration and validation
//! - `discovery` - Expansion of a source directory, manifest or image
//! - `dispatch` - Serial, local-parallel and cluster backends
//! - `error` - Error types with numeric codes
//! - `paths` - Deterministic output path planning
//! - `pipeline` - Per-image stage sequence and per-task logs
//! - `queue` - Task queue construction
//! - `sensor` - Sensor detection and panchromatic companion naming
//! - `subprocess` - Subprocess abstraction layer for testing
//! - `testing` - Fake toolchain and fixtures
//! - `tools` - External ortho, pansharpen and overview tools
pub mod cli;
pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod paths;
pub mod pipeline;
pub mod queue;
pub mod sensor;
pub mod subprocess;
pub mod tools;

pub mod testing;
