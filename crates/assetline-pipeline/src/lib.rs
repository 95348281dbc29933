//! Assetline Pipeline - Asset tasks and deployment artefacts
//!
//! Every asset category has one task that discovers its inputs, runs a fixed
//! sequence of transforms and writes the results all-or-nothing. The
//! [`site`] module wires them into the standard task graph, and the
//! [`integrity`] and [`artefacts`] modules produce the deployment companions.

pub mod artefacts;
pub mod command;
pub mod integrity;
pub mod output;
pub mod site;
pub mod sources;
pub mod tasks;
pub mod transform;

pub use artefacts::{build_archive, write_archive, ArchiveReport};
pub use command::{run_command, Invocation};
pub use integrity::{generate_manifest, IntegrityManifest};
pub use output::StagedOutput;
pub use site::{compile_steps, site_graph, SiteTasks};
pub use sources::{discover, require_inputs};
