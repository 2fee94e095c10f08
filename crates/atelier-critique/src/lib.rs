//! Atelier critique pipeline.
//!
//! The teaching-system side of the product: the media/style/scenario
//! module catalog, the fixed five-step prompt built from it, the critique
//! report schema the model must return, master-artist validation, and the
//! vision-model client behind the [`VisionModel`] port.

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod client;
pub mod master;
pub mod modules;
pub mod prompt;
pub mod report;

pub use client::{CritiqueError, OpenAiVision, VisionModel};
pub use master::{MasterInfo, MasterVerdict};
pub use modules::{MediaModule, ModuleCatalog, ScenarioModule, SelectedModules, StyleModule};
pub use report::{Advice, Coordinate, CritiqueReport, PerformanceType, ScoreEntry, Scoring};
