//! Phonosynth - Random Phonological Inventory Synthesis
//!
//! Copyright (c) 2025 Phonosynth Contributors
//! Licensed under MIT License
//!
//! Generates random inventories of signed binary feature vectors that match
//! observed inventories in size (and optionally in segment or feature
//! frequencies), while guaranteeing that no two items of one inventory share
//! a feature vector.

pub mod batch;
pub mod cache;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod feature;
pub mod io;
pub mod oracle;
pub mod pipeline;
pub mod sampler;
pub mod segment;
pub mod stats;
pub mod strategy;

// Re-export main types for convenience
pub use batch::{templates, Inventory, InventoryBatchBuilder, SizeTable, Template};
pub use config::{InputLayout, OutputKind, RunConfig};
pub use error::{Result, SynthError};
pub use feature::{Feature, FeatureMatrix, FeatureVector, ValueSet};
pub use sampler::{sample_feature, sample_matrix, FeatureSampler};
pub use segment::{sample_segments, SegmentCatalog, SegmentSampler};
pub use strategy::{Sample, SamplingStrategy};
