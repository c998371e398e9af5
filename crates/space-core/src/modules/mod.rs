pub mod alignment;
pub mod composition;
pub mod export;
pub mod files;
pub mod matrix;
pub mod normalization;
pub mod pipeline;
pub mod range;
pub mod record;

pub use alignment::{
    ReferenceAxis, align_batch, align_record, select_reference_axis, verify_alignment,
};
pub use composition::{CategoryRule, CompositionTable, TaxonomyDepth, compose};
pub use files::{collect_all_filenames, discover_input_files, filter_filenames, path_exists};
pub use matrix::{ColumnAxis, SpectralMatrix, assemble_matrix};
pub use normalization::{
    NORMALIZATION_STRATEGIES, NormalizationKind, NormalizationStage, NormalizationStrategy,
    linear_normalize, lookup_normalization, pca_reduce, project,
};
pub use pipeline::{
    ImportOptions, ImportedBatch, SkippedFile, build_matrix, import_batch, parse_files,
    prepare_batch,
};
pub use range::{find_common_range, reconcile_ranges, truncate_record};
pub use record::{parse_record, parse_record_file};
