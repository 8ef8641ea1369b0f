//! Dataset preparation: list the labeled source folders, split each class
//! into train and test, and run the clip recipe into the output layout.

pub mod layout;
pub mod manifest;
pub mod runner;
pub mod split;

pub use layout::{artifact_paths, list_clips, prepare_output_dir, variant_file_name, ArtifactPaths, SplitKind};
pub use manifest::{read_manifest, write_manifest, MANIFEST_FILE};
pub use runner::{
    plan, process_clip, run, summary_line, ClassPlan, ClipArtifacts, ClipFailure, ClipJob, DatasetPlan, RunReport,
    StageFrames,
};
pub use split::{split_clips, test_count, ClipSplit};
