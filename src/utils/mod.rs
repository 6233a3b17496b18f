pub mod git;
pub mod paths;
pub mod transcript;

pub use git::get_git_branch;
pub use paths::{cache_file_in, default_cache_dir};
pub use transcript::{parse_record, read_transcript, transcript_lines};
