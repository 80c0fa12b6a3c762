use crate::features::genome_annotation::StatusReport;

pub const GIT_URL: &str = "https://github.com/kbaseapps/GenomeAnnotationFileUtil";

/// Commit the binary was built from, when the build recorded one
const GIT_COMMIT_HASH: Option<&str> = option_env!("GAFU_GIT_COMMIT");

pub fn handle() -> StatusReport {
    StatusReport {
        state: "OK".to_string(),
        message: String::new(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_url: GIT_URL.to_string(),
        git_commit_hash: GIT_COMMIT_HASH.unwrap_or("unknown").to_string(),
    }
}
