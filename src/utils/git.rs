use std::path::{Path, PathBuf};
use tokio::fs as async_fs;

// Locate the git directory for `cwd`, following `gitdir:` files used by worktrees
async fn find_git_dir(cwd: &Path) -> Option<PathBuf> {
    for dir in cwd.ancestors() {
        let candidate = dir.join(".git");
        let Ok(meta) = async_fs::metadata(&candidate).await else {
            continue;
        };

        if meta.is_dir() {
            return Some(candidate);
        }

        let content = async_fs::read_to_string(&candidate).await.ok()?;
        let target = content.trim().strip_prefix("gitdir:")?.trim();
        return Some(dir.join(target));
    }
    None
}

// Branch name from a HEAD file, or a short hash when detached
fn branch_from_head(head: &str) -> Option<String> {
    let trimmed = head.trim();

    if let Some(branch) = trimmed.strip_prefix("ref: refs/heads/") {
        return Some(branch.to_string());
    }

    if trimmed.len() >= 7 && !trimmed.starts_with("ref:") {
        return trimmed.get(..7).map(str::to_string);
    }

    None
}

// Get git branch without spawning git
pub async fn get_git_branch(cwd: &Path) -> Option<String> {
    let git_dir = find_git_dir(cwd).await?;
    let content = async_fs::read_to_string(git_dir.join("HEAD")).await.ok()?;
    branch_from_head(&content)
}
