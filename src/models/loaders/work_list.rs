use crate::models::work::WorkId;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// Load the ordered work-id list from a text file, one id per line.
/// Blank lines are ignored; ordering is processing order.
pub async fn load_work_ids(path: &Path) -> Result<Vec<WorkId>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read work list: {}", path.display()))?;

    let works: Vec<WorkId> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(WorkId::parse)
        .collect();

    tracing::info!("loaded {} work ids from {}", works.len(), path.display());

    Ok(works)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "W22084\n\n  \nbdr:W1KG13126\n").unwrap();

        let works = load_work_ids(file.path()).await.unwrap();
        assert_eq!(works.len(), 2);
        assert_eq!(works[0].local, "W22084");
        assert_eq!(works[1].local, "W1KG13126");
    }

    #[tokio::test]
    async fn test_load_missing_file_is_error() {
        let result = load_work_ids(Path::new("does/not/exist.txt")).await;
        assert!(result.is_err());
    }
}
