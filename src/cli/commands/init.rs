use crate::config::{CONFIG_FILE_NAME, SAMPLE_AIRRC};
use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Write a sample configuration into `dir`. An existing file is never touched.
pub async fn init(dir: &Path, out: &mut dyn Write) -> Result<()> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        bail!("{} already exists; not overwriting", path.display());
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
        .with_context(|| format!("unable to create {}", path.display()))?;
    file.write_all(SAMPLE_AIRRC.as_bytes()).await?;
    file.flush().await?;

    writeln!(out, "📝 Wrote sample configuration to {}", path.display())?;
    writeln!(out, "   Edit the server URLs and credentials before running other commands.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_writes_sample() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();

        init(dir.path(), &mut out).await.unwrap();

        let written = std::fs::read_to_string(dir.path().join(".airrc")).unwrap();
        assert_eq!(written, SAMPLE_AIRRC);
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".airrc"), "# mine\n").unwrap();
        let mut out = Vec::new();

        let err = init(dir.path(), &mut out).await.unwrap_err();

        assert!(err.to_string().contains("already exists"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join(".airrc")).unwrap(),
            "# mine\n"
        );
    }
}
