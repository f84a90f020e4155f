//! Compressed bundle of a whole test run.

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use ng_config::TestRun;
use tracing::info;

use crate::prelude::*;

/// Pack `<root>/<test_id>` into `<root>/<test_id>.tgz` and delete the directory.
///
/// Every entry of the archive lives under `test_id/`. The directory is only
/// removed once the archive has been fully written. An existing archive is
/// never replaced.
pub fn archive_test_run(run: &TestRun, root: &Path) -> Result<PathBuf> {
    let test_dir = run.test_dir(root);
    let archive_path = run.archive_path(root);
    if archive_path.exists() {
        return Err(Error::ArchiveExists(archive_path));
    }
    info!("Archiving {:?} to {:?}", test_dir, archive_path);

    if let Err(source) = write_archive(&test_dir, &run.test_id, &archive_path) {
        let _ = std::fs::remove_file(&archive_path);
        return Err(Error::Archive {
            path: archive_path,
            source,
        });
    }

    std::fs::remove_dir_all(&test_dir)?;
    Ok(archive_path)
}

fn write_archive(dir: &Path, root_name: &str, archive_path: &Path) -> std::io::Result<()> {
    let file = File::create(archive_path)?;
    let mut tar = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    tar.append_dir_all(root_name, dir)?;
    let encoder = tar.into_inner()?;
    encoder.finish()?.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::fs;

    #[test]
    fn archive_replaces_tree() -> Result<()> {
        let root = tempfile::tempdir()?;
        let run = TestRun::new("1.1.1-Blah", "post")?;
        let device_dir = run.phase_dir(root.path()).join("r1");
        fs::create_dir_all(&device_dir)?;
        fs::write(device_dir.join("bgp.txt"), "output")?;

        let archive = archive_test_run(&run, root.path())?;
        assert_eq!(archive, root.path().join("1.1.1-Blah.tgz"));
        assert!(!run.test_dir(root.path()).exists());

        let mut entries: Vec<String> = tar::Archive::new(GzDecoder::new(File::open(&archive)?))
            .entries()?
            .map(|entry| -> std::io::Result<String> {
                Ok(entry?.path()?.display().to_string())
            })
            .collect::<std::io::Result<_>>()?;
        entries.sort();
        assert!(entries.iter().all(|e| e.starts_with("1.1.1-Blah")));
        assert!(entries.contains(&"1.1.1-Blah/post/r1/bgp.txt".to_string()));
        Ok(())
    }

    #[test]
    fn existing_archive_is_kept() -> Result<()> {
        let root = tempfile::tempdir()?;
        let run = TestRun::new("1.1.1-Blah", "post")?;
        fs::create_dir_all(run.phase_dir(root.path()))?;
        fs::write(run.archive_path(root.path()), "pre results")?;

        assert!(matches!(
            archive_test_run(&run, root.path()),
            Err(Error::ArchiveExists(_))
        ));
        assert_eq!(fs::read_to_string(run.archive_path(root.path()))?, "pre results");
        assert!(run.phase_dir(root.path()).exists());
        Ok(())
    }

    #[test]
    fn missing_tree_is_an_archive_error() -> Result<()> {
        let root = tempfile::tempdir()?;
        let run = TestRun::new("never-ran", "pre")?;
        assert!(matches!(
            archive_test_run(&run, root.path()),
            Err(Error::Archive { .. })
        ));
        assert!(!run.archive_path(root.path()).exists());
        Ok(())
    }
}
