/// Point cloud file output with all-or-nothing writes
use crate::config::{OutputFormat, PlyEncoding};
use crate::constants::COORDINATE_PRECISION;
use crate::error::{PipelineError, Result};
use crate::ply_writer::write_ply;
use crate::point_cloud::PointCloud;
use crate::sphere::SpherePoint;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Pick the output format.
///
/// An explicit format always wins; a contradicting extension is only
/// logged. Without one, the extension decides and anything other than
/// `.ply`/`.xyz` is rejected.
pub fn resolve_format(output: &Path, requested: Option<OutputFormat>) -> Result<OutputFormat> {
    let implied = OutputFormat::from_path(output);

    match (requested, implied) {
        (Some(format), Some(ext_format)) if format != ext_format => {
            warn!(
                "Writing {:?} to {} despite its extension; --format takes precedence",
                format,
                output.display()
            );
            Ok(format)
        }
        (Some(format), _) => Ok(format),
        (None, Some(format)) => Ok(format),
        (None, None) => Err(PipelineError::UnsupportedExtension(output.to_path_buf())),
    }
}

/// Serialise `cloud` next to `path`, ready to be committed.
pub fn stage_point_cloud(
    cloud: &PointCloud,
    path: &Path,
    format: OutputFormat,
    encoding: PlyEncoding,
) -> Result<StagedFile> {
    if format == OutputFormat::Xyz && cloud.has_colour {
        warn!("XYZ output carries coordinates only; vertex colour is dropped");
    }

    StagedFile::write(path, |writer| match format {
        OutputFormat::Ply => write_ply(writer, &cloud.points, encoding, cloud.has_colour),
        OutputFormat::Xyz => write_xyz(writer, &cloud.points),
    })
}

/// One `x y z` line per point.
pub fn write_xyz<W: Write>(writer: &mut W, points: &[SpherePoint]) -> io::Result<()> {
    let p = COORDINATE_PRECISION;
    for point in points {
        writeln!(writer, "{:.p$} {:.p$} {:.p$}", point.x, point.y, point.z)?;
    }
    Ok(())
}

/// An output fully written to a hidden sibling of its destination.
///
/// Nothing appears at `path` until [`StagedFile::commit`]. Dropping an
/// uncommitted file removes the sibling.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    temp_path: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub fn write<F>(path: &Path, write: F) -> Result<Self>
    where
        F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
    {
        let staged = Self {
            path: path.to_path_buf(),
            temp_path: temporary_sibling(path),
            committed: false,
        };

        File::create(&staged.temp_path)
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                write(&mut writer)?;
                let file = writer.into_inner().map_err(|err| err.into_error())?;
                file.sync_all()
            })
            .map_err(|source| PipelineError::write(path, source))?;

        Ok(staged)
    }

    /// Rename the sibling over the destination.
    pub fn commit(mut self) -> Result<PathBuf> {
        fs::rename(&self.temp_path, &self.path)
            .map_err(|source| PipelineError::write(&self.path, source))?;
        self.committed = true;
        Ok(self.path.clone())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

/// Commit `files` in order. If any rename fails, the ones already in place
/// are removed again so a run leaves either every output or none.
pub fn commit_all(files: Vec<StagedFile>) -> Result<Vec<PathBuf>> {
    let mut committed = Vec::with_capacity(files.len());
    for file in files {
        match file.commit() {
            Ok(path) => committed.push(path),
            Err(err) => {
                for path in &committed {
                    let _ = fs::remove_file(path);
                }
                return Err(err);
            }
        }
    }
    Ok(committed)
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn extension_selects_format() {
        assert_eq!(
            resolve_format(Path::new("a.ply"), None).unwrap(),
            OutputFormat::Ply
        );
        assert_eq!(
            resolve_format(Path::new("a.XYZ"), None).unwrap(),
            OutputFormat::Xyz
        );
    }

    #[test]
    fn explicit_format_wins_over_extension() {
        assert_eq!(
            resolve_format(Path::new("a.xyz"), Some(OutputFormat::Ply)).unwrap(),
            OutputFormat::Ply
        );
        assert_eq!(
            resolve_format(Path::new("a.txt"), Some(OutputFormat::Xyz)).unwrap(),
            OutputFormat::Xyz
        );
    }

    #[test]
    fn unknown_extension_without_format_is_a_write_error() {
        let err = resolve_format(Path::new("cloud.obj"), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Write);
    }

    #[test]
    fn xyz_lines_have_three_coordinates() {
        let points = [
            SpherePoint::new([0.0, 10.0, 0.0]),
            SpherePoint::new([1.25, -2.5, 3.0]).with_colour([1, 2, 3]),
        ];
        let mut buffer = Vec::new();
        write_xyz(&mut buffer, &points).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "0.000000 10.000000 0.000000\n1.250000 -2.500000 3.000000\n"
        );
    }

    #[test]
    fn failed_write_leaves_no_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.ply");

        let err = StagedFile::write(&path, |writer| {
            writer.write_all(b"partial")?;
            Err(io::Error::other("disk full"))
        })
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Write);
        assert!(!path.exists());
        assert!(!temporary_sibling(&path).exists());
    }

    #[test]
    fn commit_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.xyz");
        fs::write(&path, "stale").unwrap();

        let staged = StagedFile::write(&path, |writer| writer.write_all(b"fresh\n")).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "stale");

        assert_eq!(staged.commit().unwrap(), path);
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
        assert!(!temporary_sibling(&path).exists());
    }

    #[test]
    fn dropped_stage_is_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.ply");

        let staged = StagedFile::write(&path, |writer| writer.write_all(b"ply\n")).unwrap();
        assert!(temporary_sibling(&path).exists());
        drop(staged);

        assert!(!temporary_sibling(&path).exists());
        assert!(!path.exists());
    }

    #[test]
    fn failed_commit_rolls_back_earlier_files() {
        let dir = tempfile::tempdir().unwrap();
        let side = dir.path().join("cloud.json");
        // A directory in the way makes the rename fail.
        let blocked = dir.path().join("cloud.ply");
        fs::create_dir(&blocked).unwrap();

        let files = vec![
            StagedFile::write(&side, |writer| writer.write_all(b"{}\n")).unwrap(),
            StagedFile::write(&blocked, |writer| writer.write_all(b"ply\n")).unwrap(),
        ];
        let err = commit_all(files).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Write);
        assert!(!side.exists());
        assert!(!temporary_sibling(&side).exists());
        assert!(!temporary_sibling(&blocked).exists());
    }

    #[test]
    fn unwritable_directory_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("cloud.ply");
        let cloud = PointCloud::default();
        let err = stage_point_cloud(&cloud, &path, OutputFormat::Ply, PlyEncoding::Ascii)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Write);
    }
}
