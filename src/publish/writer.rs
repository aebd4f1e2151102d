//! Atomic publication of the image file and the beam center side-file.
//!
//! Both files are staged next to their destination and renamed into
//! place, so the viewer never sees a half-written image. Both files are
//! staged before either is committed, and the side-file is committed only
//! after the image: if either staging step or the image rename fails, the
//! previously published files stay untouched.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use super::header::Header;
use crate::acquisition::OutputConfig;
use crate::decode::Frame;
use crate::metadata::AcquisitionMetadata;

/// Filesystem failures while publishing.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to stage image next to {path}: {source}")]
    Stage { path: PathBuf, source: io::Error },
    #[error("failed to write image data for {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("unable to write beam center file {path}: {source}")]
    SideFile { path: PathBuf, source: io::Error },
    #[error("failed to move image into place at {path}: {source}")]
    Commit { path: PathBuf, source: io::Error },
}

/// Writes published frames to fixed paths.
#[derive(Debug, Clone)]
pub struct Publisher {
    image_path: PathBuf,
    beam_center_path: PathBuf,
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Published files are read by the viewer, possibly as another user.
#[cfg(unix)]
fn make_readable(file: &NamedTempFile) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.as_file()
        .set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn make_readable(_file: &NamedTempFile) -> io::Result<()> {
    Ok(())
}

impl Publisher {
    pub fn new(image_path: impl Into<PathBuf>, beam_center_path: impl Into<PathBuf>) -> Self {
        Self {
            image_path: image_path.into(),
            beam_center_path: beam_center_path.into(),
        }
    }

    /// Path of the published image.
    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    /// Path of the beam center side-file.
    pub fn beam_center_path(&self) -> &Path {
        &self.beam_center_path
    }

    /// Writes `header` followed by the frame's pixels, plus the side-file.
    pub fn publish(
        &self,
        header: &Header,
        frame: &Frame,
        metadata: &AcquisitionMetadata,
    ) -> Result<(), PublishError> {
        let staged = self.stage_image(header, frame)?;
        let side_file = self.stage_side_file(metadata, frame)?;

        staged
            .persist(&self.image_path)
            .map_err(|e| PublishError::Commit {
                path: self.image_path.clone(),
                source: e.error,
            })?;
        side_file
            .persist(&self.beam_center_path)
            .map_err(|e| PublishError::SideFile {
                path: self.beam_center_path.clone(),
                source: e.error,
            })?;

        tracing::debug!(
            path = %self.image_path.display(),
            bytes = header.as_bytes().len() + frame.byte_len(),
            "Image committed"
        );
        Ok(())
    }

    fn stage_image(&self, header: &Header, frame: &Frame) -> Result<NamedTempFile, PublishError> {
        let stage_err = |source| PublishError::Stage {
            path: self.image_path.clone(),
            source,
        };
        let write_err = |source| PublishError::Write {
            path: self.image_path.clone(),
            source,
        };

        let staged = NamedTempFile::new_in(parent_dir(&self.image_path)).map_err(stage_err)?;
        make_readable(&staged).map_err(stage_err)?;

        let mut writer = BufWriter::new(staged);
        writer.write_all(header.as_bytes()).map_err(write_err)?;
        frame.write_le(&mut writer).map_err(write_err)?;
        let staged = writer
            .into_inner()
            .map_err(|e| write_err(e.into_error()))?;
        staged.as_file().sync_data().map_err(write_err)?;
        Ok(staged)
    }

    fn stage_side_file(
        &self,
        metadata: &AcquisitionMetadata,
        frame: &Frame,
    ) -> Result<NamedTempFile, PublishError> {
        let side_err = |source| PublishError::SideFile {
            path: self.beam_center_path.clone(),
            source,
        };

        let mut staged =
            NamedTempFile::new_in(parent_dir(&self.beam_center_path)).map_err(side_err)?;
        make_readable(&staged).map_err(side_err)?;
        write!(
            staged,
            "{} {} {} {}",
            metadata.beam_center_x,
            metadata.beam_center_y,
            frame.width(),
            frame.height()
        )
        .map_err(side_err)?;
        Ok(staged)
    }
}

impl From<&OutputConfig> for Publisher {
    fn from(config: &OutputConfig) -> Self {
        Self::new(&config.image_path, &config.beam_center_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::header::{synthesize_header, HeaderFields, HEADER_BYTES};

    fn metadata() -> AcquisitionMetadata {
        AcquisitionMetadata {
            beam_center_x: 2070.0,
            beam_center_y: 2190.5,
            detector_distance: 0.15,
            incident_energy: 12400.0,
        }
    }

    fn header_for(frame: &Frame) -> Header {
        synthesize_header(&HeaderFields::new(frame, &metadata()).unwrap()).unwrap()
    }

    #[test]
    fn test_pixel_region_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Publisher::new(dir.path().join("image"), dir.path().join("beam"));
        let pixels: Vec<u32> = (0..12 * 9).map(|i| i * 65_537).collect();
        let frame = Frame::new(pixels.clone(), 12, 9);
        let header = header_for(&frame);

        publisher.publish(&header, &frame, &metadata()).unwrap();

        let written = fs::read(publisher.image_path()).unwrap();
        assert_eq!(written.len(), HEADER_BYTES + pixels.len() * 4);
        assert_eq!(&written[..HEADER_BYTES], header.as_bytes());

        let decoded: Vec<u32> = written[HEADER_BYTES..]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(decoded, pixels);
    }

    #[test]
    fn test_side_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Publisher::new(dir.path().join("image"), dir.path().join("beam"));
        let frame = Frame::new(vec![0; 100], 10, 10);

        publisher
            .publish(&header_for(&frame), &frame, &metadata())
            .unwrap();

        let side = fs::read_to_string(publisher.beam_center_path()).unwrap();
        assert_eq!(side, "2070 2190.5 10 10");
    }

    #[test]
    fn test_republish_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Publisher::new(dir.path().join("image"), dir.path().join("beam"));

        let large = Frame::new(vec![1; 400], 20, 20);
        publisher
            .publish(&header_for(&large), &large, &metadata())
            .unwrap();
        let small = Frame::new(vec![2; 16], 4, 4);
        publisher
            .publish(&header_for(&small), &small, &metadata())
            .unwrap();

        let written = fs::read(publisher.image_path()).unwrap();
        assert_eq!(written.len(), HEADER_BYTES + 16 * 4);
        assert_eq!(
            fs::read_to_string(publisher.beam_center_path()).unwrap(),
            "2070 2190.5 4 4"
        );
    }

    #[test]
    fn test_side_file_failure_leaves_image_uncommitted() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Publisher::new(
            dir.path().join("image"),
            dir.path().join("missing").join("beam"),
        );
        let frame = Frame::new(vec![0; 4], 2, 2);

        let result = publisher.publish(&header_for(&frame), &frame, &metadata());

        assert!(matches!(result, Err(PublishError::SideFile { .. })));
        assert!(!publisher.image_path().exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_image_commit_failure_keeps_old_side_file() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Publisher::new(dir.path().join("image"), dir.path().join("beam"));
        // A non-empty directory at the image path makes the rename fail.
        fs::create_dir(publisher.image_path()).unwrap();
        fs::write(publisher.image_path().join("keep"), b"").unwrap();
        fs::write(publisher.beam_center_path(), "1 2 3 4").unwrap();
        let frame = Frame::new(vec![0; 4], 2, 2);

        let result = publisher.publish(&header_for(&frame), &frame, &metadata());

        assert!(matches!(result, Err(PublishError::Commit { .. })));
        assert_eq!(
            fs::read_to_string(publisher.beam_center_path()).unwrap(),
            "1 2 3 4"
        );
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_parent_dir_of_bare_name() {
        assert_eq!(parent_dir(Path::new("image")), Path::new("."));
        assert_eq!(parent_dir(Path::new("/tmp/image")), Path::new("/tmp"));
    }
}
