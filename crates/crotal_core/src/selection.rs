//! Capturing the user's file selection.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// How a file is decoded before the overlay is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Tiff,
    /// Anything the generic raster decoder handles (png, jpeg, bmp, ...).
    Raster,
}

impl ImageKind {
    pub fn from_name(name: &str) -> Self {
        match extension_of(name).as_deref() {
            Some("tif") | Some("tiff") => ImageKind::Tiff,
            _ => ImageKind::Raster,
        }
    }
}

/// One selected file with its raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Base name, used both for the upload and to match results.
    pub name: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(&name),
            name,
            bytes,
        }
    }

    pub fn kind(&self) -> ImageKind {
        ImageKind::from_name(&self.name)
    }

    /// MIME type sent with the multipart part, guessed from the extension.
    pub fn mime(&self) -> mime_guess::Mime {
        mime_guess::from_path(&self.name).first_or_octet_stream()
    }
}

/// Ordered, immutable set of files captured from one user interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    files: Vec<SelectedFile>,
}

impl FileSelection {
    pub fn new(files: Vec<SelectedFile>) -> Result<Self> {
        if files.is_empty() {
            anyhow::bail!("no files selected");
        }
        Ok(Self { files })
    }

    /// Read every path in order. Fails on the first unreadable file.
    pub fn from_paths<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Result<Self> {
        let mut files = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .with_context(|| format!("not a file path: {}", path.display()))?;
            let bytes =
                fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
            files.push(SelectedFile {
                name,
                path: path.to_path_buf(),
                bytes,
            });
        }
        Self::new(files)
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn into_files(self) -> Vec<SelectedFile> {
        self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Names shown as acknowledgment entries before anything is uploaded.
    pub fn placeholders(&self) -> Vec<String> {
        self.files.iter().map(|f| f.name.clone()).collect()
    }
}

/// Options controlling how folder scanning behaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// When true, scan subdirectories recursively.
    pub recursive: bool,
}

/// List the uploadable images in a folder, sorted by path.
pub fn scan_folder(path: impl AsRef<Path>, opts: ScanOptions) -> Result<Vec<PathBuf>> {
    let root = path.as_ref();
    if !root.exists() {
        anyhow::bail!("Path does not exist: {}", root.display());
    }
    if !root.is_dir() {
        anyhow::bail!("Path is not a directory: {}", root.display());
    }

    let walker = if opts.recursive {
        WalkDir::new(root).into_iter()
    } else {
        WalkDir::new(root).max_depth(1).into_iter()
    };

    let mut found = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("walkdir error: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && is_supported_image(path) {
            found.push(path.to_path_buf());
        }
    }
    found.sort();
    Ok(found)
}

fn is_supported_image(path: &Path) -> bool {
    match path.file_name().and_then(|s| s.to_str()).and_then(extension_of) {
        Some(ext) => matches!(
            ext.as_str(),
            "jpg" | "jpeg" | "png" | "bmp" | "gif" | "tif" | "tiff"
        ),
        None => false,
    }
}

fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs::File;
    use tempfile::tempdir;

    #[rstest]
    #[case("b.tif", ImageKind::Tiff)]
    #[case("scan.TIFF", ImageKind::Tiff)]
    #[case("a.png", ImageKind::Raster)]
    #[case("photo.jpeg", ImageKind::Raster)]
    #[case("no_extension", ImageKind::Raster)]
    #[case("archive.tif.png", ImageKind::Raster)]
    fn kind_follows_last_extension(#[case] name: &str, #[case] expected: ImageKind) {
        assert_eq!(ImageKind::from_name(name), expected);
    }

    #[test]
    fn from_paths_keeps_order_and_reads_bytes() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("z.png"), b"zz")?;
        fs::write(dir.path().join("a.tif"), b"a")?;

        let selection =
            FileSelection::from_paths([dir.path().join("z.png"), dir.path().join("a.tif")])?;
        assert_eq!(selection.placeholders(), vec!["z.png", "a.tif"]);
        assert_eq!(selection.files()[0].bytes, b"zz");
        assert_eq!(selection.files()[1].kind(), ImageKind::Tiff);
        assert_eq!(selection.files()[1].mime().essence_str(), "image/tiff");
        Ok(())
    }

    #[rstest]
    #[case("a.png", "image/png")]
    #[case("A.JPG", "image/jpeg")]
    #[case("scan.tiff", "image/tiff")]
    #[case("frame.webp", "image/webp")]
    #[case("notes", "application/octet-stream")]
    fn mime_follows_extension(#[case] name: &str, #[case] expected: &str) {
        let file = SelectedFile::from_bytes(name, Vec::new());
        assert_eq!(file.mime().essence_str(), expected);
    }

    #[test]
    fn from_paths_reports_missing_file() {
        let dir = tempdir().unwrap();
        let err = FileSelection::from_paths([dir.path().join("gone.png")]).unwrap_err();
        assert!(err.to_string().contains("gone.png"));
    }

    #[test]
    fn empty_selection_is_rejected() {
        assert!(FileSelection::new(Vec::new()).is_err());
    }

    #[test]
    fn scan_folder_empty_returns_empty() -> Result<()> {
        let dir = tempdir()?;
        let rows = scan_folder(dir.path(), ScanOptions::default())?;
        assert!(rows.is_empty());
        Ok(())
    }

    #[test]
    fn scan_folder_lists_only_images_non_recursive() -> Result<()> {
        let dir = tempdir()?;
        File::create(dir.path().join("a.JPG"))?;
        File::create(dir.path().join("b.tiff"))?;
        File::create(dir.path().join("c.png"))?;
        File::create(dir.path().join("not-image.txt"))?;
        let nested = dir.path().join("nested");
        fs::create_dir(&nested)?;
        File::create(nested.join("d.tif"))?;

        let rows = scan_folder(dir.path(), ScanOptions { recursive: false })?;
        let files: Vec<String> = rows
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(files, vec!["a.JPG", "b.tiff", "c.png"]);
        Ok(())
    }

    #[test]
    fn scan_folder_lists_images_recursive_when_enabled() -> Result<()> {
        let dir = tempdir()?;
        File::create(dir.path().join("a.jpg"))?;
        let nested = dir.path().join("nested");
        fs::create_dir(&nested)?;
        File::create(nested.join("b.TIF"))?;

        let rows = scan_folder(dir.path(), ScanOptions { recursive: true })?;
        let mut files: Vec<String> = rows
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        files.sort();
        assert_eq!(files, vec!["a.jpg", "b.TIF"]);
        Ok(())
    }

    #[test]
    fn scan_folder_rejects_file_path() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("a.png");
        File::create(&file)?;
        assert!(scan_folder(&file, ScanOptions::default()).is_err());
        Ok(())
    }
}
