use anyhow::Context as _;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use toolgate_core::message::{ImageContent, ImageSource};
use toolgate_core::utils::encoding::decode_base64;
use toolgate_core::Timestamp;

/// Writes base64 images into `dir` as `chart-{stamp}-{n}.png`; URL images are skipped.
/// Existing files are left alone.
pub fn save_images(dir: &Path, images: &[ImageContent]) -> anyhow::Result<Vec<PathBuf>> {
    let inline: Vec<&str> = images
        .iter()
        .filter_map(|image| match &image.source {
            ImageSource::Base64 { data } => Some(data.as_str()),
            ImageSource::Url { .. } => None,
        })
        .collect();

    if inline.is_empty() {
        return Ok(Vec::new());
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let stamp = Timestamp::now().file_stamp();
    let mut saved = Vec::with_capacity(inline.len());
    let mut n = 0;
    for data in inline {
        let bytes = decode_base64(data).context("Image is not valid base64")?;
        let (path, mut file) = create_unused(dir, &stamp, &mut n)?;
        file.write_all(&bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        saved.push(path);
    }

    Ok(saved)
}

/// Opens the first `chart-{stamp}-{n}.png` that does not exist yet, so charts
/// saved within the same second never replace each other.
fn create_unused(dir: &Path, stamp: &str, n: &mut usize) -> anyhow::Result<(PathBuf, File)> {
    loop {
        *n += 1;
        let path = dir.join(format!("chart-{}-{}.png", stamp, n));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e).with_context(|| format!("Failed to create {}", path.display())),
        }
    }
}
