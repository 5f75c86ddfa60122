// ABOUTME: Unpacks grader output files from the tar streams the container runtime returns
// ABOUTME: Persists the extracted artifact into the destination directory on the host

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tar::Archive;

/// Read the contents of `file_name` out of a tar archive
pub fn extract_file(tar_data: &[u8], file_name: &str) -> io::Result<Vec<u8>> {
    let mut archive = Archive::new(tar_data);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let matches = entry
            .path()?
            .file_name()
            .map(|name| name == file_name)
            .unwrap_or(false);

        if matches && entry.header().entry_type().is_file() {
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents)?;
            return Ok(contents);
        }
    }

    Err(io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} not present in archive", file_name),
    ))
}

/// Write the artifact into `dst_dir`, returning the written path
pub fn persist(dst_dir: &Path, file_name: &str, contents: &[u8]) -> io::Result<PathBuf> {
    let path = dst_dir.join(file_name);
    fs::write(&path, contents)?;
    Ok(path)
}

#[cfg(test)]
pub(crate) fn tar_with_file(file_name: &str, contents: &[u8]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, file_name, contents)
        .expect("append tar entry");
    builder.into_inner().expect("finish tar archive")
}
