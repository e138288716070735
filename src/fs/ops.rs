use std::fs;
use std::path::Path;

use anyhow::Result;

use util::PathEncodingError;

use super::Error;

/// Copy `src` to `tgt`, recursively if needed.
/// Symlinks are followed, so the copy never points back at the source tree.
pub fn copy(src: &Path, tgt: &Path) -> Result<()> {
    if src.is_file() {
        fs::copy(src, tgt)?;
    } else if src.is_dir() {
        cp_dir(src, tgt)?;
    } else {
        return Err(
            Error::UnknownPathType(src.to_str().ok_or(PathEncodingError)?.to_owned()).into(),
        );
    }
    Ok(())
}

fn cp_dir(src: &Path, tgt: &Path) -> Result<()> {
    fs::create_dir_all(tgt)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_entry = entry.path();
        let tgt_entry = tgt.join(entry.file_name());
        // metadata() follows links, unlike entry.file_type():
        let meta = fs::metadata(&src_entry)?;
        if meta.is_dir() {
            cp_dir(&src_entry, &tgt_entry)?;
        } else if meta.is_file() {
            fs::copy(&src_entry, &tgt_entry)?;
        } else {
            return Err(Error::UnknownPathType(
                src_entry.to_str().ok_or(PathEncodingError)?.to_owned(),
            )
            .into());
        }
    }
    Ok(())
}
