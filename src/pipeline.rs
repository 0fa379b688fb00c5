//! Conversion pipeline
//!
//! Runs a whole conversion: the input container is unpacked into a private working
//! tree, the tree is converted in place, and the result is packed into the output
//! container. Stages run strictly one after another. The output is only written
//! once every file of the tree has been converted, so a failed conversion never
//! produces an archive.
//!
//! The working tree is a fresh temporary directory owned by a single run. It is
//! removed when the run ends, whatever the outcome. A failure to remove it is
//! logged and does not change the result of the run.
//!
//! ## Example
//! ```rust, no_run
//! # use epub_converter::{convert::ScriptConverter, pipeline::convert_archive};
//! # fn main() -> Result<(), epub_converter::error::EpubError> {
//! let converter = ScriptConverter::from_name("t2s")?;
//! convert_archive("book.epub", "book.simplified.epub", &converter)?;
//! # Ok(())
//! # }
//! ```

use std::{env, path::Path};

use log::{info, warn};
use tempfile::TempDir;

use crate::{
    archive,
    convert::TextConverter,
    error::{EpubError, Stage},
    transform,
};

const WORKING_TREE_PREFIX: &str = "epub-converter-";

/// Temporary directory holding the unpacked container of one run
///
/// The directory is removed when the value is dropped.
struct WorkingTree {
    dir: Option<TempDir>,
}

impl WorkingTree {
    fn new_in(parent: &Path) -> Result<Self, EpubError> {
        let dir = tempfile::Builder::new()
            .prefix(WORKING_TREE_PREFIX)
            .tempdir_in(parent)
            .map_err(|err| EpubError::filesystem(parent, err))?;

        Ok(Self { dir: Some(dir) })
    }

    fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }
}

impl Drop for WorkingTree {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(err) = dir.close() {
                warn!(
                    "Failed to remove working tree \"{}\": {}",
                    path.display(),
                    err
                );
            }
        }
    }
}

/// Converts an EPUB container into a new one
///
/// The working tree is created in the system temporary directory.
/// See [convert_archive_in].
pub fn convert_archive<P, Q, C>(input: P, output: Q, converter: &C) -> Result<(), EpubError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    C: TextConverter + ?Sized,
{
    convert_archive_in(input, output, env::temp_dir(), converter)
}

/// Converts an EPUB container into a new one, using a working tree below `work_root`
///
/// ## Parameters
/// - `input`: the container to read; it is never modified
/// - `output`: the container to create; missing parent directories are created
/// - `work_root`: the directory the temporary working tree is created in
/// - `converter`: applied to every markup file and to the convertible
///   package document fields
///
/// ## Return
/// - `Ok(())`: the output container has been written
/// - `Err(EpubError)`: a `StageFailed` error naming the stage that failed
pub fn convert_archive_in<P, Q, R, C>(
    input: P,
    output: Q,
    work_root: R,
    converter: &C,
) -> Result<(), EpubError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
    C: TextConverter + ?Sized,
{
    let input = input.as_ref();
    let output = output.as_ref();

    if !input.is_file() {
        return Err(EpubError::InputNotFound {
            path: input.display().to_string(),
        }
        .in_stage(Stage::Setup));
    }

    let tree = WorkingTree::new_in(work_root.as_ref()).map_err(|err| err.in_stage(Stage::Setup))?;
    info!(
        "Unpacking \"{}\" into \"{}\"",
        input.display(),
        tree.path().display()
    );

    archive::extract(input, tree.path()).map_err(|err| err.in_stage(Stage::Extract))?;

    let converted = transform::transform(tree.path(), converter)
        .map_err(|err| err.in_stage(Stage::Transform))?;
    info!("Converted {} file(s)", converted);

    archive::build(tree.path(), output).map_err(|err| err.in_stage(Stage::Build))?;
    info!("Wrote \"{}\"", output.display());

    Ok(())
}
