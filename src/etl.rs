pub mod overpass;
pub mod overture;

use std::path::{Path, PathBuf};
use log::{info, error};

use crate::errors::Result;

/// One download job: pull data from a remote source, reshape it, write it
/// under the output directory.
pub trait Etl {
    type Input;
    type Output;

    fn etl_name(&self) -> &str;

    fn output_path(&self, dir: &Path) -> PathBuf;

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        Ok(self.output_path(dir).try_exists()?)
    }

    fn extract(&mut self, dir: &Path) -> Result<Self::Input>;
    fn transform(&mut self, input: Self::Input) -> Result<Self::Output>;
    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()>;

    /// Run all three stages. An existing output is kept unless `overwrite`
    /// is set; nothing is written when any stage fails.
    fn process(&mut self, dir: &Path, overwrite: bool) -> Result<()> {
        info!(etl_name = self.etl_name(); "Starting ETL process");
        if !overwrite && self.is_cached(dir)? {
            info!(etl_name = self.etl_name(); "Using cached value");
        } else {
            info!(etl_name = self.etl_name(); "Extracting");
            let input = match self.extract(dir) {
                Ok(input) => Ok(input),
                Err(err) => {
                    error!(etl_name = self.etl_name(), err = err.message.as_str(); "Extraction failed with error");
                    Err(err)
                },
            }?;

            info!(etl_name = self.etl_name(); "Transforming");
            let output = match self.transform(input) {
                Ok(output) => Ok(output),
                Err(err) if err.is_empty_result() => {
                    info!(etl_name = self.etl_name(); "No valid geometries found");
                    Err(err)
                },
                Err(err) => {
                    error!(etl_name = self.etl_name(), err = err.message.as_str(); "Transformation failed with error");
                    Err(err)
                },
            }?;

            info!(etl_name = self.etl_name(); "Loading");
            match self.load(dir, output) {
                Ok(_) => Ok(()),
                Err(err) => {
                    error!(etl_name = self.etl_name(), err = err.message.as_str(); "Loading failed with error");
                    Err(err)
                },
            }?;
            let output_path = self.output_path(dir);
            info!(etl_name = self.etl_name(), path = output_path.display().to_string(); "Saved data");
        }
        info!(etl_name = self.etl_name(); "Process finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{Error, ErrorKind};
    use std::fs;

    /// Writes its input string to `out.txt`, or fails in the chosen stage.
    struct Echo {
        input: Option<Error>,
        transformed: bool,
    }

    impl Etl for Echo {
        type Input = String;
        type Output = String;

        fn etl_name(&self) -> &str {
            "echo"
        }

        fn output_path(&self, dir: &Path) -> PathBuf {
            dir.join("out.txt")
        }

        fn extract(&mut self, _dir: &Path) -> Result<String> {
            match self.input.take() {
                Some(err) => Err(err),
                None => Ok("fresh".to_string()),
            }
        }

        fn transform(&mut self, input: String) -> Result<String> {
            self.transformed = true;
            Ok(input)
        }

        fn load(&mut self, dir: &Path, output: String) -> Result<()> {
            Ok(fs::write(self.output_path(dir), output)?)
        }
    }

    #[test]
    fn process_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut etl = Echo { input: None, transformed: false };
        etl.process(dir.path(), true).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("out.txt")).unwrap(), "fresh");
    }

    #[test]
    fn cached_output_is_kept_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("out.txt"), "old").unwrap();
        let mut etl = Echo { input: None, transformed: false };
        etl.process(dir.path(), false).unwrap();
        assert!(!etl.transformed);
        assert_eq!(fs::read_to_string(dir.path().join("out.txt")).unwrap(), "old");
        assert!(etl.is_cached(dir.path()).unwrap());
    }

    #[test]
    fn failed_extract_leaves_existing_output_untouched() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("out.txt"), "old").unwrap();
        let mut etl = Echo {
            input: Some(Error::network("503 Service Unavailable")),
            transformed: false,
        };
        let err = etl.process(dir.path(), true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Network);
        assert!(!etl.transformed);
        assert_eq!(fs::read_to_string(dir.path().join("out.txt")).unwrap(), "old");
    }
}
