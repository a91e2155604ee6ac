use super::archive::{BatchKind, pack, write_entries};
use crate::domain::{SensorLogResult, Table};
use std::path::{Path, PathBuf};

pub trait BatchGenerator {
    fn kind(&self) -> BatchKind;

    fn generate(&self) -> SensorLogResult<Vec<Table>>;
}

/// Packaging for any batch generator: one zip, or one file per table.
pub trait BatchPackager {
    fn generate_archive(&self, prefix: &str) -> SensorLogResult<Vec<u8>>;

    fn generate_files(&self, dir: &Path, prefix: &str) -> SensorLogResult<Vec<PathBuf>>;
}

impl<T> BatchPackager for T
where
    T: BatchGenerator,
{
    fn generate_archive(&self, prefix: &str) -> SensorLogResult<Vec<u8>> {
        let tables = self.generate()?;
        pack(&tables, prefix, self.kind())
    }

    fn generate_files(&self, dir: &Path, prefix: &str) -> SensorLogResult<Vec<PathBuf>> {
        let tables = self.generate()?;
        write_entries(dir, &tables, prefix, self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::{BatchGenerator, BatchPackager};
    use crate::domain::{ErrorKind, SensorLogError, SensorLogResult, Table};
    use crate::modules::archive::BatchKind;
    use tempfile::TempDir;

    struct FailingGenerator;

    impl BatchGenerator for FailingGenerator {
        fn kind(&self) -> BatchKind {
            BatchKind::Decrement
        }

        fn generate(&self) -> SensorLogResult<Vec<Table>> {
            Err(SensorLogError::invalid_parameter(
                "INPUT.DECREMENT_STEP",
                "step must be positive",
            ))
        }
    }

    #[test]
    fn failed_generation_produces_no_archive() {
        let error = FailingGenerator
            .generate_archive("x")
            .expect_err("generator failure should propagate");
        assert_eq!(error.kind(), ErrorKind::InvalidParameter);
        assert_eq!(error.placeholder(), "INPUT.DECREMENT_STEP");
    }

    #[test]
    fn failed_generation_writes_no_files() {
        let temp = TempDir::new().expect("tempdir should be created");
        FailingGenerator
            .generate_files(temp.path(), "x")
            .expect_err("generator failure should propagate");
        let entries = std::fs::read_dir(temp.path()).expect("tempdir").count();
        assert_eq!(entries, 0);
    }
}
