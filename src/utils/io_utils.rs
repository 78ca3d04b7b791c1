use crate::utils::Result;
use std::{fs::File, io::BufWriter};

pub fn create_writer<T, F>(output_prefix: &str, output_suffix: &str, f: F) -> Result<T>
where
    F: FnOnce(&str) -> Result<T>,
{
    let output_path = format!("{}.{}", output_prefix, output_suffix);
    f(&output_path)
}

pub fn open_report_file(path: &str) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| format!("Unable to open {}: {}", path, e))?;
    Ok(BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn create_writer_joins_prefix_and_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("out");
        let prefix = prefix.to_str().unwrap();
        let mut writer = create_writer(prefix, "hwe", open_report_file).unwrap();
        writeln!(writer, "hello").unwrap();
        drop(writer);
        let content = std::fs::read_to_string(format!("{}.hwe", prefix)).unwrap();
        assert_eq!(content, "hello\n");
    }
}
