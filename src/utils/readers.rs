use super::Result;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, Read as ioRead};
use std::path::Path;

pub fn open_text_reader(path: &Path) -> Result<BufReader<Box<dyn ioRead>>> {
    fn is_gzipped(path: &Path) -> bool {
        let path_str = path.to_string_lossy().to_lowercase();
        path_str.ends_with(".gz") || path_str.ends_with(".gzip")
    }
    let file = File::open(path).map_err(|e| format!("File {}: {}", path.display(), e))?;
    if is_gzipped(path) {
        let gz_decoder = MultiGzDecoder::new(file);
        if gz_decoder.header().is_some() {
            Ok(BufReader::new(Box::new(gz_decoder)))
        } else {
            Err(format!("Invalid gzip header: {}", path.to_string_lossy()))
        }
    } else {
        Ok(BufReader::new(Box::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::{BufRead, Write};

    #[test]
    fn open_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.ped");
        std::fs::write(&path, "1 1 0 0 1\n").unwrap();
        let reader = open_text_reader(&path).unwrap();
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["1 1 0 0 1".to_string()]);
    }

    #[test]
    fn open_gzipped_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.ped.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"1 1 0 0 1\n1 2 0 0 2\n").unwrap();
        encoder.finish().unwrap();
        let reader = open_text_reader(&path).unwrap();
        assert_eq!(reader.lines().count(), 2);
    }

    #[test]
    fn open_missing_file_err() {
        let result = open_text_reader(Path::new("/definitely/not/here.ped"));
        assert!(result.is_err());
    }
}
