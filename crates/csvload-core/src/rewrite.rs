use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not parseable as CSV: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// One file rewritten into a COPY payload: data records only, header
/// dropped, comma delimited.
#[derive(Debug)]
pub struct CopyPayload {
    pub data: Vec<u8>,
    pub rows: usize,
}

/// Target table for a source file: the filename prefix before the first `.`.
pub fn table_name(file_name: &str) -> &str {
    match file_name.find('.') {
        Some(idx) => &file_name[..idx],
        None => file_name,
    }
}

/// Read `path` as CSV and re-serialize its data records without the
/// header. Records are kept as raw bytes; fields are re-quoted only where
/// the delimiter demands it.
pub fn rewrite_file(path: &Path) -> Result<CopyPayload, RewriteError> {
    let contents = std::fs::read(path).map_err(|source| RewriteError::Io {
        path: path.display().to_string(),
        source,
    })?;

    rewrite_records(&contents).map_err(|source| RewriteError::Csv {
        path: path.display().to_string(),
        source,
    })
}

fn rewrite_records(contents: &[u8]) -> Result<CopyPayload, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(contents);

    let mut data = Vec::new();
    let mut rows = 0usize;
    {
        let mut writer = csv::Writer::from_writer(&mut data);
        for record in reader.byte_records() {
            writer.write_byte_record(&record?)?;
            rows += 1;
        }
        writer.flush().map_err(csv::Error::from)?;
    }

    Ok(CopyPayload { data, rows })
}
