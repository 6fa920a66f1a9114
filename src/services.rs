use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::domain::ServiceKey;
use crate::parser::parse_service_line;

/// Maps (protocol, port) to a service name. Built once, then only read.
#[derive(Debug, Clone, Default)]
pub struct ServiceDirectory {
    entries: BTreeMap<ServiceKey, String>,
}

impl ServiceDirectory {
    pub fn new() -> Self {
        ServiceDirectory {
            entries: BTreeMap::new(),
        }
    }

    /// Loads a `protocol,port,service_name` file. Only failing to open the
    /// file is fatal; bad lines are logged and skipped.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::ServicesOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let directory = Self::from_reader(BufReader::new(file))?;
        debug!(path = %path.display(), entries = directory.len(), "loaded service directory");
        Ok(directory)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut directory = ServiceDirectory::new();
        for (index, line) in reader.split(b'\n').enumerate() {
            let line = line?;
            let Ok(line) = std::str::from_utf8(&line) else {
                warn!(line_no = index + 1, "skipping services line that is not valid UTF-8");
                continue;
            };
            match parse_service_line(line) {
                None => {}
                Some(Ok((key, name))) => directory.insert(key, name),
                Some(Err(e)) => {
                    warn!(line_no = index + 1, "invalid line in services file ({e}): {line}")
                }
            }
        }
        Ok(directory)
    }

    /// Later inserts for the same key replace earlier ones.
    pub fn insert(&mut self, key: ServiceKey, name: String) {
        self.entries.insert(key, name);
    }

    pub fn lookup(&self, key: &ServiceKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ServiceKey, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Writes the directory back out in the format `load` reads. Fields are
    /// never quoted since `load` splits on bare commas.
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut out = csv::WriterBuilder::new()
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(writer);
        for (key, name) in self.iter() {
            let port = key.port.to_string();
            out.write_record([key.protocol.as_str(), port.as_str(), name])?;
        }
        out.flush()?;
        Ok(())
    }
}

impl FromIterator<(ServiceKey, String)> for ServiceDirectory {
    fn from_iter<I: IntoIterator<Item = (ServiceKey, String)>>(iter: I) -> Self {
        let mut directory = ServiceDirectory::new();
        for (key, name) in iter {
            directory.insert(key, name);
        }
        directory
    }
}
