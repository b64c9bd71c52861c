//! Append-only binary store of photon exit records.
//!
//! A database is a file of fixed width little-endian records plus a sidecar
//! text file `<database>.txt` describing the record layout:
//!
//! ```text
//! virtual_boundary = DiffuseReflectance
//! region_count = 3
//! collision_info = true
//! record_count = 1024
//! ```
//!
//! Each record holds the exit position and direction (3 x f64 each), the
//! weight and total time of flight (f64), followed, when `collision_info` is
//! set, by `region_count` path lengths (f64) and `region_count` collision
//! counts (u64).

use super::mc::Float;
use super::error::{Error, Result};
use super::geometry::{Point3f, Vector3f};
use super::photon::{PhotonExitRecord, PhotonHistory};
use super::virtual_boundary::VirtualBoundaryType;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use nom::{
    IResult,
    bytes::complete::{take_while1, take_till},
    character::complete::{char, multispace0, not_line_ending, space0},
    combinator::{all_consuming, opt},
    error::VerboseError,
    multi::many0,
    sequence::{delimited, preceded, separated_pair, terminated}
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const FIXED_RECORD_SIZE: u64 = 8 * 8;

/// Layout of a database, stored in its sidecar.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseInfo {
    pub virtual_boundary: VirtualBoundaryType,
    pub region_count: usize,
    pub collision_info: bool,
    pub record_count: u64
}

impl DatabaseInfo {
    pub fn new(virtual_boundary: VirtualBoundaryType, region_count: usize, collision_info: bool) -> DatabaseInfo {
        DatabaseInfo {
            virtual_boundary,
            region_count,
            collision_info,
            record_count: 0
        }
    }

    /// Size in bytes of one record.
    pub fn record_size(&self) -> Result<u64> {
        if !self.collision_info {
            return Ok(FIXED_RECORD_SIZE);
        }
        (self.region_count as u64).checked_mul(16)
            .and_then(|history| history.checked_add(FIXED_RECORD_SIZE))
            .ok_or_else(|| Error::DatabaseFormat(format!("region_count {} is too large", self.region_count)))
    }

    /// Size in bytes of the whole database file.
    pub fn file_size(&self) -> Result<u64> {
        self.record_count.checked_mul(self.record_size()?)
            .ok_or_else(|| Error::DatabaseFormat(format!(
                "{} records of {} regions overflow the file size", self.record_count, self.region_count)))
    }

    pub fn to_sidecar(&self) -> String {
        format!("virtual_boundary = {}\nregion_count = {}\ncollision_info = {}\nrecord_count = {}\n",
            self.virtual_boundary, self.region_count, self.collision_info, self.record_count)
    }

    pub fn parse_sidecar(text: &str) -> Result<DatabaseInfo> {
        let entries = match parse_entries(text) {
            Ok((_, entries)) => entries,
            Err(e) => return Err(Error::DatabaseFormat(format!("malformed sidecar: {:?}", e)))
        };
        let collision_info = match lookup(&entries, "collision_info")? {
            "true" => true,
            "false" => false,
            v => return Err(Error::DatabaseFormat(format!("invalid collision_info '{}'", v)))
        };
        Ok(DatabaseInfo {
            virtual_boundary: lookup(&entries, "virtual_boundary")?.parse()?,
            region_count: number(&entries, "region_count")? as usize,
            collision_info,
            record_count: number(&entries, "record_count")?
        })
    }
}

fn lookup<'a>(entries: &[(&'a str, &'a str)], key: &str) -> Result<&'a str> {
    entries.iter()
        .rev()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .ok_or_else(|| Error::DatabaseFormat(format!("sidecar is missing '{}'", key)))
}

fn number(entries: &[(&str, &str)], key: &str) -> Result<u64> {
    let v = lookup(entries, key)?;
    v.parse::<u64>().map_err(|_| Error::DatabaseFormat(format!("invalid {} '{}'", key, v)))
}

type ParseResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

fn parse_comment(i: &str) -> ParseResult<&str> {
    preceded(char('#'), not_line_ending)(i)
}

fn parse_key(i: &str) -> ParseResult<&str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(i)
}

fn parse_value(i: &str) -> ParseResult<&str> {
    take_till(|c| c == '\n' || c == '\r' || c == '#')(i)
}

fn parse_entry(i: &str) -> ParseResult<(&str, &str)> {
    let (i, (key, value)) = separated_pair(parse_key, delimited(space0, char('='), space0), parse_value)(i)?;
    Ok((i, (key, value.trim_end())))
}

fn ws_and_comment(i: &str) -> ParseResult<Vec<&str>> {
    preceded(multispace0, many0(terminated(parse_comment, multispace0)))(i)
}

fn parse_entries(i: &str) -> ParseResult<Vec<(&str, &str)>> {
    all_consuming(preceded(
        ws_and_comment,
        many0(terminated(parse_entry, terminated(opt(parse_comment), ws_and_comment)))
    ))(i)
}

/// Path of the sidecar describing the database at `path`.
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".txt");
    PathBuf::from(name)
}

/// Conventional file name of the database recorded on a boundary.
pub fn database_file_name(boundary: VirtualBoundaryType) -> String {
    format!("{}Database", boundary)
}

/// Sequential record writer. Records are flushed and the sidecar written on
/// [close](PhotonDatabaseWriter::close), or on drop if the writer is
/// abandoned, e.g. while unwinding from an error.
pub struct PhotonDatabaseWriter {
    path: PathBuf,
    info: DatabaseInfo,
    writer: BufWriter<File>,
    closed: bool
}

impl PhotonDatabaseWriter {
    pub fn create<P: AsRef<Path>>(
        path: P,
        virtual_boundary: VirtualBoundaryType,
        region_count: usize,
        collision_info: bool
    ) -> Result<PhotonDatabaseWriter> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        debug!("Creating photon database {}", path.display());
        Ok(PhotonDatabaseWriter {
            path,
            info: DatabaseInfo::new(virtual_boundary, region_count, collision_info),
            writer: BufWriter::new(file),
            closed: false
        })
    }

    pub fn info(&self) -> &DatabaseInfo {
        &self.info
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&mut self, record: &PhotonExitRecord) -> Result<()> {
        let history = match (self.info.collision_info, record.history.as_ref()) {
            (false, _) => None,
            (true, Some(h)) if h.region_count() == self.info.region_count => Some(h),
            (true, _) => return Err(Error::DatabaseFormat(format!(
                "record lacks collision info for {} regions", self.info.region_count)))
        };
        let w = &mut self.writer;
        for v in &[record.position.x, record.position.y, record.position.z,
                   record.direction.x, record.direction.y, record.direction.z,
                   record.weight, record.total_time] {
            w.write_f64::<LittleEndian>(*v)?;
        }
        if let Some(history) = history {
            for l in history.path_lengths.iter() {
                w.write_f64::<LittleEndian>(*l)?;
            }
            for c in history.collision_counts.iter() {
                w.write_u64::<LittleEndian>(*c)?;
            }
        }
        self.info.record_count += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.closed = true;
        self.writer.flush()?;
        std::fs::write(sidecar_path(&self.path), self.info.to_sidecar())?;
        Ok(())
    }

    /// Flush the records and write the sidecar.
    pub fn close(mut self) -> Result<DatabaseInfo> {
        self.finish()?;
        debug!("Closed photon database {} with {} records", self.path.display(), self.info.record_count);
        Ok(self.info.clone())
    }
}

impl Drop for PhotonDatabaseWriter {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.finish() {
                error!("Unable to finish photon database {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Lazy reader over the records of a database. Iterates forward and can
/// jump to any record with [PhotonDatabaseReader::read_at].
pub struct PhotonDatabaseReader {
    path: PathBuf,
    info: DatabaseInfo,
    record_size: u64,
    reader: BufReader<File>,
    remaining: u64
}

impl PhotonDatabaseReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<PhotonDatabaseReader> {
        let path = path.as_ref().to_path_buf();
        let info = DatabaseInfo::parse_sidecar(&std::fs::read_to_string(sidecar_path(&path))?)?;
        let file = File::open(&path)?;
        // Checked before any record buffer is sized from region_count.
        let record_size = info.record_size()?;
        let expected = info.file_size()?;
        let actual = file.metadata()?.len();
        if actual != expected {
            error!("Photon database {} is {} bytes, sidecar implies {}", path.display(), actual, expected);
            return Err(Error::DatabaseFormat(format!(
                "{} holds {} bytes but {} records of {} bytes are declared",
                path.display(), actual, info.record_count, record_size)));
        }
        Ok(PhotonDatabaseReader {
            path,
            remaining: info.record_count,
            info,
            record_size,
            reader: BufReader::new(file)
        })
    }

    /// Read record `index`. Iteration continues with the record after it.
    pub fn read_at(&mut self, index: u64) -> Result<PhotonExitRecord> {
        if index >= self.info.record_count {
            return Err(Error::DatabaseFormat(format!(
                "record {} requested from {} holding {}", index, self.path.display(), self.info.record_count)));
        }
        self.reader.seek(SeekFrom::Start(index * self.record_size))?;
        self.remaining = self.info.record_count - index - 1;
        self.read_record()
    }

    pub fn info(&self) -> &DatabaseInfo {
        &self.info
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_record(&mut self) -> Result<PhotonExitRecord> {
        let r = &mut self.reader;
        let mut v = [0.0 as Float; 8];
        r.read_f64_into::<LittleEndian>(&mut v)?;
        let history = if self.info.collision_info {
            let mut history = PhotonHistory::new(self.info.region_count);
            r.read_f64_into::<LittleEndian>(&mut history.path_lengths[..])?;
            r.read_u64_into::<LittleEndian>(&mut history.collision_counts[..])?;
            Some(history)
        } else {
            None
        };
        Ok(PhotonExitRecord {
            position: Point3f::new(v[0], v[1], v[2]),
            direction: Vector3f::new(v[3], v[4], v[5]),
            weight: v[6],
            total_time: v[7],
            history
        })
    }
}

impl Iterator for PhotonDatabaseReader {
    type Item = Result<PhotonExitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let record = self.read_record();
        if record.is_err() {
            self.remaining = 0;
        }
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(i: u64, regions: Option<usize>) -> PhotonExitRecord {
        let f = i as Float;
        PhotonExitRecord {
            position: Point3f::new(f, -f, 0.0),
            direction: Vector3f::new(0.0, 0.6, -0.8),
            weight: 1.0 / (f + 1.0),
            total_time: 0.01 * f,
            history: regions.map(|n| {
                let mut h = PhotonHistory::new(n);
                h.path_lengths[1] = 2.5 * f;
                h.collision_counts[1] = i * 3;
                h
            })
        }
    }

    #[test]
    fn sidecar_parsing() {
        let info = DatabaseInfo {
            virtual_boundary: VirtualBoundaryType::DiffuseTransmittance,
            region_count: 4,
            collision_info: true,
            record_count: 12
        };
        assert_eq!(DatabaseInfo::parse_sidecar(&info.to_sidecar()).unwrap(), info);
        let text = "# written by hand\n\nvirtual_boundary=DiffuseReflectance  \nregion_count = 3 # layers\ncollision_info = false\r\nrecord_count = 0";
        let parsed = DatabaseInfo::parse_sidecar(text).unwrap();
        assert_eq!(parsed.virtual_boundary, VirtualBoundaryType::DiffuseReflectance);
        assert_eq!(parsed.region_count, 3);
        assert!(!parsed.collision_info);
        assert!(DatabaseInfo::parse_sidecar("region_count = 3\n").is_err());
        assert!(DatabaseInfo::parse_sidecar("region_count = three\nvirtual_boundary = DiffuseReflectance\ncollision_info = true\nrecord_count = 1").is_err());
        assert!(DatabaseInfo::parse_sidecar("= 3\n").is_err());
    }

    #[test]
    fn round_trip_with_collision_info() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db");
        let mut writer = PhotonDatabaseWriter::create(&path, VirtualBoundaryType::DiffuseReflectance, 3, true).unwrap();
        let written: Vec<_> = (0..5).map(|i| record(i, Some(3))).collect();
        for r in &written {
            writer.write(r).unwrap();
        }
        let info = writer.close().unwrap();
        assert_eq!(info.record_count, 5);

        let reader = PhotonDatabaseReader::open(&path).unwrap();
        assert_eq!(reader.info().region_count, 3);
        let read: Vec<_> = reader.collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(read, written);
    }

    #[test]
    fn drop_flushes_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db");
        {
            let mut writer = PhotonDatabaseWriter::create(&path, VirtualBoundaryType::SpecularReflectance, 2, false).unwrap();
            writer.write(&record(1, None)).unwrap();
            writer.write(&record(2, Some(2))).unwrap();
        }
        let read: Vec<_> = PhotonDatabaseReader::open(&path).unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0], record(1, None));
        assert!(read[1].history.is_none());
    }

    #[test]
    fn missing_history_is_rejected() {
        let dir = tempdir().unwrap();
        let mut writer = PhotonDatabaseWriter::create(dir.path().join("db"), VirtualBoundaryType::DiffuseReflectance, 3, true).unwrap();
        assert!(writer.write(&record(0, None)).is_err());
        assert!(writer.write(&record(0, Some(2))).is_err());
    }

    #[test]
    fn truncated_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db");
        let mut writer = PhotonDatabaseWriter::create(&path, VirtualBoundaryType::DiffuseReflectance, 1, false).unwrap();
        writer.write(&record(0, None)).unwrap();
        writer.write(&record(1, None)).unwrap();
        writer.close().unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();
        match PhotonDatabaseReader::open(&path) {
            Err(Error::DatabaseFormat(_)) => {}
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("truncated database opened")
        }
    }

    fn expect_format_error(path: &Path) {
        match PhotonDatabaseReader::open(path) {
            Err(Error::DatabaseFormat(_)) => {}
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("corrupt database opened")
        }
    }

    #[test]
    fn oversized_region_count_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db");
        std::fs::write(&path, vec![0u8; 80]).unwrap();
        let sidecar = |regions: u64, records: u64| format!(
            "virtual_boundary = DiffuseReflectance\nregion_count = {}\ncollision_info = true\nrecord_count = {}\n",
            regions, records);

        std::fs::write(sidecar_path(&path), sidecar(4611686018427387904, 1)).unwrap();
        expect_format_error(&path);
        // Record size fits, the file size does not.
        std::fs::write(sidecar_path(&path), sidecar(1 << 59, 2)).unwrap();
        expect_format_error(&path);
        std::fs::write(sidecar_path(&path), sidecar(1 << 40, 1)).unwrap();
        expect_format_error(&path);

        std::fs::write(sidecar_path(&path), sidecar(1, 1)).unwrap();
        let mut reader = PhotonDatabaseReader::open(&path).unwrap();
        assert_eq!(reader.next().unwrap().unwrap().history.unwrap().region_count(), 1);
    }

    #[test]
    fn records_can_be_read_out_of_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db");
        let mut writer = PhotonDatabaseWriter::create(&path, VirtualBoundaryType::DiffuseReflectance, 2, true).unwrap();
        for i in 0..4 {
            writer.write(&record(i, Some(2))).unwrap();
        }
        writer.close().unwrap();

        let mut reader = PhotonDatabaseReader::open(&path).unwrap();
        assert_eq!(reader.read_at(2).unwrap(), record(2, Some(2)));
        assert_eq!(reader.read_at(0).unwrap(), record(0, Some(2)));
        assert_eq!(reader.next().unwrap().unwrap(), record(1, Some(2)));
        assert_eq!(reader.read_at(3).unwrap(), record(3, Some(2)));
        assert!(reader.next().is_none());
        assert!(reader.read_at(4).is_err());
    }
}
