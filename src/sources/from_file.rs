use super::{SourceGenerator, launch_photon};
use crate::core::error::{Error, Result};
use crate::core::database::PhotonDatabaseReader;
use crate::core::photon::{Photon, PhotonExitRecord};
use crate::core::rng::Rng;
use crate::core::tissue::TissueModel;
use parking_lot::Mutex;
use std::fmt;
use std::path::PathBuf;

/// Replays the records of a photon database as launch states, e.g. exit
/// states computed by an external ray tracer. Photons start with unit
/// weight. Photon `i` of a run launches from record `i % record_count`;
/// sequential draws start over from the first record once they run out.
pub struct FromFileSource {
    path: PathBuf,
    record_count: u64,
    reader: Mutex<PhotonDatabaseReader>
}

impl FromFileSource {
    pub fn open(path: PathBuf) -> Result<FromFileSource> {
        let reader = PhotonDatabaseReader::open(&path)?;
        if reader.info().record_count == 0 {
            return Err(Error::Config(format!("source database {} holds no records", path.display())));
        }
        Ok(FromFileSource {
            path,
            record_count: reader.info().record_count,
            reader: Mutex::new(reader)
        })
    }

    fn next_record(&self) -> Result<PhotonExitRecord> {
        let mut reader = self.reader.lock();
        if let Some(record) = reader.next() {
            return record;
        }
        warn!("Source database {} exhausted, starting over", self.path.display());
        *reader = PhotonDatabaseReader::open(&self.path)?;
        match reader.next() {
            Some(record) => record,
            None => Err(Error::DatabaseFormat(format!("{} holds no records", self.path.display())))
        }
    }
}

impl fmt::Debug for FromFileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromFileSource").field("path", &self.path).finish()
    }
}

impl SourceGenerator for FromFileSource {
    fn get_next_photon(&self, tissue: &TissueModel, _rng: &mut Rng) -> Result<Photon> {
        let record = self.next_record()?;
        launch_photon(tissue, record.position, record.direction.normalize())
    }

    fn get_photon(&self, tissue: &TissueModel, index: u64, _rng: &mut Rng) -> Result<Photon> {
        let record = self.reader.lock().read_at(index % self.record_count)?;
        launch_photon(tissue, record.position, record.direction.normalize())
    }
}
