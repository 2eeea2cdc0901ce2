use crate::location::{GeoPoint, ZoneId};
use anyhow::Result;
use rusqlite::{named_params, params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Lookups the alert flows need from wherever cities and states are kept.
pub trait LocationRegistry {
    fn lookup_coordinates(&self, city: &str, state_code: &str) -> Result<Option<GeoPoint>>;
    fn lookup_state_code(&self, state_name: &str) -> Result<Option<String>>;
    fn lookup_zone(&self, city: &str) -> Result<Option<ZoneId>>;
}

pub struct Database {
    path: PathBuf,
    pub conn: Connection,
}

impl Database {
    pub fn from_path(path: PathBuf) -> Result<Database> {
        let connection = Connection::open(&path)?;
        Ok(Self {
            path,
            conn: connection,
        })
    }

    pub fn in_memory() -> Result<Database> {
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn init(&self) -> Result<()> {
        info!("creating database at {}", self.path.display());
        self.conn.execute_batch(include_str!("../sql/schema.sql"))?;
        Ok(())
    }

    /// Returns false if the state was already known.
    pub fn add_state(&self, code: &str, name: &str) -> Result<bool> {
        debug!("Inserting state {name} ({code}) into {}", self.path.display());
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO state (code, name) VALUES (:code, :name)",
            named_params! { ":code": code, ":name": name },
        )?;
        Ok(inserted > 0)
    }

    pub fn remove_state(&self, name: &str) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM state WHERE name = (?)", params![name])?;
        Ok(removed)
    }

    pub fn add_location(&self, city: &str, state_code: &str, point: GeoPoint) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO location (city, state_code, latitude, longitude)
             VALUES (:city, :state_code, :latitude, :longitude)",
            named_params! {
                ":city": city,
                ":state_code": state_code,
                ":latitude": point.latitude,
                ":longitude": point.longitude,
            },
        )?;
        Ok(inserted > 0)
    }

    pub fn add_county(&self, city: &str, zone: &ZoneId) -> Result<bool> {
        debug!("Mapping {city} to {zone} in {}", self.path.display());
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO county (city, zone_id) VALUES (:city, :zone_id)",
            named_params! { ":city": city, ":zone_id": zone.as_str() },
        )?;
        Ok(inserted > 0)
    }

    pub fn remove_county(&self, city: &str) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM county WHERE city = (?)", params![city])?;
        Ok(removed)
    }
}

impl LocationRegistry for Database {
    fn lookup_coordinates(&self, city: &str, state_code: &str) -> Result<Option<GeoPoint>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT latitude, longitude FROM location WHERE city = (?) AND state_code = (?)",
        )?;
        let point = stmt
            .query_row(params![city, state_code], |row| {
                Ok(GeoPoint::new(row.get(0)?, row.get(1)?))
            })
            .optional()?;
        Ok(point)
    }

    fn lookup_state_code(&self, state_name: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT code FROM state WHERE name = (?)")?;
        Ok(stmt
            .query_row(params![state_name], |row| row.get(0))
            .optional()?)
    }

    fn lookup_zone(&self, city: &str) -> Result<Option<ZoneId>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT zone_id FROM county WHERE city = (?)")?;
        let zone: Option<String> = stmt.query_row(params![city], |row| row.get(0)).optional()?;
        Ok(zone.map(ZoneId::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database() -> Database {
        let db = Database::in_memory().unwrap();
        db.init().unwrap();
        db
    }

    #[test]
    fn state_round_trip() {
        let db = database();
        assert!(db.add_state("IL", "Illinois").unwrap());
        assert!(!db.add_state("IL", "Illinois").unwrap());
        assert_eq!(db.lookup_state_code("Illinois").unwrap().as_deref(), Some("IL"));
        assert_eq!(db.remove_state("Illinois").unwrap(), 1);
        assert_eq!(db.lookup_state_code("Illinois").unwrap(), None);
        assert_eq!(db.remove_state("Illinois").unwrap(), 0);
    }

    #[test]
    fn coordinates_are_keyed_by_city_and_state() {
        let db = database();
        db.add_location("Peoria", "IL", GeoPoint::new(40.6936, -89.589)).unwrap();
        db.add_location("Peoria", "AZ", GeoPoint::new(33.5806, -112.2374)).unwrap();
        assert_eq!(
            db.lookup_coordinates("Peoria", "IL").unwrap(),
            Some(GeoPoint::new(40.6936, -89.589))
        );
        assert_eq!(
            db.lookup_coordinates("Peoria", "AZ").unwrap(),
            Some(GeoPoint::new(33.5806, -112.2374))
        );
        assert_eq!(db.lookup_coordinates("Peoria", "TX").unwrap(), None);
    }

    #[test]
    fn county_mapping_keeps_first_insert() {
        let db = database();
        assert!(db.add_county("Peoria", &ZoneId::new("ILC143")).unwrap());
        assert!(!db.add_county("Peoria", &ZoneId::new("ILC999")).unwrap());
        assert_eq!(db.lookup_zone("Peoria").unwrap(), Some(ZoneId::new("ILC143")));
        assert_eq!(db.remove_county("Peoria").unwrap(), 1);
        assert_eq!(db.lookup_zone("Peoria").unwrap(), None);
    }

    #[test]
    fn init_is_idempotent() {
        let db = database();
        db.init().unwrap();
    }
}
