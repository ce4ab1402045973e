use diesel_async::{
    pooled_connection::{
        mobc::{Builder, Pool},
        AsyncDieselConnectionManager,
    },
    AsyncPgConnection,
};
use std::{fmt, time::Duration};

pub mod aggregate;
mod checklist;
pub mod filter;
mod model_number;
pub mod models;
mod report;
mod schema;
mod serde_jiff;
mod shipment;
#[cfg(test)]
mod tests;
pub mod types;
mod unit;
mod user;

pub use checklist::ChecklistEntry;
pub use model_number::ModelCatalog;
pub use report::WeeklyShipments;
pub use shipment::ShipmentDetails;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("getting connection from pool: {0}")]
    GetConnectionPool(#[from] mobc::Error<diesel_async::pooled_connection::PoolError>),
    #[error("result failure: {0}")]
    Result(diesel::result::Error),
    #[error("{0} already exists")]
    Conflict(UniqueField),
    #[error("referenced {0} does not exist")]
    MissingReference(Reference),
    #[error("invalid value: {0}")]
    InvalidValue(#[from] types::ParseError),
    #[error("Not Found")]
    NotFound,
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
                Error::Conflict(UniqueField::from_constraint(info.constraint_name()))
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, ref info) => {
                Error::MissingReference(Reference::from_constraint(info.constraint_name()))
            }
            DieselError::NotFound => Error::NotFound,
            err => Error::Result(err),
        }
    }
}

/// The unique column (or column set) a rejected insert or update collided with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniqueField {
    JobNumberAndDate,
    SerialNumber,
    OriginalSerialNumber,
    PartNumber,
    Username,
    Unknown,
}

impl UniqueField {
    fn from_constraint(constraint: Option<&str>) -> Self {
        match constraint {
            Some("shipments_job_number_shipping_date_key") => UniqueField::JobNumberAndDate,
            Some("shipped_units_serial_number_key") => UniqueField::SerialNumber,
            Some("shipped_units_original_serial_number_key") => UniqueField::OriginalSerialNumber,
            Some("model_numbers_part_number_key") => UniqueField::PartNumber,
            Some("users_username_key") => UniqueField::Username,
            _ => UniqueField::Unknown,
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UniqueField::JobNumberAndDate => "job number and shipping date",
            UniqueField::SerialNumber => "serial number",
            UniqueField::OriginalSerialNumber => "original serial number",
            UniqueField::PartNumber => "part number",
            UniqueField::Username => "username",
            UniqueField::Unknown => "unique value",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reference {
    Shipment,
    ChecklistItem,
    Unknown,
}

impl Reference {
    fn from_constraint(constraint: Option<&str>) -> Self {
        match constraint {
            Some("shipped_units_shipment_id_fkey")
            | Some("shipment_checklist_responses_shipment_id_fkey") => Reference::Shipment,
            Some("shipment_checklist_responses_item_id_fkey") => Reference::ChecklistItem,
            _ => Reference::Unknown,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Reference::Shipment => "shipment",
            Reference::ChecklistItem => "checklist item",
            Reference::Unknown => "record",
        })
    }
}

type Connection = mobc::Connection<AsyncDieselConnectionManager<AsyncPgConnection>>;

#[derive(Clone, Debug)]
pub struct Store {
    pool: Pool<AsyncPgConnection>,
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    db_url: String,
    max_open: u64,
    max_idle: u64,
    #[serde(with = "humantime_serde", default)]
    max_lifetime: Option<Duration>,
    #[serde(with = "humantime_serde", default)]
    max_idle_lifetime: Option<Duration>,
    #[serde(with = "humantime_serde")]
    timeout_for_get: Duration,
}

impl Config {
    pub fn set_db_url(&mut self, db_url: String) {
        self.db_url = db_url;
    }
}

/// Builds the pool and checks a connection can be made, so a bad database
/// configuration fails at startup instead of on the first request.
pub async fn create(config: &Config) -> Result<Store, Error> {
    let store = Store::new(config);
    drop(store.connection().await?);
    Ok(store)
}

fn create_pool(config: &Config) -> Pool<AsyncPgConnection> {
    let builder = Builder::new()
        .max_open(config.max_open)
        .max_idle(config.max_idle)
        .max_lifetime(
            config
                .max_lifetime
                .map(|v| v.max(Duration::from_secs(3600))),
        )
        .max_idle_lifetime(
            config
                .max_idle_lifetime
                .map(|v| v.max(Duration::from_secs(900))),
        )
        .get_timeout(Some(config.timeout_for_get.max(Duration::from_secs(5))));
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.db_url);
    builder.build(manager)
}

impl Store {
    /// A store whose connections are opened lazily on first use.
    pub fn new(config: &Config) -> Self {
        Self {
            pool: create_pool(config),
        }
    }

    async fn connection(&self) -> Result<Connection, Error> {
        self.pool.get().await.map_err(Into::into)
    }
}
