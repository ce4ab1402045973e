use crate::{
    models::{NewShippedUnit, UnitFields},
    schema::qc::shipped_units,
    Error, Store,
};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

pub(crate) async fn insert_unit(
    conn: &mut AsyncPgConnection,
    shipment_id: i32,
    fields: UnitFields,
) -> Result<i32, Error> {
    diesel::insert_into(shipped_units::table)
        .values(NewShippedUnit {
            shipment_id,
            fields: fields.normalized(),
        })
        .returning(shipped_units::unit_id)
        .get_result(conn)
        .await
        .map_err(Into::into)
}

pub(crate) async fn update_unit(
    conn: &mut AsyncPgConnection,
    unit_id: i32,
    fields: UnitFields,
) -> Result<(), Error> {
    match diesel::update(shipped_units::table.find(unit_id))
        .set(fields.normalized())
        .execute(conn)
        .await?
    {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

pub(crate) async fn delete_unit(conn: &mut AsyncPgConnection, unit_id: i32) -> Result<(), Error> {
    match diesel::delete(shipped_units::table.find(unit_id))
        .execute(conn)
        .await?
    {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

pub(crate) async fn is_serial_unique(
    conn: &mut AsyncPgConnection,
    serial_number: &str,
) -> Result<bool, Error> {
    let taken: bool = diesel::select(diesel::dsl::exists(
        shipped_units::table.filter(shipped_units::serial_number.eq(serial_number)),
    ))
    .get_result(conn)
    .await?;
    Ok(!taken)
}

pub(crate) async fn is_original_serial_unique(
    conn: &mut AsyncPgConnection,
    original_serial_number: &str,
) -> Result<bool, Error> {
    let taken: bool = diesel::select(diesel::dsl::exists(
        shipped_units::table
            .filter(shipped_units::original_serial_number.eq(original_serial_number)),
    ))
    .get_result(conn)
    .await?;
    Ok(!taken)
}

impl Store {
    #[tracing::instrument(skip(self))]
    pub async fn add_unit(&self, shipment_id: i32, fields: UnitFields) -> Result<i32, Error> {
        let mut conn = self.connection().await?;
        insert_unit(&mut conn, shipment_id, fields).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_unit(&self, unit_id: i32, fields: UnitFields) -> Result<(), Error> {
        let mut conn = self.connection().await?;
        update_unit(&mut conn, unit_id, fields).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_unit(&self, unit_id: i32) -> Result<(), Error> {
        let mut conn = self.connection().await?;
        delete_unit(&mut conn, unit_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn is_serial_unique(&self, serial_number: &str) -> Result<bool, Error> {
        let mut conn = self.connection().await?;
        is_serial_unique(&mut conn, serial_number).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn is_original_serial_unique(
        &self,
        original_serial_number: &str,
    ) -> Result<bool, Error> {
        let mut conn = self.connection().await?;
        is_original_serial_unique(&mut conn, original_serial_number).await
    }
}
