use crate::{
    aggregate::{ModelCount, ShipmentPage, ShipmentSummary},
    checklist::{self, ChecklistEntry},
    filter::{self, Page, ShipmentFilter},
    models,
    schema::qc::{shipment_checklist_responses, shipments, shipped_units},
    types::ShipmentStatus,
    Error, Store,
};
use diesel::prelude::*;
use diesel_async::{scoped_futures::ScopedFutureExt, AsyncConnection, AsyncPgConnection, RunQueryDsl};
use itertools::Itertools;
use std::collections::HashMap;

#[derive(Clone, Debug, serde::Serialize)]
pub struct ShipmentDetails {
    #[serde(flatten)]
    pub shipment: models::Shipment,
    pub units: Vec<models::ShippedUnit>,
    pub checklist_items: Vec<ChecklistEntry>,
}

pub(crate) async fn insert_shipment(
    conn: &mut AsyncPgConnection,
    new_shipment: models::NewShipment,
) -> Result<i32, Error> {
    diesel::insert_into(shipments::table)
        .values(new_shipment)
        .returning(shipments::id)
        .get_result(conn)
        .await
        .map_err(Into::into)
}

pub(crate) async fn list_shipments(
    conn: &mut AsyncPgConnection,
    filter: &ShipmentFilter,
    page: Page,
) -> Result<ShipmentPage, Error> {
    let ids = filter::matching_shipment_ids(conn, filter).await?;
    let page_ids = ids
        .iter()
        .copied()
        .skip(page.offset())
        .take(page.limit as usize)
        .collect_vec();
    let page_shipments = shipments::table
        .filter(shipments::id.eq_any(page_ids.clone()))
        .order((shipments::shipping_date.desc(), shipments::id.desc()))
        .select(models::Shipment::as_select())
        .load(conn)
        .await?;
    let matching_units = filter::matching_unit_ids(conn, page_ids.clone(), filter).await?;
    let mut totals: HashMap<i32, i64> = shipped_units::table
        .filter(shipped_units::unit_id.eq_any(matching_units))
        .group_by(shipped_units::shipment_id)
        .select((
            shipped_units::shipment_id,
            diesel::dsl::count(shipped_units::unit_id),
        ))
        .load::<(i32, i64)>(conn)
        .await?
        .into_iter()
        .collect();
    let mut summaries: HashMap<i32, Vec<ModelCount>> = HashMap::new();
    for (shipment_id, model_type, count) in shipped_units::table
        .filter(shipped_units::shipment_id.eq_any(page_ids))
        .group_by((shipped_units::shipment_id, shipped_units::model_type))
        .order((shipped_units::shipment_id, shipped_units::model_type))
        .select((
            shipped_units::shipment_id,
            shipped_units::model_type,
            diesel::dsl::count(shipped_units::unit_id),
        ))
        .load::<(i32, String, i64)>(conn)
        .await?
    {
        summaries
            .entry(shipment_id)
            .or_default()
            .push(ModelCount { model_type, count });
    }
    let shipments = page_shipments
        .into_iter()
        .map(|shipment| {
            let shipped_units_summary = summaries.remove(&shipment.id).unwrap_or_default();
            ShipmentSummary {
                total_units: totals.remove(&shipment.id).unwrap_or_default(),
                shipment,
                shipped_units_summary,
            }
        })
        .collect();
    Ok(ShipmentPage {
        shipments,
        total_pages: page.total_pages(ids.len()),
        current_page: page.number,
    })
}

pub(crate) async fn load_shipment_details(
    conn: &mut AsyncPgConnection,
    shipment_id: i32,
) -> Result<Option<ShipmentDetails>, Error> {
    let shipment = match shipments::table
        .find(shipment_id)
        .select(models::Shipment::as_select())
        .first(conn)
        .await
    {
        Ok(shipment) => shipment,
        Err(diesel::result::Error::NotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let units = models::ShippedUnit::belonging_to(&shipment)
        .order(shipped_units::unit_id)
        .select(models::ShippedUnit::as_select())
        .load(conn)
        .await?;
    let checklist_items = checklist::checklist_for_shipment(conn, shipment_id).await?;
    Ok(Some(ShipmentDetails {
        shipment,
        units,
        checklist_items,
    }))
}

pub(crate) async fn set_shipment_status(
    conn: &mut AsyncPgConnection,
    shipment_id: i32,
    status: ShipmentStatus,
) -> Result<(), Error> {
    match diesel::update(shipments::table.find(shipment_id))
        .set(shipments::status.eq(status.as_str()))
        .execute(conn)
        .await
    {
        Ok(0) => Err(Error::NotFound),
        Ok(_) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Removes a shipment with its checklist responses and units. Either every row goes
/// or, on any failure, none do.
pub(crate) async fn delete_shipment(
    conn: &mut AsyncPgConnection,
    shipment_id: i32,
) -> Result<(), Error> {
    conn.transaction(|conn| {
        async move {
            diesel::delete(
                shipment_checklist_responses::table
                    .filter(shipment_checklist_responses::shipment_id.eq(shipment_id)),
            )
            .execute(conn)
            .await?;
            diesel::delete(shipped_units::table.filter(shipped_units::shipment_id.eq(shipment_id)))
                .execute(conn)
                .await?;
            match diesel::delete(shipments::table.find(shipment_id))
                .execute(conn)
                .await?
            {
                0 => Err(Error::NotFound),
                _ => Ok(()),
            }
        }
        .scope_boxed()
    })
    .await
}

impl Store {
    #[tracing::instrument(skip(self))]
    pub async fn create_shipment(&self, new_shipment: models::NewShipment) -> Result<i32, Error> {
        let mut conn = self.connection().await?;
        insert_shipment(&mut conn, new_shipment).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_shipments(
        &self,
        filter: &ShipmentFilter,
        page: Page,
    ) -> Result<ShipmentPage, Error> {
        let mut conn = self.connection().await?;
        conn.transaction(|conn| list_shipments(conn, filter, page).scope_boxed())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn load_shipment_details(
        &self,
        shipment_id: i32,
    ) -> Result<Option<ShipmentDetails>, Error> {
        let mut conn = self.connection().await?;
        conn.transaction(|conn| load_shipment_details(conn, shipment_id).scope_boxed())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_shipment_status(
        &self,
        shipment_id: i32,
        status: ShipmentStatus,
    ) -> Result<(), Error> {
        let mut conn = self.connection().await?;
        set_shipment_status(&mut conn, shipment_id, status).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_shipment(&self, shipment_id: i32) -> Result<(), Error> {
        let mut conn = self.connection().await?;
        delete_shipment(&mut conn, shipment_id).await
    }
}
