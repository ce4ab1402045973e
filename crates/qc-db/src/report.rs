use crate::{
    aggregate::{
        self, DashboardStats, FpyWindow, MonthlySeries, ShipmentWithUnits, WeekRange,
        WeeklyFpyReport, WeeklyUnit,
    },
    filter::{self, ShipmentFilter},
    models::{Shipment, ShippedUnit, UnitOutcome},
    schema::qc::{shipments, shipped_units},
    Error, Store,
};
use diesel::prelude::*;
use diesel_async::{scoped_futures::ScopedFutureExt, AsyncConnection, AsyncPgConnection, RunQueryDsl};
use jiff::civil::Date;

#[derive(Clone, Debug, serde::Serialize)]
pub struct WeeklyShipments {
    pub shipments: Vec<ShipmentWithUnits>,
    pub date_range: WeekRange,
}

pub(crate) async fn dashboard_stats(
    conn: &mut AsyncPgConnection,
    filter: &ShipmentFilter,
) -> Result<DashboardStats, Error> {
    let ids = filter::matching_shipment_ids(conn, filter).await?;
    let total_shipments = ids.len();
    let units = shipped_units::table
        .filter(shipped_units::shipment_id.eq_any(ids))
        .select(UnitOutcome::as_select())
        .load(conn)
        .await?;
    Ok(aggregate::dashboard_stats(
        total_shipments,
        &units,
        filter.search_term(),
    ))
}

pub(crate) async fn stats_over_time(
    conn: &mut AsyncPgConnection,
    filter: &ShipmentFilter,
) -> Result<MonthlySeries, Error> {
    let ids = filter::matching_shipment_ids(conn, filter).await?;
    let unit_ids = filter::matching_unit_ids(conn, ids, filter).await?;
    let outcomes = shipped_units::table
        .inner_join(shipments::table)
        .filter(shipped_units::unit_id.eq_any(unit_ids))
        .select((shipments::shipping_date, shipped_units::first_test_pass))
        .load::<(jiff_diesel::Date, bool)>(conn)
        .await?;
    Ok(aggregate::monthly_series(
        outcomes
            .into_iter()
            .map(|(shipping_date, passed)| (shipping_date.to_jiff(), passed)),
    ))
}

pub(crate) async fn weekly_fpy(
    conn: &mut AsyncPgConnection,
    window: FpyWindow,
) -> Result<WeeklyFpyReport, Error> {
    let units = shipped_units::table
        .inner_join(shipments::table)
        .filter(shipments::shipping_date.ge(jiff_diesel::Date::from(window.first_day())))
        .filter(shipments::shipping_date.le(jiff_diesel::Date::from(window.last_day())))
        .order((shipments::shipping_date, shipped_units::unit_id))
        .select((
            shipments::shipping_date,
            shipped_units::part_number,
            shipped_units::model_type,
            shipped_units::first_test_pass,
        ))
        .load::<(jiff_diesel::Date, String, String, bool)>(conn)
        .await?
        .into_iter()
        .map(
            |(shipping_date, part_number, model_type, first_test_pass)| WeeklyUnit {
                shipping_date: shipping_date.to_jiff(),
                part_number,
                model_type,
                first_test_pass,
            },
        )
        .collect::<Vec<_>>();
    Ok(aggregate::weekly_fpy(&window, &units))
}

/// Loads the given shipments in order, each paired with its units sorted by model
/// type and part number.
async fn shipments_with_units(
    conn: &mut AsyncPgConnection,
    shipments: Vec<Shipment>,
) -> Result<Vec<(Shipment, Vec<ShippedUnit>)>, Error> {
    let units = ShippedUnit::belonging_to(&shipments)
        .order((
            shipped_units::model_type,
            shipped_units::part_number,
            shipped_units::unit_id,
        ))
        .select(ShippedUnit::as_select())
        .load(conn)
        .await?;
    let grouped = units.grouped_by(&shipments);
    Ok(shipments.into_iter().zip(grouped).collect())
}

pub(crate) async fn manifest(
    conn: &mut AsyncPgConnection,
    filter: &ShipmentFilter,
) -> Result<Vec<ShipmentWithUnits>, Error> {
    let ids = filter::matching_shipment_ids(conn, filter).await?;
    let shipments = shipments::table
        .filter(shipments::id.eq_any(ids))
        .order((shipments::shipping_date.desc(), shipments::id.desc()))
        .select(Shipment::as_select())
        .load(conn)
        .await?;
    let search = filter.search_term();
    Ok(shipments_with_units(conn, shipments)
        .await?
        .into_iter()
        .map(|(shipment, units)| {
            let units = aggregate::manifest_units(&shipment, units, search);
            ShipmentWithUnits::new(shipment, units)
        })
        .collect())
}

pub(crate) async fn weekly_shipments(
    conn: &mut AsyncPgConnection,
    date: Date,
) -> Result<WeeklyShipments, Error> {
    let date_range = WeekRange::containing(date);
    let shipments = shipments::table
        .filter(shipments::shipping_date.ge(jiff_diesel::Date::from(date_range.start)))
        .filter(shipments::shipping_date.le(jiff_diesel::Date::from(date_range.end)))
        .order((shipments::shipping_date, shipments::id))
        .select(Shipment::as_select())
        .load(conn)
        .await?;
    let shipments = shipments_with_units(conn, shipments)
        .await?
        .into_iter()
        .map(|(shipment, units)| ShipmentWithUnits::new(shipment, units))
        .collect();
    Ok(WeeklyShipments {
        shipments,
        date_range,
    })
}

impl Store {
    #[tracing::instrument(skip(self))]
    pub async fn dashboard_stats(&self, filter: &ShipmentFilter) -> Result<DashboardStats, Error> {
        let mut conn = self.connection().await?;
        conn.transaction(|conn| dashboard_stats(conn, filter).scope_boxed())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn stats_over_time(&self, filter: &ShipmentFilter) -> Result<MonthlySeries, Error> {
        let mut conn = self.connection().await?;
        conn.transaction(|conn| stats_over_time(conn, filter).scope_boxed())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn weekly_fpy(&self, window: FpyWindow) -> Result<WeeklyFpyReport, Error> {
        let mut conn = self.connection().await?;
        weekly_fpy(&mut conn, window).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn manifest(&self, filter: &ShipmentFilter) -> Result<Vec<ShipmentWithUnits>, Error> {
        let mut conn = self.connection().await?;
        conn.transaction(|conn| manifest(conn, filter).scope_boxed())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn weekly_shipments(&self, date: Date) -> Result<WeeklyShipments, Error> {
        let mut conn = self.connection().await?;
        conn.transaction(|conn| weekly_shipments(conn, date).scope_boxed())
            .await
    }
}
