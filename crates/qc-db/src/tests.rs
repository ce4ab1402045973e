//! Store tests against a live PostgreSQL database with the migrations applied
//! (`diesel migration run`). Each test works inside a test transaction that is never
//! committed. Run with `cargo test -- --ignored`.

use crate::{
    checklist, filter, models, report, schema::qc, shipment, unit, Error, Reference,
    UniqueField,
};
use diesel::prelude::*;
use diesel_async::{scoped_futures::ScopedFutureExt, AsyncConnection, AsyncPgConnection, RunQueryDsl};
use dotenvy::dotenv;
use std::env;

pub async fn establish_connection() -> AsyncPgConnection {
    dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let mut conn = AsyncPgConnection::establish(&database_url)
        .await
        .unwrap_or_else(|_| panic!("Error connecting to {}", database_url));
    conn.begin_test_transaction()
        .await
        .expect("should begin a test transaction");
    conn
}

fn new_shipment(customer_name: &str, job_number: &str, day: i8) -> models::NewShipment {
    models::NewShipment {
        customer_name: customer_name.to_owned(),
        job_number: job_number.to_owned(),
        shipping_date: jiff::civil::date(2031, 5, day).into(),
        qc_name: "Robin".to_owned(),
    }
}

fn unit_fields(model_type: &str, part_number: &str, serial_number: &str) -> models::UnitFields {
    models::UnitFields {
        model_type: model_type.to_owned(),
        part_number: part_number.to_owned(),
        serial_number: serial_number.to_owned(),
        original_serial_number: Some(String::new()),
        first_test_pass: true,
        failed_equipment: Some("Hipot".to_owned()),
        retest_reason: None,
    }
}

async fn add_checklist_item(conn: &mut AsyncPgConnection, item_text: &str) -> i32 {
    diesel::insert_into(qc::checklist_master_items::table)
        .values((
            qc::checklist_master_items::item_text.eq(item_text),
            qc::checklist_master_items::item_order.eq(1),
        ))
        .returning(qc::checklist_master_items::item_id)
        .get_result(conn)
        .await
        .expect("should insert a checklist item")
}

fn response(shipment_id: i32, item_id: i32, status: &str) -> models::ChecklistResponse {
    models::ChecklistResponse {
        shipment_id,
        item_id,
        status: status.to_owned(),
        completed_by: "Robin".to_owned(),
        completion_date: jiff::civil::date(2031, 5, 6).into(),
        comments: None,
    }
}

mod shipments {
    use super::*;

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn it_rejects_a_second_shipment_with_the_same_job_number_and_date() {
        let mut conn = establish_connection().await;
        shipment::insert_shipment(&mut conn, new_shipment("ZZ Test Co", "ZZ-J-1", 5))
            .await
            .expect("first shipment should be created");
        let duplicate =
            shipment::insert_shipment(&mut conn, new_shipment("Other Co", "ZZ-J-1", 5)).await;
        assert!(
            matches!(duplicate, Err(Error::Conflict(UniqueField::JobNumberAndDate))),
            "should report the job number and date collision, got {duplicate:?}"
        );
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn it_deletes_the_shipment_units_and_responses_together() {
        let mut conn = establish_connection().await;
        let shipment_id =
            shipment::insert_shipment(&mut conn, new_shipment("ZZ Test Co", "ZZ-J-2", 6))
                .await
                .expect("shipment should be created");
        for serial in ["ZZ-S-1", "ZZ-S-2", "ZZ-S-3"] {
            unit::insert_unit(&mut conn, shipment_id, unit_fields("Widget", "ZZ-W-1", serial))
                .await
                .expect("unit should be added");
        }
        let item_id = add_checklist_item(&mut conn, "ZZ labels attached").await;
        checklist::save_response(&mut conn, response(shipment_id, item_id, "Passed"))
            .await
            .expect("response should be saved");

        shipment::delete_shipment(&mut conn, shipment_id)
            .await
            .expect("shipment should be deleted");

        let remaining_units: i64 = qc::shipped_units::table
            .filter(qc::shipped_units::shipment_id.eq(shipment_id))
            .count()
            .get_result(&mut conn)
            .await
            .expect("should count units");
        let remaining_responses: i64 = qc::shipment_checklist_responses::table
            .filter(qc::shipment_checklist_responses::shipment_id.eq(shipment_id))
            .count()
            .get_result(&mut conn)
            .await
            .expect("should count responses");
        assert_eq!(remaining_units, 0);
        assert_eq!(remaining_responses, 0);
        assert!(matches!(
            shipment::delete_shipment(&mut conn, shipment_id).await,
            Err(Error::NotFound)
        ));
        assert!(
            shipment::load_shipment_details(&mut conn, shipment_id)
                .await
                .expect("lookup should succeed")
                .is_none()
        );
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn it_leaves_everything_in_place_when_the_delete_fails() {
        let mut conn = establish_connection().await;
        diesel::sql_query(
            "CREATE FUNCTION qc.zz_refuse_delete() RETURNS trigger LANGUAGE plpgsql AS \
             $$ BEGIN RAISE EXCEPTION 'shipment deletes are blocked'; END $$",
        )
        .execute(&mut conn)
        .await
        .expect("should create the trigger function");
        diesel::sql_query(
            "CREATE TRIGGER zz_refuse_delete BEFORE DELETE ON qc.shipments \
             FOR EACH ROW EXECUTE FUNCTION qc.zz_refuse_delete()",
        )
        .execute(&mut conn)
        .await
        .expect("should create the trigger");

        let shipment_id =
            shipment::insert_shipment(&mut conn, new_shipment("ZZ Test Co", "ZZ-J-7", 11))
                .await
                .expect("shipment should be created");
        for serial in ["ZZ-S-11", "ZZ-S-12"] {
            unit::insert_unit(&mut conn, shipment_id, unit_fields("Widget", "ZZ-W-1", serial))
                .await
                .expect("unit should be added");
        }
        let item_id = add_checklist_item(&mut conn, "ZZ crate sealed").await;
        checklist::save_response(&mut conn, response(shipment_id, item_id, "Passed"))
            .await
            .expect("response should be saved");

        let deleted = shipment::delete_shipment(&mut conn, shipment_id).await;
        assert!(
            matches!(deleted, Err(Error::Result(_))),
            "the blocked shipment row should fail the delete, got {deleted:?}"
        );

        let remaining_units: i64 = qc::shipped_units::table
            .filter(qc::shipped_units::shipment_id.eq(shipment_id))
            .count()
            .get_result(&mut conn)
            .await
            .expect("should count units");
        let remaining_responses: i64 = qc::shipment_checklist_responses::table
            .filter(qc::shipment_checklist_responses::shipment_id.eq(shipment_id))
            .count()
            .get_result(&mut conn)
            .await
            .expect("should count responses");
        assert_eq!(remaining_units, 2, "unit deletes should be rolled back");
        assert_eq!(remaining_responses, 1, "response deletes should be rolled back");
        assert!(
            shipment::load_shipment_details(&mut conn, shipment_id)
                .await
                .expect("lookup should succeed")
                .is_some()
        );
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn it_counts_only_the_units_a_search_matches() {
        let mut conn = establish_connection().await;
        let shipment_id =
            shipment::insert_shipment(&mut conn, new_shipment("ZZ Test Co", "ZZ-J-8", 12))
                .await
                .expect("shipment should be created");
        for (model_type, serial) in
            [("Widget", "ZZ-S-MATCH"), ("Widget", "ZZ-S-13"), ("Gadget", "ZZ-S-14")]
        {
            unit::insert_unit(&mut conn, shipment_id, unit_fields(model_type, "ZZ-P", serial))
                .await
                .expect("unit should be added");
        }
        let page = shipment::list_shipments(
            &mut conn,
            &filter::ShipmentFilter {
                search: Some("zz-s-match".to_owned()),
                ..Default::default()
            },
            filter::Page::new(None, None),
        )
        .await
        .expect("listing should succeed");
        assert_eq!(page.shipments.len(), 1);
        let listed = &page.shipments[0];
        assert_eq!(listed.total_units, 1, "only the matching unit is counted");
        assert_eq!(
            listed.shipped_units_summary.iter().map(|m| m.count).sum::<i64>(),
            3,
            "the summary still covers the whole shipment"
        );
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn it_sums_the_model_summary_into_the_listed_total() {
        let mut conn = establish_connection().await;
        let shipment_id =
            shipment::insert_shipment(&mut conn, new_shipment("ZZ 100% Co", "ZZ-J-3", 7))
                .await
                .expect("shipment should be created");
        for (model_type, serial) in [("Widget", "ZZ-S-4"), ("Gadget", "ZZ-S-5"), ("Widget", "ZZ-S-6")]
        {
            unit::insert_unit(&mut conn, shipment_id, unit_fields(model_type, "ZZ-P", serial))
                .await
                .expect("unit should be added");
        }
        let page = shipment::list_shipments(
            &mut conn,
            &filter::ShipmentFilter {
                search: Some("ZZ 100%".to_owned()),
                ..Default::default()
            },
            filter::Page::new(None, None),
        )
        .await
        .expect("listing should succeed");
        assert_eq!(page.shipments.len(), 1, "the literal % should match only this shipment");
        let listed = &page.shipments[0];
        assert_eq!(listed.total_units, 3);
        assert_eq!(
            listed
                .shipped_units_summary
                .iter()
                .map(|m| (m.model_type.as_str(), m.count))
                .collect::<Vec<_>>(),
            vec![("Gadget", 1), ("Widget", 2)]
        );
    }
}

mod units {
    use super::*;

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn it_normalizes_passing_units_and_reports_missing_shipments() {
        let mut conn = establish_connection().await;
        let shipment_id =
            shipment::insert_shipment(&mut conn, new_shipment("ZZ Test Co", "ZZ-J-4", 8))
                .await
                .expect("shipment should be created");
        let unit_id =
            unit::insert_unit(&mut conn, shipment_id, unit_fields("Widget", "ZZ-W", "ZZ-S-7"))
                .await
                .expect("unit should be added");
        let stored = qc::shipped_units::table
            .find(unit_id)
            .select(models::ShippedUnit::as_select())
            .first(&mut conn)
            .await
            .expect("unit should be stored");
        assert_eq!(stored.original_serial_number, None);
        assert_eq!(stored.failed_equipment, None, "passing units carry no failure");
        assert!(!unit::is_serial_unique(&mut conn, "ZZ-S-7").await.expect("should check"));

        // Each rejected insert runs in its own savepoint so the next one still executes.
        let orphan_fields = unit_fields("Widget", "ZZ-W", "ZZ-S-8");
        let orphan = conn
            .transaction(|conn| unit::insert_unit(conn, -1, orphan_fields).scope_boxed())
            .await;
        assert!(matches!(
            orphan,
            Err(Error::MissingReference(Reference::Shipment))
        ));
        let duplicate_fields = unit_fields("Widget", "ZZ-W", "ZZ-S-7");
        let duplicate = conn
            .transaction(|conn| {
                unit::insert_unit(conn, shipment_id, duplicate_fields).scope_boxed()
            })
            .await;
        assert!(
            matches!(duplicate, Err(Error::Conflict(UniqueField::SerialNumber))),
            "should report the serial collision, got {duplicate:?}"
        );
    }
}

mod checklist_responses {
    use super::*;

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn it_keeps_one_response_per_shipment_and_item() {
        let mut conn = establish_connection().await;
        let shipment_id =
            shipment::insert_shipment(&mut conn, new_shipment("ZZ Test Co", "ZZ-J-5", 9))
                .await
                .expect("shipment should be created");
        let item_id = add_checklist_item(&mut conn, "ZZ packing slip").await;
        checklist::save_response(&mut conn, response(shipment_id, item_id, "Passed"))
            .await
            .expect("first response should be saved");
        checklist::save_response(&mut conn, response(shipment_id, item_id, "NA"))
            .await
            .expect("second response should overwrite the first");

        let stored = qc::shipment_checklist_responses::table
            .filter(qc::shipment_checklist_responses::shipment_id.eq(shipment_id))
            .select(qc::shipment_checklist_responses::status)
            .load::<String>(&mut conn)
            .await
            .expect("should load responses");
        assert_eq!(stored, vec!["NA".to_owned()]);

        let details = shipment::load_shipment_details(&mut conn, shipment_id)
            .await
            .expect("lookup should succeed")
            .expect("shipment should exist");
        let entry = details
            .checklist_items
            .iter()
            .find(|entry| entry.item_id == item_id)
            .expect("active item should be listed");
        assert_eq!(entry.status.as_deref(), Some("NA"));

        let unknown_item =
            checklist::save_response(&mut conn, response(shipment_id, -1, "Passed")).await;
        assert!(matches!(
            unknown_item,
            Err(Error::MissingReference(Reference::ChecklistItem))
        ));
    }
}

mod reports {
    use super::*;

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn stats_over_time_buckets_only_the_units_a_search_matches() {
        let mut conn = establish_connection().await;
        let shipment_id =
            shipment::insert_shipment(&mut conn, new_shipment("ZZ Test Co", "ZZ-J-9", 13))
                .await
                .expect("shipment should be created");
        let failing = |serial: &str| models::UnitFields {
            first_test_pass: false,
            retest_reason: Some("Leak".to_owned()),
            ..unit_fields("Widget", "ZZ-P", serial)
        };
        unit::insert_unit(&mut conn, shipment_id, unit_fields("Widget", "ZZ-P", "ZZ-S-ONLY"))
            .await
            .expect("passing unit should be added");
        for serial in ["ZZ-S-15", "ZZ-S-16"] {
            unit::insert_unit(&mut conn, shipment_id, failing(serial))
                .await
                .expect("failing unit should be added");
        }

        let searched = report::stats_over_time(
            &mut conn,
            &filter::ShipmentFilter {
                search: Some("ZZ-S-ONLY".to_owned()),
                ..Default::default()
            },
        )
        .await
        .expect("series should load");
        assert_eq!(searched.labels, vec!["2031-05".to_owned()]);
        assert_eq!(searched.total_units, vec![1]);
        assert_eq!(searched.fpy, vec![100.0]);

        let by_job = report::stats_over_time(
            &mut conn,
            &filter::ShipmentFilter {
                search: Some("ZZ-J-9".to_owned()),
                ..Default::default()
            },
        )
        .await
        .expect("series should load");
        assert_eq!(by_job.total_units, vec![3], "a job number match covers every unit");
        assert_eq!(by_job.fpy, vec![33.33]);
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL"]
    async fn manifest_shows_every_unit_when_only_the_customer_matches() {
        let mut conn = establish_connection().await;
        let shipment_id =
            shipment::insert_shipment(&mut conn, new_shipment("ZZACME Corp", "ZZ-J-6", 10))
                .await
                .expect("shipment should be created");
        for (model_type, serial) in [("Widget", "ZZ-S-9"), ("Gadget", "ZZ-S-10")] {
            unit::insert_unit(&mut conn, shipment_id, unit_fields(model_type, "ZZ-P", serial))
                .await
                .expect("unit should be added");
        }
        let manifest = report::manifest(
            &mut conn,
            &filter::ShipmentFilter {
                search: Some("zzacme".to_owned()),
                ..Default::default()
            },
        )
        .await
        .expect("manifest should load");
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest[0].total_units, 2);
        assert_eq!(manifest[0].units[0].model_type, "Gadget", "units are sorted by model type");
    }
}
