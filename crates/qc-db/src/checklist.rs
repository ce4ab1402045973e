use crate::{
    models::{ChecklistItem, ChecklistResponse},
    schema::qc::{checklist_master_items, shipment_checklist_responses},
    Error, Store,
};
use diesel::{prelude::*, upsert::excluded};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use std::collections::HashMap;

/// A master checklist item together with one shipment's answer to it, if any.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ChecklistEntry {
    pub item_id: i32,
    pub item_text: String,
    pub status: Option<String>,
    pub completed_by: Option<String>,
    pub completion_date: Option<jiff::civil::Date>,
    pub comments: Option<String>,
}

fn merge_responses(
    items: Vec<ChecklistItem>,
    responses: Vec<ChecklistResponse>,
) -> Vec<ChecklistEntry> {
    let mut by_item: HashMap<i32, ChecklistResponse> =
        responses.into_iter().map(|r| (r.item_id, r)).collect();
    items
        .into_iter()
        .map(|item| {
            let response = by_item.remove(&item.item_id);
            ChecklistEntry {
                item_id: item.item_id,
                item_text: item.item_text,
                status: response.as_ref().map(|r| r.status.clone()),
                completed_by: response.as_ref().map(|r| r.completed_by.clone()),
                completion_date: response.as_ref().map(|r| r.completion_date.to_jiff()),
                comments: response.and_then(|r| r.comments),
            }
        })
        .collect()
}

pub(crate) async fn active_items(
    conn: &mut AsyncPgConnection,
) -> Result<Vec<ChecklistItem>, Error> {
    checklist_master_items::table
        .filter(checklist_master_items::is_active.eq(true))
        .order((
            checklist_master_items::item_order,
            checklist_master_items::item_id,
        ))
        .select(ChecklistItem::as_select())
        .load(conn)
        .await
        .map_err(Into::into)
}

pub(crate) async fn checklist_for_shipment(
    conn: &mut AsyncPgConnection,
    shipment_id: i32,
) -> Result<Vec<ChecklistEntry>, Error> {
    let items = active_items(conn).await?;
    let responses = shipment_checklist_responses::table
        .filter(shipment_checklist_responses::shipment_id.eq(shipment_id))
        .select(ChecklistResponse::as_select())
        .load(conn)
        .await?;
    Ok(merge_responses(items, responses))
}

/// Records a shipment's answer to a checklist item, replacing any earlier answer.
pub(crate) async fn save_response(
    conn: &mut AsyncPgConnection,
    response: ChecklistResponse,
) -> Result<(), Error> {
    use shipment_checklist_responses as responses;

    diesel::insert_into(responses::table)
        .values(response)
        .on_conflict((responses::shipment_id, responses::item_id))
        .do_update()
        .set((
            responses::status.eq(excluded(responses::status)),
            responses::completed_by.eq(excluded(responses::completed_by)),
            responses::completion_date.eq(excluded(responses::completion_date)),
            responses::comments.eq(excluded(responses::comments)),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

impl Store {
    #[tracing::instrument(skip(self))]
    pub async fn active_checklist_items(&self) -> Result<Vec<ChecklistItem>, Error> {
        let mut conn = self.connection().await?;
        active_items(&mut conn).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn save_checklist_response(&self, response: ChecklistResponse) -> Result<(), Error> {
        let mut conn = self.connection().await?;
        save_response(&mut conn, response).await
    }
}
