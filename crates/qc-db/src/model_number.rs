use crate::{
    models::{ModelNumber, ModelNumberChanges, NewModelNumber},
    schema::qc::model_numbers,
    Error, Store,
};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use itertools::Itertools;

/// Every model number, plus the distinct model types still in active use.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ModelCatalog {
    pub all_models: Vec<ModelNumber>,
    pub model_types: Vec<String>,
}

impl ModelCatalog {
    fn new(all_models: Vec<ModelNumber>) -> Self {
        let model_types = all_models
            .iter()
            .filter(|m| m.is_active)
            .map(|m| m.model_type.clone())
            .sorted()
            .dedup()
            .collect();
        Self {
            all_models,
            model_types,
        }
    }
}

pub(crate) async fn load_catalog(conn: &mut AsyncPgConnection) -> Result<ModelCatalog, Error> {
    let all_models = model_numbers::table
        .order((model_numbers::model_type, model_numbers::part_number))
        .select(ModelNumber::as_select())
        .load(conn)
        .await?;
    Ok(ModelCatalog::new(all_models))
}

pub(crate) async fn insert_model(
    conn: &mut AsyncPgConnection,
    new_model: NewModelNumber,
) -> Result<i32, Error> {
    diesel::insert_into(model_numbers::table)
        .values(new_model)
        .returning(model_numbers::model_id)
        .get_result(conn)
        .await
        .map_err(Into::into)
}

pub(crate) async fn update_model(
    conn: &mut AsyncPgConnection,
    model_id: i32,
    changes: ModelNumberChanges,
) -> Result<(), Error> {
    match diesel::update(model_numbers::table.find(model_id))
        .set(changes)
        .execute(conn)
        .await?
    {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

pub(crate) async fn is_part_number_unique(
    conn: &mut AsyncPgConnection,
    part_number: &str,
) -> Result<bool, Error> {
    let taken: bool = diesel::select(diesel::dsl::exists(
        model_numbers::table.filter(model_numbers::part_number.eq(part_number)),
    ))
    .get_result(conn)
    .await?;
    Ok(!taken)
}

impl Store {
    #[tracing::instrument(skip(self))]
    pub async fn list_models(&self) -> Result<ModelCatalog, Error> {
        let mut conn = self.connection().await?;
        load_catalog(&mut conn).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_model(&self, new_model: NewModelNumber) -> Result<i32, Error> {
        let mut conn = self.connection().await?;
        insert_model(&mut conn, new_model).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_model(
        &self,
        model_id: i32,
        changes: ModelNumberChanges,
    ) -> Result<(), Error> {
        let mut conn = self.connection().await?;
        update_model(&mut conn, model_id, changes).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn is_part_number_unique(&self, part_number: &str) -> Result<bool, Error> {
        let mut conn = self.connection().await?;
        is_part_number_unique(&mut conn, part_number).await
    }
}
