use diesel::prelude::*;

#[derive(Clone, Debug, Identifiable, Queryable, Selectable, serde::Serialize)]
#[diesel(table_name = crate::schema::qc::shipments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Shipment {
    pub id: i32,
    pub customer_name: String,
    pub job_number: String,
    #[serde(serialize_with = "crate::serde_jiff::date")]
    pub shipping_date: jiff_diesel::Date,
    pub qc_name: String,
    pub status: String,
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = crate::schema::qc::shipments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewShipment {
    pub customer_name: String,
    pub job_number: String,
    pub shipping_date: jiff_diesel::Date,
    pub qc_name: String,
}

#[derive(Clone, Debug, Identifiable, Queryable, Selectable, Associations, serde::Serialize)]
#[diesel(table_name = crate::schema::qc::shipped_units)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(primary_key(unit_id))]
#[diesel(belongs_to(Shipment))]
pub struct ShippedUnit {
    pub unit_id: i32,
    pub shipment_id: i32,
    pub model_type: String,
    pub part_number: String,
    pub serial_number: String,
    pub original_serial_number: Option<String>,
    pub first_test_pass: bool,
    pub failed_equipment: Option<String>,
    pub retest_reason: Option<String>,
}

/// The editable columns of a shipped unit, shared by insert and update.
#[derive(Clone, Debug, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::qc::shipped_units)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct UnitFields {
    pub model_type: String,
    pub part_number: String,
    pub serial_number: String,
    pub original_serial_number: Option<String>,
    pub first_test_pass: bool,
    pub failed_equipment: Option<String>,
    pub retest_reason: Option<String>,
}

impl UnitFields {
    /// Blank optional text becomes NULL, and the failure details are dropped for units
    /// that passed their first test.
    pub fn normalized(self) -> Self {
        fn non_blank(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }
        let Self {
            model_type,
            part_number,
            serial_number,
            original_serial_number,
            first_test_pass,
            failed_equipment,
            retest_reason,
        } = self;
        Self {
            model_type,
            part_number,
            serial_number,
            original_serial_number: non_blank(original_serial_number),
            first_test_pass,
            failed_equipment: non_blank(failed_equipment).filter(|_| !first_test_pass),
            retest_reason: non_blank(retest_reason).filter(|_| !first_test_pass),
        }
    }
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = crate::schema::qc::shipped_units)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewShippedUnit {
    pub shipment_id: i32,
    #[diesel(embed)]
    pub fields: UnitFields,
}

/// The slice of a unit the yield and failure statistics are computed from.
#[derive(Clone, Debug, Queryable, Selectable)]
#[diesel(table_name = crate::schema::qc::shipped_units)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UnitOutcome {
    pub part_number: String,
    pub model_type: String,
    pub first_test_pass: bool,
    pub failed_equipment: Option<String>,
    pub retest_reason: Option<String>,
}

#[derive(Clone, Debug, Identifiable, Queryable, Selectable, serde::Serialize)]
#[diesel(table_name = crate::schema::qc::model_numbers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(primary_key(model_id))]
pub struct ModelNumber {
    pub model_id: i32,
    pub model_type: String,
    pub description: Option<String>,
    pub part_number: String,
    pub is_active: bool,
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = crate::schema::qc::model_numbers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewModelNumber {
    pub model_type: String,
    pub description: Option<String>,
    pub part_number: String,
}

#[derive(Clone, Debug, AsChangeset)]
#[diesel(table_name = crate::schema::qc::model_numbers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct ModelNumberChanges {
    pub model_type: String,
    pub description: Option<String>,
    pub part_number: String,
    pub is_active: bool,
}

#[derive(Clone, Debug, Queryable, Selectable, serde::Serialize)]
#[diesel(table_name = crate::schema::qc::checklist_master_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChecklistItem {
    pub item_id: i32,
    pub item_text: String,
}

#[derive(Clone, Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::qc::shipment_checklist_responses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChecklistResponse {
    pub shipment_id: i32,
    pub item_id: i32,
    pub status: String,
    pub completed_by: String,
    pub completion_date: jiff_diesel::Date,
    pub comments: Option<String>,
}

#[derive(Clone, Debug, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::qc::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: jiff_diesel::Timestamp,
}

/// A user as listed to administrators; the password hash never leaves the store.
#[derive(Clone, Debug, Queryable, Selectable, serde::Serialize)]
#[diesel(table_name = crate::schema::qc::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub role: String,
    pub is_active: bool,
    #[serde(serialize_with = "crate::serde_jiff::timestamp")]
    pub created_at: jiff_diesel::Timestamp,
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = crate::schema::qc::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: String,
}
